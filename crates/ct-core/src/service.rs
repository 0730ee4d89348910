//! Query façade used by the presentation layer.
//!
//! Each query fans out independent fetches to a [`RecordStore`], waits for
//! all of them, validates the rows, and hands immutable snapshots to the pure
//! functions in [`crate::estimator`], [`crate::stats`] and [`crate::calendar`].
//!
//! Failures never abort a query. A failed fetch leaves that category empty
//! and an invalid row is dropped; both are returned as [`Warning`]s next to
//! the (possibly degraded) result.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::calendar::{MarkedDateSet, build_day_data, build_marked_dates};
use crate::estimator::{CycleState, Phase, estimate_cycle_state};
use crate::records::{
    CycleRecord, DayData, MedicationRecord, MoodRecord, Profile, RecordError, SymptomRecord,
};
use crate::stats::{
    DEFAULT_TOP_N, TrendPoint, compute_average_cycle_length, compute_average_period_length,
    compute_cycle_length_trend, compute_frequency_table,
};
use crate::store::{FetchError, ProfileRow, RecordStore, validate_rows};
use crate::types::UserId;

/// Lookback windows for range-limited fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// How far back the calendar loads symptoms, moods and medications.
    /// Default: 90 days.
    pub calendar_lookback_days: u32,

    /// How far back statistics look for cycles, symptoms and moods.
    /// Default: 180 days.
    pub stats_lookback_days: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            calendar_lookback_days: 90,
            stats_lookback_days: 180,
        }
    }
}

/// A non-fatal problem encountered while answering a query.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Warning {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    InvalidRecord(#[from] RecordError),
}

/// A query result plus whatever went wrong while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Report<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Report<T> {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Data behind the home screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSummary {
    pub phase: Option<Phase>,
    pub cycle_day: Option<i64>,
    pub next_period_date: Option<NaiveDate>,
    pub days_until_next_period: Option<i64>,
    pub progress_fraction: f64,
    pub cycle_average_length: u32,
    pub period_average_length: u32,
}

impl HomeSummary {
    fn new(state: &CycleState, profile: &Profile) -> Self {
        let estimate = state.estimate();
        Self {
            phase: estimate.map(|e| e.phase),
            cycle_day: estimate.map(|e| e.cycle_day),
            next_period_date: estimate.map(|e| e.next_period_date),
            days_until_next_period: estimate.map(|e| e.days_until_next_period),
            progress_fraction: estimate.map_or(0.0, |e| e.progress_fraction),
            cycle_average_length: profile.cycle_average_length,
            period_average_length: profile.period_average_length,
        }
    }
}

/// One row of a "most frequent" chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyEntry {
    pub label: &'static str,
    pub count: usize,
}

/// Data behind the statistics screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub average_cycle_length: Option<u32>,
    pub average_period_length: Option<u32>,
    pub cycle_length_trend: Vec<TrendPoint>,
    pub top_symptoms: Vec<FrequencyEntry>,
    pub top_moods: Vec<FrequencyEntry>,
    pub cycles_logged: usize,
    pub symptoms_logged: usize,
    pub moods_logged: usize,
}

/// Accumulates warnings while rows are turned into records.
#[derive(Debug, Default)]
struct Collector {
    warnings: Vec<Warning>,
}

impl Collector {
    fn rows<R>(&mut self, result: Result<Vec<R>, FetchError>) -> Vec<R> {
        result.unwrap_or_else(|err| {
            tracing::warn!(category = %err.category, error = %err.message, "fetch failed, continuing without it");
            self.warnings.push(err.into());
            Vec::new()
        })
    }

    fn records<R, T>(&mut self, result: Result<Vec<R>, FetchError>) -> Vec<T>
    where
        T: TryFrom<R, Error = RecordError>,
    {
        let (records, rejected) = validate_rows(self.rows(result));
        self.warnings.extend(rejected.into_iter().map(Warning::from));
        records
    }

    /// Validates cycles and restores most-recent-first order.
    fn cycles<R>(&mut self, result: Result<Vec<R>, FetchError>) -> Vec<CycleRecord>
    where
        CycleRecord: TryFrom<R, Error = RecordError>,
    {
        let mut cycles: Vec<CycleRecord> = self.records(result);
        cycles.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        cycles
    }

    fn profile(
        &mut self,
        user_id: &UserId,
        result: Result<Option<ProfileRow>, FetchError>,
    ) -> Profile {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!(error = %err, "profile fetch failed, using defaults");
                self.warnings.push(err.into());
                None
            }
        };
        match row.map(Profile::try_from) {
            Some(Ok(profile)) => profile,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "invalid profile, using defaults");
                self.warnings.push(err.into());
                Profile::with_defaults(user_id.clone())
            }
            None => Profile::with_defaults(user_id.clone()),
        }
    }

    fn finish<T>(self, value: T) -> Report<T> {
        Report {
            value,
            warnings: self.warnings,
        }
    }
}

/// Answers the four presentation queries against a record store.
pub struct Tracker<'a, S> {
    store: &'a S,
    config: ServiceConfig,
}

impl<'a, S> Tracker<'a, S>
where
    S: RecordStore + Sync,
{
    pub const fn new(store: &'a S, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    /// Current phase, cycle day and next-period prediction.
    pub fn home_summary(&self, user_id: &UserId, today: NaiveDate) -> Report<HomeSummary> {
        let (cycles, profile) = rayon::join(
            || self.store.fetch_cycles_for_user(user_id),
            || self.store.fetch_profile(user_id),
        );

        let mut collector = Collector::default();
        let cycles = collector.cycles(cycles);
        let profile = collector.profile(user_id, profile);
        tracing::debug!(cycles = cycles.len(), "loaded home data");

        let state = estimate_cycle_state(
            cycles.first(),
            profile.cycle_average_length,
            profile.period_average_length,
            today,
        );
        collector.finish(HomeSummary::new(&state, &profile))
    }

    /// Calendar markers for the lookback window, with `selected_date` highlighted.
    pub fn marked_dates(
        &self,
        user_id: &UserId,
        selected_date: NaiveDate,
        today: NaiveDate,
    ) -> Report<MarkedDateSet> {
        let since = lookback(today, self.config.calendar_lookback_days);
        let mut collector = Collector::default();
        let snapshot = self.calendar_snapshot(&mut collector, user_id, since);
        let marks = build_marked_dates(
            &snapshot.cycles,
            &snapshot.symptoms,
            &snapshot.moods,
            &snapshot.medications,
            selected_date,
        );
        collector.finish(marks)
    }

    /// Everything recorded on `date`.
    pub fn day_data(&self, user_id: &UserId, date: NaiveDate) -> Report<DayData> {
        let mut collector = Collector::default();
        let snapshot = self.calendar_snapshot(&mut collector, user_id, date);
        let day = build_day_data(
            date,
            &snapshot.cycles,
            &snapshot.symptoms,
            &snapshot.moods,
            &snapshot.medications,
        );
        collector.finish(day)
    }

    /// Averages, trend and most frequent symptoms and moods.
    pub fn stats_summary(&self, user_id: &UserId, today: NaiveDate) -> Report<StatsSummary> {
        let since = lookback(today, self.config.stats_lookback_days);
        let (cycles, (symptoms, moods)) = rayon::join(
            || self.store.fetch_cycles_since(user_id, since),
            || {
                rayon::join(
                    || self.store.fetch_symptoms_for_user(user_id, since),
                    || self.store.fetch_moods_for_user(user_id, since),
                )
            },
        );

        let mut collector = Collector::default();
        let cycles = collector.cycles(cycles);
        let symptoms: Vec<SymptomRecord> = collector.records(symptoms);
        let moods: Vec<MoodRecord> = collector.records(moods);

        let top_symptoms = compute_frequency_table(&symptoms, |s| s.kind, DEFAULT_TOP_N)
            .into_iter()
            .map(|(kind, count)| FrequencyEntry {
                label: kind.label(),
                count,
            })
            .collect();
        let top_moods = compute_frequency_table(&moods, |m| m.kind, DEFAULT_TOP_N)
            .into_iter()
            .map(|(kind, count)| FrequencyEntry {
                label: kind.label(),
                count,
            })
            .collect();

        collector.finish(StatsSummary {
            average_cycle_length: compute_average_cycle_length(&cycles),
            average_period_length: compute_average_period_length(&cycles),
            cycle_length_trend: compute_cycle_length_trend(&cycles),
            top_symptoms,
            top_moods,
            cycles_logged: cycles.len(),
            symptoms_logged: symptoms.len(),
            moods_logged: moods.len(),
        })
    }

    /// Fetches all four calendar categories concurrently.
    fn calendar_snapshot(
        &self,
        collector: &mut Collector,
        user_id: &UserId,
        since: NaiveDate,
    ) -> CalendarSnapshot {
        let ((cycles, symptoms), (moods, medications)) = rayon::join(
            || {
                rayon::join(
                    || self.store.fetch_cycles_for_user(user_id),
                    || self.store.fetch_symptoms_for_user(user_id, since),
                )
            },
            || {
                rayon::join(
                    || self.store.fetch_moods_for_user(user_id, since),
                    || self.store.fetch_medications_for_user(user_id, since),
                )
            },
        );

        let snapshot = CalendarSnapshot {
            cycles: collector.cycles(cycles),
            symptoms: collector.records(symptoms),
            moods: collector.records(moods),
            medications: collector.records(medications),
        };
        tracing::debug!(
            cycles = snapshot.cycles.len(),
            symptoms = snapshot.symptoms.len(),
            moods = snapshot.moods.len(),
            medications = snapshot.medications.len(),
            %since,
            "loaded calendar data"
        );
        snapshot
    }
}

struct CalendarSnapshot {
    cycles: Vec<CycleRecord>,
    symptoms: Vec<SymptomRecord>,
    moods: Vec<MoodRecord>,
    medications: Vec<MedicationRecord>,
}

fn lookback(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}
