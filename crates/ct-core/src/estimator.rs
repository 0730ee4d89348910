//! Cycle phase estimation.
//!
//! Derives, from the most recent cycle and the user's configured averages,
//! where "today" falls in the cycle and when the next period is expected.
//!
//! # Phase policy
//!
//! | cycle day                            | phase      |
//! |--------------------------------------|------------|
//! | `1 ..= period_average_length`        | Menstrual  |
//! | `period_average_length + 1 ..= 7`    | Follicular |
//! | `8 ..= 14`                           | Ovulation  |
//! | `15 ..`                              | Luteal     |
//!
//! The day-7 and day-14 boundaries are fixed and do not scale with
//! `cycle_average_length`. A period length of 7 or more leaves the follicular
//! range empty.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::records::CycleRecord;

/// Last cycle day of the follicular phase.
pub const FOLLICULAR_LAST_DAY: i64 = 7;

/// Last cycle day of the ovulation phase.
pub const OVULATION_LAST_DAY: i64 = 14;

/// Coarse position within a menstrual cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl Phase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Menstrual => "Menstrual",
            Self::Follicular => "Follicular",
            Self::Ovulation => "Ovulation",
            Self::Luteal => "Luteal",
        }
    }

    /// Short self-care tip shown alongside the phase.
    pub const fn tip(self) -> &'static str {
        match self {
            Self::Menstrual => "A warm shower can help ease cramps during menstruation.",
            Self::Follicular => {
                "Energy tends to run high in the follicular phase. A good time to start something new!"
            }
            Self::Ovulation => "Around ovulation you may feel more energetic for social plans.",
            Self::Luteal => "Look after yourself in the luteal phase and make room for rest.",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Estimate for a user with at least one logged cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleEstimate {
    pub phase: Phase,
    /// 1-based day within the current cycle.
    pub cycle_day: i64,
    pub start_date: NaiveDate,
    pub next_period_date: NaiveDate,
    /// Negative when the next period is overdue.
    pub days_until_next_period: i64,
    /// `cycle_day / cycle_average_length`, clamped to \[0, 1\].
    pub progress_fraction: f64,
}

/// Result of [`estimate_cycle_state`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum CycleState {
    /// No cycle has been logged yet.
    Unknown,
    Known(CycleEstimate),
}

impl CycleState {
    pub const fn estimate(&self) -> Option<&CycleEstimate> {
        match self {
            Self::Unknown => None,
            Self::Known(estimate) => Some(estimate),
        }
    }
}

/// Classifies a cycle day using the fixed phase policy.
pub fn classify_phase(cycle_day: i64, period_average_length: u32) -> Phase {
    if cycle_day <= i64::from(period_average_length) {
        Phase::Menstrual
    } else if cycle_day <= FOLLICULAR_LAST_DAY {
        Phase::Follicular
    } else if cycle_day <= OVULATION_LAST_DAY {
        Phase::Ovulation
    } else {
        Phase::Luteal
    }
}

/// Estimates the current cycle state.
///
/// Pure and infallible: a missing cycle gives [`CycleState::Unknown`] and a
/// start date in the future is treated as cycle day 1. A cycle length that
/// pushes the next period past the last representable date also gives
/// [`CycleState::Unknown`].
///
/// # Arguments
///
/// * `latest_cycle` - The most recent cycle by start date, if any
/// * `cycle_average_length` - Expected days between period starts
/// * `period_average_length` - Expected days of bleeding
/// * `today` - The date to estimate for
pub fn estimate_cycle_state(
    latest_cycle: Option<&CycleRecord>,
    cycle_average_length: u32,
    period_average_length: u32,
    today: NaiveDate,
) -> CycleState {
    let Some(cycle) = latest_cycle else {
        return CycleState::Unknown;
    };

    let mut cycle_day = (today - cycle.start_date).num_days() + 1;
    if cycle_day < 1 {
        tracing::warn!(
            cycle_id = cycle.id,
            start_date = %cycle.start_date,
            %today,
            "latest cycle starts in the future, treating today as cycle day 1"
        );
        cycle_day = 1;
    }

    let Some(next_period_date) = cycle
        .start_date
        .checked_add_days(Days::new(u64::from(cycle_average_length)))
    else {
        tracing::warn!(
            cycle_id = cycle.id,
            start_date = %cycle.start_date,
            cycle_average_length,
            "next period falls outside the supported calendar"
        );
        return CycleState::Unknown;
    };

    CycleState::Known(CycleEstimate {
        phase: classify_phase(cycle_day, period_average_length),
        cycle_day,
        start_date: cycle.start_date,
        next_period_date,
        days_until_next_period: (next_period_date - today).num_days(),
        progress_fraction: progress_fraction(cycle_day, cycle_average_length),
    })
}

#[allow(clippy::cast_precision_loss)]
fn progress_fraction(cycle_day: i64, cycle_average_length: u32) -> f64 {
    if cycle_average_length == 0 {
        return 0.0;
    }
    (cycle_day as f64 / f64::from(cycle_average_length)).clamp(0.0, 1.0)
}
