//! Calendar aggregation.
//!
//! Turns snapshots of cycle, symptom, mood and medication records into
//! per-date markers for the month view and a detail bundle for a single day.
//! Both operations are pure: every call rebuilds its result from the lists it
//! is given.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::records::{
    CycleRecord, DEFAULT_PERIOD_LENGTH, DayData, MedicationRecord, MoodRecord, SymptomRecord,
};

pub const PERIOD_COLOR: &str = "#FF6B81";
pub const SYMPTOM_COLOR: &str = "#5AC8FA";
pub const MOOD_COLOR: &str = "#4CD964";
pub const MEDICATION_COLOR: &str = "#FFCC00";
/// Period color at 25% opacity.
pub const SELECTED_COLOR: &str = "#FF6B8140";

/// What a calendar dot stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DotKind {
    Period,
    Symptom,
    Mood,
    Medication,
}

impl DotKind {
    pub const fn color(self) -> &'static str {
        match self {
            Self::Period => PERIOD_COLOR,
            Self::Symptom => SYMPTOM_COLOR,
            Self::Mood => MOOD_COLOR,
            Self::Medication => MEDICATION_COLOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dot {
    pub key: DotKind,
    pub color: &'static str,
}

impl From<DotKind> for Dot {
    fn from(key: DotKind) -> Self {
        Self {
            key,
            color: key.color(),
        }
    }
}

/// Flags and dots for one calendar date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateMarker {
    pub periods: bool,
    pub symptoms: bool,
    pub moods: bool,
    pub medications: bool,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<&'static str>,
    pub dots: Vec<Dot>,
}

impl DateMarker {
    fn mark(&mut self, kind: DotKind) {
        match kind {
            DotKind::Period => self.periods = true,
            DotKind::Symptom => self.symptoms = true,
            DotKind::Mood => self.moods = true,
            DotKind::Medication => self.medications = true,
        }
        self.dots.push(Dot::from(kind));
    }
}

/// Markers keyed by date, iterated in calendar order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MarkedDateSet(BTreeMap<NaiveDate, DateMarker>);

impl MarkedDateSet {
    pub fn get(&self, date: NaiveDate) -> Option<&DateMarker> {
        self.0.get(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DateMarker)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn mark(&mut self, date: NaiveDate, kind: DotKind) {
        self.0.entry(date).or_default().mark(kind);
    }

    fn select(&mut self, date: NaiveDate) {
        let marker = self.0.entry(date).or_default();
        marker.selected = true;
        marker.selected_color = Some(SELECTED_COLOR);
    }
}

/// Days of bleeding covered by a cycle, inclusive.
///
/// Uses the logged end date when there is one, otherwise
/// `period_length` days from the start. A missing or zero length falls back
/// to the default of 5. An end date before the start date yields an empty
/// range, and a length running past the last representable date covers the
/// start date only.
pub fn period_range(cycle: &CycleRecord) -> RangeInclusive<NaiveDate> {
    let end = cycle.end_date.unwrap_or_else(|| {
        let length = cycle
            .period_length
            .filter(|length| *length > 0)
            .unwrap_or(DEFAULT_PERIOD_LENGTH);
        cycle
            .start_date
            .checked_add_days(Days::new(u64::from(length - 1)))
            .unwrap_or(cycle.start_date)
    });
    cycle.start_date..=end
}

/// Builds calendar markers for every date that has something recorded.
///
/// Period days come from each cycle's [`period_range`]; overlapping ranges
/// add one dot per cycle. Symptom, mood and medication records each add a
/// dot on their own date. The selected date is overlaid last and keeps
/// whatever was already marked there.
pub fn build_marked_dates(
    cycles: &[CycleRecord],
    symptoms: &[SymptomRecord],
    moods: &[MoodRecord],
    medications: &[MedicationRecord],
    selected_date: NaiveDate,
) -> MarkedDateSet {
    let mut marks = MarkedDateSet::default();

    for cycle in cycles {
        let range = period_range(cycle);
        let end = *range.end();
        for date in range.start().iter_days().take_while(|date| *date <= end) {
            marks.mark(date, DotKind::Period);
        }
    }
    for symptom in symptoms {
        marks.mark(symptom.date, DotKind::Symptom);
    }
    for mood in moods {
        marks.mark(mood.date, DotKind::Mood);
    }
    for medication in medications {
        marks.mark(medication.date, DotKind::Medication);
    }

    marks.select(selected_date);
    marks
}

/// Collects everything recorded for `date`.
///
/// When cycle ranges overlap, the first matching cycle in input order wins.
/// Fertility and ovulation flags are never set.
pub fn build_day_data(
    date: NaiveDate,
    cycles: &[CycleRecord],
    symptoms: &[SymptomRecord],
    moods: &[MoodRecord],
    medications: &[MedicationRecord],
) -> DayData {
    let cycle = cycles
        .iter()
        .find(|cycle| period_range(cycle).contains(&date))
        .cloned();

    DayData {
        date,
        is_period: cycle.is_some(),
        cycle,
        symptoms: symptoms.iter().filter(|s| s.date == date).cloned().collect(),
        moods: moods.iter().filter(|m| m.date == date).cloned().collect(),
        medications: medications
            .iter()
            .filter(|m| m.date == date)
            .cloned()
            .collect(),
        is_fertile: false,
        is_ovulation: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::{MoodIntensity, MoodType, SymptomIntensity, SymptomType, UserId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn cycle(id: i64, start: NaiveDate, period_length: Option<u32>) -> CycleRecord {
        CycleRecord {
            id,
            user_id: user(),
            start_date: start,
            end_date: None,
            period_length,
            notes: None,
        }
    }

    fn symptom(id: i64, on: NaiveDate, kind: SymptomType) -> SymptomRecord {
        SymptomRecord {
            id,
            user_id: user(),
            date: on,
            kind,
            intensity: SymptomIntensity::Medium,
            notes: None,
        }
    }

    fn mood(id: i64, on: NaiveDate) -> MoodRecord {
        MoodRecord {
            id,
            user_id: user(),
            date: on,
            kind: MoodType::Calm,
            intensity: MoodIntensity::Slight,
            notes: None,
        }
    }

    fn medication(id: i64, on: NaiveDate) -> MedicationRecord {
        MedicationRecord {
            id,
            user_id: user(),
            name: "Ibuprofen".to_string(),
            dosage: "200mg".to_string(),
            date: on,
            time: "08:00".to_string(),
            taken: true,
            recurring: false,
            recurring_days: None,
            notes: None,
        }
    }

    #[test]
    fn period_range_uses_length_or_default() {
        let range = period_range(&cycle(1, date(2024, 1, 1), Some(3)));
        assert_eq!(range, date(2024, 1, 1)..=date(2024, 1, 3));

        let range = period_range(&cycle(1, date(2024, 1, 1), None));
        assert_eq!(range, date(2024, 1, 1)..=date(2024, 1, 5));
    }

    #[test]
    fn zero_period_length_falls_back_to_default() {
        let range = period_range(&cycle(1, date(2024, 1, 1), Some(0)));
        assert_eq!(range, date(2024, 1, 1)..=date(2024, 1, 5));
    }

    #[test]
    fn period_range_past_last_date_covers_start_only() {
        let c = cycle(1, date(2024, 1, 1), Some(u32::MAX));
        assert_eq!(period_range(&c), date(2024, 1, 1)..=date(2024, 1, 1));

        let last_day = NaiveDate::MAX;
        let c = cycle(1, last_day, Some(5));
        assert_eq!(period_range(&c), last_day..=last_day);

        let day = build_day_data(last_day, &[c], &[], &[], &[]);
        assert!(day.is_period);
    }

    #[test]
    fn period_range_prefers_end_date() {
        let mut c = cycle(1, date(2024, 1, 1), Some(3));
        c.end_date = Some(date(2024, 1, 6));
        assert_eq!(period_range(&c), date(2024, 1, 1)..=date(2024, 1, 6));

        c.end_date = Some(date(2023, 12, 30));
        assert!(period_range(&c).is_empty());
    }

    #[test]
    fn marks_period_symptom_and_selection_together() {
        let cycles = [cycle(1, date(2024, 1, 1), Some(5))];
        let symptoms = [symptom(1, date(2024, 1, 3), SymptomType::Cramps)];

        let marks = build_marked_dates(&cycles, &symptoms, &[], &[], date(2024, 1, 3));

        let marker = marks.get(date(2024, 1, 3)).unwrap();
        assert!(marker.periods);
        assert!(marker.symptoms);
        assert!(marker.selected);
        assert_eq!(marker.selected_color, Some(SELECTED_COLOR));
        assert!(marker.dots.len() >= 2);

        for day in 1..=5 {
            assert!(marks.get(date(2024, 1, day)).unwrap().periods, "day {day}");
        }
        assert!(marks.get(date(2024, 1, 6)).is_none());
    }

    #[test]
    fn overlapping_cycles_accumulate_dots() {
        let cycles = [
            cycle(2, date(2024, 1, 3), Some(3)),
            cycle(1, date(2024, 1, 1), Some(5)),
        ];
        let marks = build_marked_dates(&cycles, &[], &[], &[], date(2024, 2, 1));

        let marker = marks.get(date(2024, 1, 4)).unwrap();
        assert!(marker.periods);
        assert_eq!(
            marker.dots,
            vec![Dot::from(DotKind::Period), Dot::from(DotKind::Period)]
        );
        assert_eq!(marks.get(date(2024, 1, 1)).unwrap().dots.len(), 1);
    }

    #[test]
    fn every_category_sets_its_flag_and_color() {
        let d = date(2024, 3, 10);
        let marks = build_marked_dates(
            &[],
            &[symptom(1, d, SymptomType::Acne), symptom(2, d, SymptomType::Nausea)],
            &[mood(1, d)],
            &[medication(1, d)],
            date(2024, 3, 1),
        );

        let marker = marks.get(d).unwrap();
        assert!(!marker.periods);
        assert!(marker.symptoms && marker.moods && marker.medications);
        assert!(!marker.selected);
        let colors: Vec<_> = marker.dots.iter().map(|dot| dot.color).collect();
        assert_eq!(
            colors,
            vec![SYMPTOM_COLOR, SYMPTOM_COLOR, MOOD_COLOR, MEDICATION_COLOR]
        );
    }

    #[test]
    fn selected_date_without_records_gets_bare_marker() {
        let marks = build_marked_dates(&[], &[], &[], &[], date(2024, 5, 5));
        assert_eq!(marks.len(), 1);
        let marker = marks.get(date(2024, 5, 5)).unwrap();
        assert!(marker.selected);
        assert!(marker.dots.is_empty());
    }

    #[test]
    fn marked_dates_are_idempotent() {
        let cycles = [cycle(1, date(2024, 1, 1), None)];
        let symptoms = [symptom(1, date(2024, 1, 2), SymptomType::Headache)];
        let moods = [mood(1, date(2024, 1, 9))];
        let medications = [medication(1, date(2024, 1, 2))];

        let first = build_marked_dates(&cycles, &symptoms, &moods, &medications, date(2024, 1, 2));
        let second = build_marked_dates(&cycles, &symptoms, &moods, &medications, date(2024, 1, 2));
        assert_eq!(first, second);
    }

    #[test]
    fn marked_dates_ignore_input_order() {
        let cycles = vec![
            cycle(1, date(2024, 1, 1), Some(5)),
            cycle(2, date(2024, 1, 4), Some(3)),
            cycle(3, date(2024, 1, 29), None),
        ];
        let symptoms = vec![
            symptom(1, date(2024, 1, 2), SymptomType::Headache),
            symptom(2, date(2024, 1, 2), SymptomType::Cramps),
            symptom(3, date(2024, 1, 30), SymptomType::Bloating),
        ];
        let moods = vec![mood(1, date(2024, 1, 2)), mood(2, date(2024, 1, 15))];
        let medications = vec![medication(1, date(2024, 1, 4)), medication(2, date(2024, 1, 2))];

        let forward = build_marked_dates(&cycles, &symptoms, &moods, &medications, date(2024, 1, 2));

        let mut reversed = (cycles, symptoms, moods, medications);
        reversed.0.reverse();
        reversed.1.reverse();
        reversed.2.reverse();
        reversed.3.reverse();
        let backward = build_marked_dates(
            &reversed.0,
            &reversed.1,
            &reversed.2,
            &reversed.3,
            date(2024, 1, 2),
        );

        assert_eq!(forward, backward);
        let marker = forward.get(date(2024, 1, 4)).unwrap();
        let keys: Vec<_> = marker.dots.iter().map(|dot| dot.key).collect();
        assert_eq!(keys, vec![DotKind::Period, DotKind::Period, DotKind::Medication]);
    }

    #[test]
    fn marked_dates_serialize_with_date_keys() {
        let cycles = [cycle(1, date(2024, 1, 1), Some(1))];
        let moods = [mood(1, date(2024, 1, 2))];
        let marks = build_marked_dates(&cycles, &[], &moods, &[], date(2024, 1, 1));
        let json = serde_json::to_string_pretty(&marks).unwrap();

        insta::assert_snapshot!(json, @r##"
        {
          "2024-01-01": {
            "periods": true,
            "symptoms": false,
            "moods": false,
            "medications": false,
            "selected": true,
            "selected_color": "#FF6B8140",
            "dots": [
              {
                "key": "period",
                "color": "#FF6B81"
              }
            ]
          },
          "2024-01-02": {
            "periods": false,
            "symptoms": false,
            "moods": true,
            "medications": false,
            "selected": false,
            "dots": [
              {
                "key": "mood",
                "color": "#4CD964"
              }
            ]
          }
        }
        "##);
    }

    #[test]
    fn day_without_records_is_empty() {
        let cycles = [cycle(1, date(2024, 1, 1), Some(5))];
        let symptoms = [symptom(1, date(2024, 1, 3), SymptomType::Cramps)];

        let day = build_day_data(date(2024, 2, 1), &cycles, &symptoms, &[], &[]);

        assert!(!day.is_period);
        assert!(day.cycle.is_none());
        assert!(day.symptoms.is_empty());
        assert!(day.moods.is_empty());
        assert!(day.medications.is_empty());
        assert!(!day.is_fertile);
        assert!(!day.is_ovulation);
    }

    #[test]
    fn day_collects_matching_records() {
        let d = date(2024, 1, 3);
        let cycles = [cycle(1, date(2024, 1, 1), Some(5))];
        let symptoms = [
            symptom(1, d, SymptomType::Cramps),
            symptom(2, date(2024, 1, 4), SymptomType::Fatigue),
        ];
        let moods = [mood(1, d)];
        let medications = [medication(1, date(2024, 1, 2))];

        let day = build_day_data(d, &cycles, &symptoms, &moods, &medications);

        assert!(day.is_period);
        assert_eq!(day.cycle.as_ref().map(|c| c.id), Some(1));
        assert_eq!(day.symptoms.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(day.moods.len(), 1);
        assert!(day.medications.is_empty());
        assert!(!day.is_fertile);
    }

    #[test]
    fn overlapping_cycles_pick_first_in_input_order() {
        let cycles = [
            cycle(2, date(2024, 1, 3), Some(3)),
            cycle(1, date(2024, 1, 1), Some(5)),
        ];
        let day = build_day_data(date(2024, 1, 4), &cycles, &[], &[], &[]);
        assert_eq!(day.cycle.map(|c| c.id), Some(2));
    }
}
