//! The record-store boundary.
//!
//! Rows are the wire shapes a store hands back: dates and enum values are
//! plain strings exactly as persisted. They are validated into
//! [`crate::records`] types here, before anything in the core sees them.
//! A row that fails validation is dropped and reported, never silently
//! skipped.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::records::{
    CycleRecord, DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH, MAX_DAY_COUNT, MedicationRecord,
    MoodRecord, Profile, RecordError, SymptomRecord,
};
use crate::types::{
    MoodIntensity, MoodType, RecordId, SymptomIntensity, SymptomType, UserId, ValidationError,
    Weekday,
};

/// Storage format for every date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which kind of record a fetch was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cycles,
    Symptoms,
    Moods,
    Medications,
    Profile,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cycles => "cycles",
            Self::Symptoms => "symptoms",
            Self::Moods => "moods",
            Self::Medications => "medications",
            Self::Profile => "profile",
        };
        f.write_str(s)
    }
}

/// Opaque failure from the record store.
///
/// The core recovers from these by treating the category as empty.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to fetch {category}: {message}")]
pub struct FetchError {
    pub category: Category,
    pub message: String,
}

impl FetchError {
    pub fn new(category: Category, err: impl fmt::Display) -> Self {
        Self {
            category,
            message: err.to_string(),
        }
    }
}

/// Read side of the record store.
///
/// Implemented by `ct_db::Database`; tests use in-memory fixtures.
/// Fetches are independent of one another and may run concurrently.
pub trait RecordStore {
    /// All cycles for a user, ordered by `start_date` descending.
    fn fetch_cycles_for_user(&self, user_id: &UserId) -> Result<Vec<CycleRow>, FetchError>;

    /// Cycles starting on or after `since`, ordered by `start_date` descending.
    fn fetch_cycles_since(
        &self,
        user_id: &UserId,
        since: NaiveDate,
    ) -> Result<Vec<CycleRow>, FetchError>;

    /// Symptoms dated on or after `since`.
    fn fetch_symptoms_for_user(
        &self,
        user_id: &UserId,
        since: NaiveDate,
    ) -> Result<Vec<SymptomRow>, FetchError>;

    /// Moods dated on or after `since`.
    fn fetch_moods_for_user(
        &self,
        user_id: &UserId,
        since: NaiveDate,
    ) -> Result<Vec<MoodRow>, FetchError>;

    /// Medications dated on or after `since`.
    fn fetch_medications_for_user(
        &self,
        user_id: &UserId,
        since: NaiveDate,
    ) -> Result<Vec<MedicationRow>, FetchError>;

    /// The user's profile, if one was ever saved.
    fn fetch_profile(&self, user_id: &UserId) -> Result<Option<ProfileRow>, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRow {
    pub id: RecordId,
    pub user_id: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub period_length: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRow {
    pub id: RecordId,
    pub user_id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub intensity: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodRow {
    pub id: RecordId,
    pub user_id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub intensity: String,
    pub notes: Option<String>,
}

/// A stored medication dose.
///
/// `recurring_days` is the raw JSON text of the column; it is decoded per
/// row during validation so one malformed value rejects only its own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedicationRow {
    pub id: RecordId,
    pub user_id: String,
    pub name: String,
    pub dosage: String,
    pub date: String,
    pub time: String,
    pub taken: bool,
    pub recurring: bool,
    #[serde(serialize_with = "serialize_json_text")]
    pub recurring_days: Option<String>,
    pub notes: Option<String>,
}

/// Writes a JSON text column as embedded JSON, or as plain text when it
/// does not parse.
#[allow(clippy::ref_option, reason = "serde serialize_with signature")]
fn serialize_json_text<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value.as_deref().map(serde_json::from_str::<serde_json::Value>) {
        Some(Ok(json)) => json.serialize(serializer),
        _ => value.serialize(serializer),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub user_id: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub birth_date: Option<String>,
    pub cycle_average_length: Option<i64>,
    pub period_average_length: Option<i64>,
}

/// Request to log the start of a period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCycle {
    pub user_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub period_length: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSymptom {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub kind: SymptomType,
    pub intensity: SymptomIntensity,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMood {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub kind: MoodType,
    pub intensity: MoodIntensity,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedication {
    pub user_id: UserId,
    pub name: String,
    pub dosage: String,
    pub date: NaiveDate,
    pub time: String,
    pub taken: bool,
    pub recurring_days: Vec<Weekday>,
    pub notes: Option<String>,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub cycle_average_length: Option<u32>,
    pub period_average_length: Option<u32>,
}

/// Formats a date the way every store column holds it.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, field: &'static str, record_id: &str) -> Result<NaiveDate, RecordError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| RecordError::InvalidDate {
        record_id: record_id.to_string(),
        field,
        value: value.to_string(),
        source,
    })
}

fn parse_optional_date(
    value: Option<&str>,
    field: &'static str,
    record_id: &str,
) -> Result<Option<NaiveDate>, RecordError> {
    value
        .map(|value| parse_date(value, field, record_id))
        .transpose()
}

fn parse_value<T>(value: &str, field: &'static str, record_id: &str) -> Result<T, RecordError>
where
    T: std::str::FromStr<Err = ValidationError>,
{
    value.parse().map_err(|source| RecordError::InvalidValue {
        record_id: record_id.to_string(),
        field,
        source,
    })
}

fn parse_user_id(value: String, record_id: &str) -> Result<UserId, RecordError> {
    UserId::new(value).map_err(|source| RecordError::InvalidValue {
        record_id: record_id.to_string(),
        field: "user_id",
        source,
    })
}

/// Converts a stored day count, treating `0` as "not recorded".
///
/// Negative counts and counts above [`MAX_DAY_COUNT`] are rejected.
fn parse_day_count(
    value: Option<i64>,
    field: &'static str,
    record_id: &str,
) -> Result<Option<u32>, RecordError> {
    match value {
        None | Some(0) => Ok(None),
        Some(days) => u32::try_from(days)
            .ok()
            .filter(|days| *days <= MAX_DAY_COUNT)
            .map(Some)
            .ok_or_else(|| RecordError::InvalidValue {
                record_id: record_id.to_string(),
                field,
                source: ValidationError::OutOfRange { field, value: days },
            }),
    }
}

impl TryFrom<CycleRow> for CycleRecord {
    type Error = RecordError;

    fn try_from(row: CycleRow) -> Result<Self, Self::Error> {
        let id = row.id.to_string();
        Ok(Self {
            id: row.id,
            start_date: parse_date(&row.start_date, "start_date", &id)?,
            end_date: parse_optional_date(row.end_date.as_deref(), "end_date", &id)?,
            period_length: parse_day_count(row.period_length, "period_length", &id)?,
            user_id: parse_user_id(row.user_id, &id)?,
            notes: row.notes,
        })
    }
}

impl TryFrom<SymptomRow> for SymptomRecord {
    type Error = RecordError;

    fn try_from(row: SymptomRow) -> Result<Self, Self::Error> {
        let id = row.id.to_string();
        Ok(Self {
            id: row.id,
            date: parse_date(&row.date, "date", &id)?,
            kind: parse_value(&row.kind, "type", &id)?,
            intensity: parse_value(&row.intensity, "intensity", &id)?,
            user_id: parse_user_id(row.user_id, &id)?,
            notes: row.notes,
        })
    }
}

impl TryFrom<MoodRow> for MoodRecord {
    type Error = RecordError;

    fn try_from(row: MoodRow) -> Result<Self, Self::Error> {
        let id = row.id.to_string();
        Ok(Self {
            id: row.id,
            date: parse_date(&row.date, "date", &id)?,
            kind: parse_value(&row.kind, "type", &id)?,
            intensity: parse_value(&row.intensity, "intensity", &id)?,
            user_id: parse_user_id(row.user_id, &id)?,
            notes: row.notes,
        })
    }
}

impl TryFrom<MedicationRow> for MedicationRecord {
    type Error = RecordError;

    fn try_from(row: MedicationRow) -> Result<Self, Self::Error> {
        let id = row.id.to_string();
        let recurring_days = match row.recurring_days.as_deref() {
            None => None,
            Some(text) => {
                let days: Vec<String> =
                    serde_json::from_str(text).map_err(|_| RecordError::InvalidValue {
                        record_id: id.clone(),
                        field: "recurring_days",
                        source: ValidationError::Malformed {
                            field: "recurring_days",
                            value: text.to_string(),
                        },
                    })?;
                let mut parsed = days
                    .iter()
                    .map(|day| parse_value::<Weekday>(day, "recurring_days", &id))
                    .collect::<Result<Vec<_>, _>>()?;
                parsed.sort_unstable();
                parsed.dedup();
                Some(parsed)
            }
        };
        Ok(Self {
            id: row.id,
            date: parse_date(&row.date, "date", &id)?,
            user_id: parse_user_id(row.user_id, &id)?,
            name: row.name,
            dosage: row.dosage,
            time: row.time,
            taken: row.taken,
            recurring: row.recurring,
            recurring_days,
            notes: row.notes,
        })
    }
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RecordError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let id = row.user_id.clone();
        Ok(Self {
            birth_date: parse_optional_date(row.birth_date.as_deref(), "birth_date", &id)?,
            cycle_average_length: parse_day_count(
                row.cycle_average_length,
                "cycle_average_length",
                &id,
            )?
            .unwrap_or(DEFAULT_CYCLE_LENGTH),
            period_average_length: parse_day_count(
                row.period_average_length,
                "period_average_length",
                &id,
            )?
            .unwrap_or(DEFAULT_PERIOD_LENGTH),
            user_id: parse_user_id(row.user_id, &id)?,
            username: row.username,
            full_name: row.full_name,
        })
    }
}

/// Validates a batch of rows, keeping the good ones in their original order.
///
/// Rejected rows are logged and returned so the caller can surface them.
pub fn validate_rows<R, T>(rows: Vec<R>) -> (Vec<T>, Vec<RecordError>)
where
    T: TryFrom<R, Error = RecordError>,
{
    let mut records = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for row in rows {
        match T::try_from(row) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::warn!(record_id = err.record_id(), error = %err, "dropping invalid record");
                rejected.push(err);
            }
        }
    }
    (records, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_row(id: RecordId, start_date: &str) -> CycleRow {
        CycleRow {
            id,
            user_id: "user-1".to_string(),
            start_date: start_date.to_string(),
            end_date: None,
            period_length: Some(5),
            notes: None,
        }
    }

    #[test]
    fn cycle_row_converts() {
        let record = CycleRecord::try_from(cycle_row(1, "2024-01-01")).unwrap();
        assert_eq!(
            record.start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(record.period_length, Some(5));
    }

    #[test]
    fn invalid_date_is_attributed_to_record() {
        let err = CycleRecord::try_from(cycle_row(7, "01/02/2024")).unwrap_err();
        assert!(matches!(
            err,
            RecordError::InvalidDate {
                ref record_id,
                field: "start_date",
                ..
            } if record_id == "7"
        ));
    }

    #[test]
    fn zero_period_length_means_not_recorded() {
        let mut row = cycle_row(1, "2024-01-01");
        row.period_length = Some(0);
        let record = CycleRecord::try_from(row).unwrap();
        assert_eq!(record.period_length, None);
    }

    #[test]
    fn negative_period_length_is_rejected() {
        let mut row = cycle_row(3, "2024-01-01");
        row.period_length = Some(-2);
        let err = CycleRecord::try_from(row).unwrap_err();
        assert_eq!(err.record_id(), "3");
        assert!(matches!(err, RecordError::InvalidValue { field: "period_length", .. }));
    }

    #[test]
    fn unknown_symptom_type_is_rejected() {
        let row = SymptomRow {
            id: 9,
            user_id: "user-1".to_string(),
            date: "2024-01-03".to_string(),
            kind: "migraine".to_string(),
            intensity: "light".to_string(),
            notes: None,
        };
        let err = SymptomRecord::try_from(row).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid type on record 9: unknown symptom type: migraine"
        );
    }

    #[test]
    fn medication_recurring_days_are_sorted_and_deduplicated() {
        let row = MedicationRow {
            id: 2,
            user_id: "user-1".to_string(),
            name: "Ibuprofen".to_string(),
            dosage: "200mg".to_string(),
            date: "2024-01-03".to_string(),
            time: "08:30".to_string(),
            taken: false,
            recurring: true,
            recurring_days: Some(r#"["friday","monday","friday"]"#.to_string()),
            notes: None,
        };
        let record = MedicationRecord::try_from(row).unwrap();
        assert_eq!(
            record.recurring_days,
            Some(vec![Weekday::Monday, Weekday::Friday])
        );
    }

    #[test]
    fn malformed_recurring_days_rejects_only_that_medication() {
        let medication = |id: RecordId, recurring_days: &str| MedicationRow {
            id,
            user_id: "user-1".to_string(),
            name: "Iron".to_string(),
            dosage: "1 tablet".to_string(),
            date: "2024-01-03".to_string(),
            time: "08:00".to_string(),
            taken: false,
            recurring: true,
            recurring_days: Some(recurring_days.to_string()),
            notes: None,
        };
        let rows = vec![
            medication(1, r#"["monday"]"#),
            medication(2, "[monday"),
            medication(3, r#"["sunday"]"#),
        ];

        let (records, rejected): (Vec<MedicationRecord>, _) = validate_rows(rows);
        assert_eq!(
            records.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(rejected.len(), 1);
        assert_eq!(
            rejected[0].to_string(),
            "invalid recurring_days on record 2: malformed recurring_days: [monday"
        );
    }

    #[test]
    fn medication_row_exports_recurring_days_as_json() {
        let mut row = MedicationRow {
            id: 1,
            user_id: "user-1".to_string(),
            name: "Iron".to_string(),
            dosage: "1 tablet".to_string(),
            date: "2024-01-03".to_string(),
            time: "08:00".to_string(),
            taken: false,
            recurring: true,
            recurring_days: Some(r#"["monday"]"#.to_string()),
            notes: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["recurring_days"], serde_json::json!(["monday"]));

        row.recurring_days = Some("[monday".to_string());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["recurring_days"], "[monday");
    }

    #[test]
    fn oversized_day_count_is_rejected() {
        let mut row = cycle_row(4, "2024-01-01");
        row.period_length = Some(4_000_000_000);
        let err = CycleRecord::try_from(row).unwrap_err();
        assert_eq!(err.record_id(), "4");
        assert!(matches!(err, RecordError::InvalidValue { field: "period_length", .. }));

        let profile = ProfileRow {
            user_id: "user-1".to_string(),
            username: None,
            full_name: None,
            birth_date: None,
            cycle_average_length: Some(i64::from(MAX_DAY_COUNT) + 1),
            period_average_length: None,
        };
        assert!(Profile::try_from(profile).is_err());
    }

    #[test]
    fn profile_row_falls_back_to_defaults() {
        let row = ProfileRow {
            user_id: "user-1".to_string(),
            username: None,
            full_name: None,
            birth_date: None,
            cycle_average_length: None,
            period_average_length: Some(0),
        };
        let profile = Profile::try_from(row).unwrap();
        assert_eq!(profile.cycle_average_length, DEFAULT_CYCLE_LENGTH);
        assert_eq!(profile.period_average_length, DEFAULT_PERIOD_LENGTH);
    }

    #[test]
    fn validate_rows_keeps_order_and_reports_rejects() {
        let rows = vec![
            cycle_row(3, "2024-03-01"),
            cycle_row(2, "not-a-date"),
            cycle_row(1, "2024-01-01"),
        ];
        let (records, rejected): (Vec<CycleRecord>, _) = validate_rows(rows);
        assert_eq!(
            records.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![3, 1]
        );
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].record_id(), "2");
    }

    #[test]
    fn fetch_error_display() {
        let err = FetchError::new(Category::Moods, "connection refused");
        assert_eq!(err.to_string(), "failed to fetch moods: connection refused");
    }
}
