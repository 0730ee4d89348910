//! Validated domain records.
//!
//! These are the shapes the estimator and the calendar aggregator operate on.
//! Every date here has already been parsed; rows with malformed fields never
//! reach this module (see [`crate::store`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    MoodIntensity, MoodType, RecordId, SymptomIntensity, SymptomType, UserId, ValidationError,
    Weekday,
};

/// Cycle length assumed when the profile does not say otherwise.
pub const DEFAULT_CYCLE_LENGTH: u32 = 28;

/// Period length assumed when neither the profile nor the cycle says otherwise.
pub const DEFAULT_PERIOD_LENGTH: u32 = 5;

/// Longest cycle or period length, in days, accepted from storage or input.
pub const MAX_DAY_COUNT: u32 = 365;

/// A record that could not be admitted into the core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    /// A date field did not parse as `YYYY-MM-DD`.
    #[error("invalid {field} on record {record_id}: {value:?}")]
    InvalidDate {
        record_id: String,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A non-date field held a value outside its domain.
    #[error("invalid {field} on record {record_id}: {source}")]
    InvalidValue {
        record_id: String,
        field: &'static str,
        #[source]
        source: ValidationError,
    },
}

impl RecordError {
    /// ID of the record that was rejected.
    pub fn record_id(&self) -> &str {
        match self {
            Self::InvalidDate { record_id, .. } | Self::InvalidValue { record_id, .. } => record_id,
        }
    }
}

/// One menstrual cycle, anchored by the day the period started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: SymptomType,
    pub intensity: SymptomIntensity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: MoodType,
    pub intensity: MoodIntensity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A medication dose, optionally repeating on fixed weekdays.
///
/// `time` is an opaque display string (e.g. `08:30`); it carries no
/// time-of-day semantics anywhere in the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub name: String,
    pub dosage: String,
    pub date: NaiveDate,
    pub time: String,
    pub taken: bool,
    pub recurring: bool,
    /// Deduplicated and sorted Monday first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_days: Option<Vec<Weekday>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// User-level settings the estimator reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    pub cycle_average_length: u32,
    pub period_average_length: u32,
}

impl Profile {
    /// A profile with no personal details and the default averages.
    pub const fn with_defaults(user_id: UserId) -> Self {
        Self {
            user_id,
            username: None,
            full_name: None,
            birth_date: None,
            cycle_average_length: DEFAULT_CYCLE_LENGTH,
            period_average_length: DEFAULT_PERIOD_LENGTH,
        }
    }
}

/// Everything recorded for a single calendar day.
///
/// Built fresh per query by [`crate::calendar::build_day_data`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayData {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CycleRecord>,
    pub symptoms: Vec<SymptomRecord>,
    pub moods: Vec<MoodRecord>,
    pub medications: Vec<MedicationRecord>,
    pub is_period: bool,
    /// Always false: no fertility-window estimate exists.
    pub is_fertile: bool,
    /// Always false: no ovulation-day estimate exists.
    pub is_ovulation: bool,
}
