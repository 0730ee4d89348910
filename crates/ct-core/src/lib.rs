//! Core domain logic for the cycle tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Estimation: current cycle day, phase and next-period prediction
//! - Statistics: average cycle/period length and frequency tables
//! - Calendar: per-date markers and single-day detail bundles
//! - Service: fan-out queries against a record store

pub mod calendar;
pub mod estimator;
pub mod records;
pub mod service;
mod stats;
pub mod store;
pub mod types;

pub use calendar::{DateMarker, Dot, DotKind, MarkedDateSet, build_day_data, build_marked_dates};
pub use estimator::{CycleEstimate, CycleState, Phase, estimate_cycle_state};
pub use records::{
    CycleRecord, DayData, MAX_DAY_COUNT, MedicationRecord, MoodRecord, Profile, RecordError,
    SymptomRecord,
};
pub use service::{
    FrequencyEntry, HomeSummary, Report, ServiceConfig, StatsSummary, Tracker, Warning,
};
pub use stats::{
    DEFAULT_TOP_N, TrendPoint, compute_average_cycle_length, compute_average_period_length,
    compute_cycle_length_trend, compute_frequency_table, cycle_length_gaps,
};
pub use store::{Category, FetchError, RecordStore};
pub use types::{
    MoodIntensity, MoodType, RecordId, SymptomIntensity, SymptomType, UserId, ValidationError,
    Weekday,
};
