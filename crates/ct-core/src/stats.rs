//! Aggregate statistics over a user's history.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::records::CycleRecord;

/// Gaps at or above this many days are treated as data-entry errors.
pub const MAX_PLAUSIBLE_CYCLE_DAYS: i64 = 60;

/// Default number of entries in a frequency table.
pub const DEFAULT_TOP_N: usize = 5;

/// Number of most recent gaps shown in the cycle length trend.
pub const TREND_POINTS: usize = 6;

/// One bar of the cycle-length chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub days: i64,
}

/// Start-date gaps between adjacent cycles that pass the outlier filter.
///
/// `cycles` must be ordered most recent first; each gap is
/// `newer.start_date - older.start_date`. Gaps `<= 0` (duplicates, wrong
/// ordering) and `>= 60` (missed logs) are dropped.
pub fn cycle_length_gaps(cycles: &[CycleRecord]) -> Vec<i64> {
    cycles
        .windows(2)
        .map(|pair| (pair[0].start_date - pair[1].start_date).num_days())
        .filter(|gap| *gap > 0 && *gap < MAX_PLAUSIBLE_CYCLE_DAYS)
        .collect()
}

/// Mean cycle length in days, rounded to the nearest integer.
///
/// Returns `None` when fewer than two cycles exist or every gap was filtered.
pub fn compute_average_cycle_length(cycles: &[CycleRecord]) -> Option<u32> {
    rounded_mean(cycle_length_gaps(cycles))
}

/// Mean of all recorded non-zero period lengths, rounded to the nearest
/// integer.
pub fn compute_average_period_length(cycles: &[CycleRecord]) -> Option<u32> {
    rounded_mean(
        cycles
            .iter()
            .filter_map(|cycle| cycle.period_length)
            .filter(|length| *length > 0)
            .map(i64::from),
    )
}

/// The tail of [`cycle_length_gaps`], labelled for charting.
///
/// Labels number the gaps in the order they were computed, so the last
/// point of a long history may read `Cycle 9`.
pub fn compute_cycle_length_trend(cycles: &[CycleRecord]) -> Vec<TrendPoint> {
    let gaps = cycle_length_gaps(cycles);
    let skip = gaps.len().saturating_sub(TREND_POINTS);
    gaps.into_iter()
        .enumerate()
        .skip(skip)
        .map(|(index, days)| TrendPoint {
            label: format!("Cycle {}", index + 1),
            days,
        })
        .collect()
}

/// Counts records by category, most frequent first.
///
/// Ties keep the order in which each category first appears in `records`.
/// At most `top_n` entries are returned.
pub fn compute_frequency_table<T, K, F>(records: &[T], classifier: F, top_n: usize) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();

    for record in records {
        let key = classifier(record);
        if let Some(&position) = positions.get(&key) {
            counts[position].1 += 1;
        } else {
            positions.insert(key.clone(), counts.len());
            counts.push((key, 1));
        }
    }

    // Stable sort preserves first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(top_n);
    counts
}

/// Arithmetic mean rounded half up, for non-negative inputs.
fn rounded_mean(values: impl IntoIterator<Item = i64>) -> Option<u32> {
    let (sum, count) = values
        .into_iter()
        .fold((0_i64, 0_i64), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        return None;
    }
    u32::try_from((2 * sum + count) / (2 * count)).ok()
}
