//! Stats command: cycle averages, trend and most frequent entries.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use ct_core::{FrequencyEntry, RecordStore, StatsSummary, Tracker, UserId};

use super::util::print_warnings;

pub fn run<W: Write, S: RecordStore + Sync>(
    writer: &mut W,
    tracker: &Tracker<'_, S>,
    user_id: &UserId,
    today: NaiveDate,
    lookback_days: u32,
    json: bool,
) -> Result<()> {
    let report = tracker.stats_summary(user_id, today);
    print_warnings(&report.warnings);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report.value)?)?;
    } else {
        write!(writer, "{}", format_stats(&report.value, lookback_days))?;
    }
    Ok(())
}

pub fn format_stats(stats: &StatsSummary, lookback_days: u32) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Last {lookback_days} days: {} cycles, {} symptoms, {} moods",
        stats.cycles_logged, stats.symptoms_logged, stats.moods_logged
    );
    let _ = writeln!(
        output,
        "Average cycle length:  {}",
        describe_days(stats.average_cycle_length)
    );
    let _ = writeln!(
        output,
        "Average period length: {}",
        describe_days(stats.average_period_length)
    );

    if !stats.cycle_length_trend.is_empty() {
        let _ = writeln!(output, "Cycle length trend:");
        for point in &stats.cycle_length_trend {
            let _ = writeln!(output, "- {}: {} days", point.label, point.days);
        }
    }

    write_frequencies(&mut output, "Top symptoms:", &stats.top_symptoms);
    write_frequencies(&mut output, "Top moods:", &stats.top_moods);
    output
}

fn describe_days(days: Option<u32>) -> String {
    days.map_or_else(|| "not enough data".to_string(), |d| format!("{d} days"))
}

fn write_frequencies(output: &mut String, title: &str, entries: &[FrequencyEntry]) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(output, "{title}");
    for entry in entries {
        let _ = writeln!(output, "- {}: {}", entry.label, entry.count);
    }
}
