//! Calendar command: a month grid with logged days marked.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use ct_core::{DateMarker, MarkedDateSet, RecordStore, Tracker, UserId};

use super::util::print_warnings;

const WEEKDAYS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

pub fn run<W: Write, S: RecordStore + Sync>(
    writer: &mut W,
    tracker: &Tracker<'_, S>,
    user_id: &UserId,
    selected: NaiveDate,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let report = tracker.marked_dates(user_id, selected, today);
    print_warnings(&report.warnings);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report.value)?)?;
    } else {
        write!(writer, "{}", format_month(&report.value, selected))?;
    }
    Ok(())
}

/// Renders the month containing `selected`, Monday first.
pub fn format_month(marks: &MarkedDateSet, selected: NaiveDate) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", selected.format("%B %Y"));

    let header: String = WEEKDAYS.iter().map(|d| format!(" {d} ")).collect();
    let _ = writeln!(output, "{}", header.trim_end());

    let first = selected.with_day(1).unwrap_or(selected);
    let mut line: String = (0..first.weekday().num_days_from_monday())
        .map(|_| "    ")
        .collect();
    let month: Vec<NaiveDate> = first
        .iter_days()
        .take_while(|d| d.month() == first.month())
        .collect();

    for day in &month {
        let marker = marks.get(*day);
        let prefix = if marker.is_some_and(|m| m.selected) { '>' } else { ' ' };
        let _ = write!(line, "{prefix}{:>2}{}", day.day(), cell_mark(marker));
        if day.weekday() == chrono::Weekday::Sun {
            let _ = writeln!(output, "{}", line.trim_end());
            line.clear();
        }
    }
    if !line.is_empty() {
        let _ = writeln!(output, "{}", line.trim_end());
    }

    let _ = writeln!(output, "* period  + other entries  > selected");

    let logged: Vec<(NaiveDate, String)> = month
        .iter()
        .filter_map(|day| {
            let kinds = logged_kinds(marks.get(*day)?);
            (!kinds.is_empty()).then(|| (*day, kinds.join(", ")))
        })
        .collect();
    if !logged.is_empty() {
        let _ = writeln!(output, "Logged:");
        for (day, kinds) in logged {
            let _ = writeln!(output, "{day}  {kinds}");
        }
    }
    output
}

fn cell_mark(marker: Option<&DateMarker>) -> char {
    match marker {
        Some(m) if m.periods => '*',
        Some(m) if m.symptoms || m.moods || m.medications => '+',
        _ => ' ',
    }
}

fn logged_kinds(marker: &DateMarker) -> Vec<&'static str> {
    [
        (marker.periods, "period"),
        (marker.symptoms, "symptom"),
        (marker.moods, "mood"),
        (marker.medications, "medication"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect()
}
