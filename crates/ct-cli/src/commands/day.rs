//! Day command: everything logged on a single date.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use ct_core::{DayData, MedicationRecord, RecordStore, Tracker, UserId};

use super::util::print_warnings;

pub fn run<W: Write, S: RecordStore + Sync>(
    writer: &mut W,
    tracker: &Tracker<'_, S>,
    user_id: &UserId,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let report = tracker.day_data(user_id, date);
    print_warnings(&report.warnings);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report.value)?)?;
    } else {
        write!(writer, "{}", format_day(&report.value))?;
    }
    Ok(())
}

pub fn format_day(day: &DayData) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", day.date.format("%A %Y-%m-%d"));

    match (&day.cycle, day.is_period) {
        (Some(cycle), true) => {
            let day_of_period = (day.date - cycle.start_date).num_days() + 1;
            let _ = writeln!(
                output,
                "Period: day {day_of_period} (started {}, cycle {})",
                cycle.start_date, cycle.id
            );
        }
        _ => {
            let _ = writeln!(output, "Period: no");
        }
    }

    let _ = writeln!(output, "Symptoms:");
    if day.symptoms.is_empty() {
        let _ = writeln!(output, "- none");
    }
    for symptom in &day.symptoms {
        let _ = write!(output, "- {} ({})", symptom.kind.label(), symptom.intensity.label());
        write_notes(&mut output, symptom.notes.as_deref());
    }

    let _ = writeln!(output, "Moods:");
    if day.moods.is_empty() {
        let _ = writeln!(output, "- none");
    }
    for mood in &day.moods {
        let _ = write!(output, "- {} ({})", mood.kind.label(), mood.intensity.label());
        write_notes(&mut output, mood.notes.as_deref());
    }

    let _ = writeln!(output, "Medications:");
    if day.medications.is_empty() {
        let _ = writeln!(output, "- none");
    }
    for medication in &day.medications {
        let _ = write!(output, "- {}", describe_medication(medication));
        write_notes(&mut output, medication.notes.as_deref());
    }
    output
}

fn describe_medication(medication: &MedicationRecord) -> String {
    let mut line = format!(
        "{} {} at {} [{}]",
        medication.name,
        medication.dosage,
        medication.time,
        if medication.taken { "taken" } else { "not taken" }
    );
    if let Some(days) = medication.recurring_days.as_ref().filter(|d| !d.is_empty()) {
        let days: Vec<&str> = days.iter().map(|d| d.label()).collect();
        let _ = write!(line, " repeats {}", days.join(", "));
    }
    line
}

fn write_notes(output: &mut String, notes: Option<&str>) {
    match notes {
        Some(notes) => {
            let _ = writeln!(output, ": {notes}");
        }
        None => output.push('\n'),
    }
}
