//! Log commands for recording periods, symptoms, moods and medications.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use ct_core::store::{NewCycle, NewMedication, NewMood, NewSymptom};
use ct_core::{
    MAX_DAY_COUNT, MoodIntensity, MoodType, RecordId, SymptomIntensity, SymptomType, UserId,
    Weekday,
};
use ct_db::Database;

use super::util::{parse_choice, parse_date};

/// Logs a period start, optionally with a known end date or length.
#[expect(clippy::too_many_arguments, reason = "CLI flag passthrough")]
pub fn period<W: Write>(
    writer: &mut W,
    db: &Database,
    user_id: &UserId,
    start: &str,
    end: Option<&str>,
    length: Option<u32>,
    notes: Option<String>,
    today: NaiveDate,
) -> Result<RecordId> {
    let start_date = parse_date(start, today)?;
    let end_date = end.map(|e| parse_date(e, today)).transpose()?;

    let period_length = match end_date {
        Some(end_date) => {
            if end_date < start_date {
                anyhow::bail!("period cannot end ({end_date}) before it starts ({start_date})");
            }
            let days = (end_date - start_date).num_days() + 1;
            let Some(days) = u32::try_from(days).ok().filter(|d| *d <= MAX_DAY_COUNT) else {
                anyhow::bail!("period of {days} days is longer than {MAX_DAY_COUNT} days");
            };
            Some(days)
        }
        None => length,
    };

    let id = db.insert_cycle(&NewCycle {
        user_id: user_id.clone(),
        start_date,
        end_date,
        period_length,
        notes,
    })?;
    tracing::debug!(id, %start_date, "period logged");

    write!(writer, "Logged period {id} starting {start_date}")?;
    if let Some(length) = period_length {
        write!(writer, " ({length} days)")?;
    }
    writeln!(writer)?;
    Ok(id)
}

/// Records the last day of an already logged period.
pub fn period_end<W: Write>(
    writer: &mut W,
    db: &Database,
    user_id: &UserId,
    id: RecordId,
    end: &str,
    today: NaiveDate,
) -> Result<()> {
    let end_date = parse_date(end, today)?;
    let length = db.set_cycle_end(user_id, id, end_date)?;
    writeln!(writer, "Period {id} ended {end_date} ({length} days)")?;
    Ok(())
}

pub fn period_delete<W: Write>(writer: &mut W, db: &Database, user_id: &UserId, id: RecordId) -> Result<()> {
    db.delete_cycle(user_id, id)?;
    writeln!(writer, "Deleted period {id}")?;
    Ok(())
}

/// Logs one symptom row per type, all sharing the same intensity and date.
///
/// Every type is parsed before anything is written, and the rows are
/// inserted in one transaction.
#[expect(clippy::too_many_arguments, reason = "CLI flag passthrough")]
pub fn symptoms<W: Write>(
    writer: &mut W,
    db: &Database,
    user_id: &UserId,
    kinds: &[String],
    intensity: &str,
    date: Option<&str>,
    notes: Option<&str>,
    today: NaiveDate,
) -> Result<Vec<RecordId>> {
    let date = date.map_or(Ok(today), |d| parse_date(d, today))?;
    let intensity: SymptomIntensity = parse_choice(intensity, SymptomIntensity::ALL)?;
    let kinds = kinds
        .iter()
        .map(|k| parse_choice::<SymptomType>(k, SymptomType::ALL))
        .collect::<Result<Vec<_>>>()?;

    let rows: Vec<NewSymptom> = kinds
        .into_iter()
        .map(|kind| NewSymptom {
            user_id: user_id.clone(),
            date,
            kind,
            intensity,
            notes: notes.map(str::to_string),
        })
        .collect();
    let ids = db.insert_symptoms(&rows)?;
    for (id, row) in ids.iter().zip(&rows) {
        writeln!(writer, "Logged symptom {id}: {} ({}) on {date}", row.kind.label(), intensity.label())?;
    }
    Ok(ids)
}

/// Logs one mood row per type, all sharing the same intensity and date.
///
/// Every type is parsed before anything is written, and the rows are
/// inserted in one transaction.
#[expect(clippy::too_many_arguments, reason = "CLI flag passthrough")]
pub fn moods<W: Write>(
    writer: &mut W,
    db: &Database,
    user_id: &UserId,
    kinds: &[String],
    intensity: &str,
    date: Option<&str>,
    notes: Option<&str>,
    today: NaiveDate,
) -> Result<Vec<RecordId>> {
    let date = date.map_or(Ok(today), |d| parse_date(d, today))?;
    let intensity: MoodIntensity = parse_choice(intensity, MoodIntensity::ALL)?;
    let kinds = kinds
        .iter()
        .map(|k| parse_choice::<MoodType>(k, MoodType::ALL))
        .collect::<Result<Vec<_>>>()?;

    let rows: Vec<NewMood> = kinds
        .into_iter()
        .map(|kind| NewMood {
            user_id: user_id.clone(),
            date,
            kind,
            intensity,
            notes: notes.map(str::to_string),
        })
        .collect();
    let ids = db.insert_moods(&rows)?;
    for (id, row) in ids.iter().zip(&rows) {
        writeln!(writer, "Logged mood {id}: {} ({}) on {date}", row.kind.label(), intensity.label())?;
    }
    Ok(ids)
}

/// Arguments of `ct log medication`.
#[derive(Debug)]
pub struct MedicationArgs<'a> {
    pub name: &'a str,
    pub dosage: &'a str,
    pub date: Option<&'a str>,
    pub time: &'a str,
    pub taken: bool,
    pub recurring_days: &'a [String],
    pub notes: Option<&'a str>,
}

pub fn medication<W: Write>(
    writer: &mut W,
    db: &Database,
    user_id: &UserId,
    args: &MedicationArgs<'_>,
    today: NaiveDate,
) -> Result<RecordId> {
    if args.name.trim().is_empty() {
        anyhow::bail!("medication name cannot be empty");
    }
    let date = args.date.map_or(Ok(today), |d| parse_date(d, today))?;
    let mut recurring_days = args
        .recurring_days
        .iter()
        .map(|d| parse_choice::<Weekday>(d, Weekday::ALL))
        .collect::<Result<Vec<_>>>()?;
    recurring_days.sort_unstable();
    recurring_days.dedup();

    let id = db.insert_medication(&NewMedication {
        user_id: user_id.clone(),
        name: args.name.to_string(),
        dosage: args.dosage.to_string(),
        date,
        time: args.time.to_string(),
        taken: args.taken,
        recurring_days: recurring_days.clone(),
        notes: args.notes.map(str::to_string),
    })?;

    write!(writer, "Logged medication {id}: {} {} on {date} at {}", args.name, args.dosage, args.time)?;
    if !recurring_days.is_empty() {
        let days: Vec<&str> = recurring_days.iter().map(|d| d.label()).collect();
        write!(writer, ", repeating {}", days.join(", "))?;
    }
    writeln!(writer)?;
    Ok(id)
}

pub fn medication_taken<W: Write>(
    writer: &mut W,
    db: &Database,
    user_id: &UserId,
    id: RecordId,
    taken: bool,
) -> Result<()> {
    db.set_medication_taken(user_id, id, taken)?;
    let state = if taken { "taken" } else { "not taken" };
    writeln!(writer, "Medication {id} marked {state}")?;
    Ok(())
}
