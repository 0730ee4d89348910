//! Export command for dumping all stored data as JSON.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ct_core::UserId;
use ct_db::Database;

/// Writes the user's profile and every logged record as one JSON document.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    user_id: &UserId,
    exported_at: DateTime<Utc>,
) -> Result<()> {
    let export = db
        .export_user_data(user_id, exported_at)
        .context("failed to read user data")?;
    tracing::debug!(
        cycles = export.cycles.len(),
        symptoms = export.symptoms.len(),
        moods = export.moods.len(),
        medications = export.medications.len(),
        "exporting user data"
    );

    serde_json::to_writer_pretty(&mut *writer, &export)?;
    writeln!(writer)?;
    Ok(())
}
