//! Profile command for viewing and editing cycle defaults.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use ct_core::store::ProfileUpdate;
use ct_core::{Profile, UserId};
use ct_db::Database;

use super::util::parse_date;

/// Prints the stored profile, or the defaults if none exists.
pub fn show<W: Write>(writer: &mut W, db: &Database, user_id: &UserId) -> Result<()> {
    let profile = match db.get_profile(user_id)? {
        Some(row) => Profile::try_from(row).context("stored profile is invalid")?,
        None => {
            writeln!(writer, "No profile stored; showing defaults.")?;
            Profile::with_defaults(user_id.clone())
        }
    };
    write!(writer, "{}", format_profile(&profile))?;
    Ok(())
}

/// Fields accepted by `ct profile set`.
#[derive(Debug, Default)]
pub struct ProfileArgs<'a> {
    pub cycle_length: Option<u32>,
    pub period_length: Option<u32>,
    pub name: Option<&'a str>,
    pub birth_date: Option<&'a str>,
}

/// Applies the given fields, then prints the resulting profile.
pub fn set<W: Write>(
    writer: &mut W,
    db: &Database,
    user_id: &UserId,
    args: &ProfileArgs<'_>,
    today: NaiveDate,
) -> Result<()> {
    let update = ProfileUpdate {
        username: None,
        full_name: args.name.map(str::to_string),
        birth_date: args.birth_date.map(|d| parse_date(d, today)).transpose()?,
        cycle_average_length: args.cycle_length,
        period_average_length: args.period_length,
    };
    if update == ProfileUpdate::default() {
        anyhow::bail!("Nothing to update. Pass --cycle-length, --period-length, --name or --birth-date.");
    }

    db.upsert_profile(user_id, &update)?;
    show(writer, db, user_id)
}

pub fn format_profile(profile: &Profile) -> String {
    let mut output = String::new();
    let dash = "-".to_string();

    let _ = writeln!(output, "User:          {}", profile.user_id);
    let _ = writeln!(
        output,
        "Name:          {}",
        profile.full_name.as_ref().unwrap_or(&dash)
    );
    let _ = writeln!(
        output,
        "Birth date:    {}",
        profile.birth_date.map_or(dash, |d| d.to_string())
    );
    let _ = writeln!(output, "Cycle length:  {} days", profile.cycle_average_length);
    let _ = writeln!(output, "Period length: {} days", profile.period_average_length);
    output
}
