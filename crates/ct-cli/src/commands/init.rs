//! Init command for establishing the user identity and profile.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use ct_core::store::ProfileUpdate;
use ct_db::Database;

use crate::{Config, user};

/// Runs the init command.
///
/// Safe to re-run: an existing identity is kept and only `name` is applied.
pub fn run<W: Write>(writer: &mut W, db: &Database, config: &Config, name: Option<&str>) -> Result<()> {
    let (identity, created) = user::init_user(Utc::now())?;
    let user_id = user::require_user(config)?;

    let update = ProfileUpdate {
        full_name: name.map(str::to_string),
        ..ProfileUpdate::default()
    };
    db.upsert_profile(&user_id, &update)
        .context("failed to create profile")?;
    tracing::debug!(%user_id, created, "profile initialized");

    if created {
        writeln!(writer, "Created user identity.")?;
    }
    writeln!(writer, "User ID:  {user_id}")?;
    writeln!(writer, "Saved to: {}", user::user_json_path()?.display())?;
    if user_id.as_str() != identity.user_id {
        writeln!(writer, "Note: user_id from configuration overrides user.json")?;
    }

    Ok(())
}
