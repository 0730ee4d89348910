//! User identity management.
//!
//! `ct init` generates a persistent UUID stored in `user.json`; every record
//! the CLI writes is keyed by it. `CT_USER_ID` (or `user_id` in the config
//! file) takes precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use ct_core::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Config;

/// User identity stored in `user.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub created_at: String,
}

/// Returns the path to user.json in the XDG data directory.
pub fn user_json_path() -> Result<PathBuf> {
    let data_dir = crate::config::dirs_data_path().context("could not determine data directory")?;
    Ok(data_dir.join("user.json"))
}

/// Loads the identity from a specific path.
///
/// Returns `None` if the file doesn't exist.
fn load_from(path: &Path) -> Result<Option<UserIdentity>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let identity: UserIdentity =
                serde_json::from_str(&content).context("failed to parse user.json")?;
            Ok(Some(identity))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context("failed to read user.json"),
    }
}

/// Resolves the active user, failing with a helpful message if none exists.
pub fn require_user(config: &Config) -> Result<UserId> {
    if let Some(id) = &config.user_id {
        return UserId::new(id.as_str()).context("invalid user_id in configuration");
    }
    let identity =
        load_from(&user_json_path()?)?.context("No user identity found. Run 'ct init' first.")?;
    UserId::new(identity.user_id).context("invalid user_id in user.json")
}

/// Returns the existing identity, or creates one.
///
/// The boolean is `true` when a new identity was written.
pub fn init_user(now: DateTime<Utc>) -> Result<(UserIdentity, bool)> {
    init_user_at(&user_json_path()?, now)
}

fn init_user_at(path: &Path, now: DateTime<Utc>) -> Result<(UserIdentity, bool)> {
    if let Some(existing) = load_from(path)? {
        return Ok((existing, false));
    }

    let identity = UserIdentity {
        user_id: Uuid::new_v4().to_string(),
        created_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    save_to(path, &identity)?;
    Ok((identity, true))
}

fn save_to(path: &Path, identity: &UserIdentity) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("failed to create data directory")?;
    }
    let json = serde_json::to_string_pretty(identity).context("failed to serialize identity")?;
    std::fs::write(path, json).context("failed to write user.json")?;
    Ok(())
}
