//! Configuration loading and management.

use std::path::{Path, PathBuf};

use ct_core::ServiceConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Overrides the user ID stored by `ct init`.
    pub user_id: Option<String>,
    /// How many days of history the calendar loads.
    pub calendar_lookback_days: u32,
    /// How many days of history the statistics cover.
    pub stats_lookback_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let service = ServiceConfig::default();
        Self {
            database_path: data_dir.join("ct.db"),
            user_id: None,
            calendar_lookback_days: service.calendar_lookback_days,
            stats_lookback_days: service.stats_lookback_days,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // CT_DATABASE_PATH, CT_USER_ID, ...
        figment = figment.merge(Env::prefixed("CT_"));

        figment.extract()
    }

    pub const fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            calendar_lookback_days: self.calendar_lookback_days,
            stats_lookback_days: self.stats_lookback_days,
        }
    }
}

/// Returns the platform-specific config directory for ct.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ct"))
}

/// Returns the platform-specific data directory for ct.
///
/// On Linux: `~/.local/share/ct`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ct"))
}
