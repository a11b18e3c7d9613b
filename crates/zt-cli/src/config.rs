//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use zt_core::{BoundsPolicy, Calendar, Locale, OwnerId};
use zt_server::ServerSettings;

const DEFAULT_OWNER: &str = "local";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Address the HTTP API listens on.
    pub bind_address: String,

    /// Owner the CLI commands act for.
    pub owner: String,

    /// Name printed on exported reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,

    /// IANA zone for day and hour bucketing. Defaults to the system zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    pub locale: Locale,

    /// Reject edits that leave an entry ending before it starts.
    pub strict_updates: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("bind_address", &self.bind_address)
            .field("owner", &self.owner)
            .field("timezone", &self.timezone)
            .field("locale", &self.locale)
            .field("strict_updates", &self.strict_updates)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("zt.db"),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            owner_name: None,
            timezone: None,
            locale: Locale::default(),
            strict_updates: false,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, the platform config file, `config_path`,
    /// then `ZT_*` environment variables.
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

        figment = figment.merge(Env::prefixed("ZT_"));

        figment.extract()
    }

    /// The configured zone, or the system zone, or UTC.
    pub fn zone(&self) -> Result<Tz> {
        if let Some(name) = &self.timezone {
            return name
                .parse::<Tz>()
                .map_err(|err| anyhow::anyhow!("invalid timezone {name:?}: {err}"));
        }
        match iana_time_zone::get_timezone() {
            Ok(name) => Ok(name.parse().unwrap_or_else(|_| {
                tracing::warn!(zone = %name, "unknown system timezone, using UTC");
                Tz::UTC
            })),
            Err(err) => {
                tracing::warn!(error = %err, "could not detect system timezone, using UTC");
                Ok(Tz::UTC)
            }
        }
    }

    /// Everything a command needs besides the database.
    pub fn session(&self) -> Result<Session> {
        let owner = OwnerId::new(self.owner.clone()).context("invalid owner in configuration")?;
        Ok(Session {
            owner,
            owner_name: self.owner_name.clone(),
            calendar: Calendar::new(self.zone()?, self.locale),
            bounds_policy: BoundsPolicy::from_strict(self.strict_updates),
        })
    }
}

/// The owner and calendar commands operate with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub owner: OwnerId,
    pub owner_name: Option<String>,
    pub calendar: Calendar,
    pub bounds_policy: BoundsPolicy,
}

impl Session {
    /// Name printed on exported reports.
    pub fn display_name(&self) -> &str {
        self.owner_name
            .as_deref()
            .unwrap_or_else(|| self.owner.as_str())
    }

    pub const fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            calendar: self.calendar,
            bounds_policy: self.bounds_policy,
        }
    }
}

/// Returns the platform-specific config directory for zt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("zt"))
}

/// Returns the platform-specific data directory for zt.
///
/// On Linux: `~/.local/share/zt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("zt"))
}
