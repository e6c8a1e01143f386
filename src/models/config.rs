//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::FacilityRef;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream live-status source settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Ledger backend settings
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Tracked facilities, in ledger row order
    #[serde(default)]
    pub facilities: Vec<FacilityRef>,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.source.base_url.trim().is_empty() {
            return Err(AppError::validation("source.base_url is empty"));
        }
        if self.source.scope_id.trim().is_empty() {
            return Err(AppError::validation("source.scope_id is empty"));
        }
        if self.facilities.is_empty() {
            return Err(AppError::validation("No facilities defined"));
        }

        let mut seen = HashSet::new();
        for facility in &self.facilities {
            if facility.id.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "facility '{}' has an empty id",
                    facility.name
                )));
            }
            if !seen.insert(facility.id.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate facility id '{}'",
                    facility.id
                )));
            }
        }

        if self.ledger.backend == LedgerBackend::Local
            && self.ledger.local_dir.trim().is_empty()
        {
            return Err(AppError::validation("ledger.local_dir is empty"));
        }
        Ok(())
    }
}

/// Upstream live-status API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// API root, e.g. `https://api.themeparks.wiki/v1`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Resort or park entity whose live data covers every tracked facility
    #[serde(default)]
    pub scope_id: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            scope_id: String::new(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Which ledger implementation receives the rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// Google Sheets, one spreadsheet per year
    #[default]
    Sheets,
    /// JSON files under `local_dir`, one directory per ledger id
    Local,
}

/// Ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,

    /// Root directory for the local backend
    #[serde(default = "defaults::local_dir")]
    pub local_dir: String,

    /// Environment variable holding the year-to-ledger-id JSON object
    #[serde(default = "defaults::year_mapping_env")]
    pub year_mapping_env: String,

    /// Environment variable naming the service-account key file
    #[serde(default = "defaults::credentials_env")]
    pub credentials_env: String,

    /// Explicit service-account key path; wins over `credentials_env`
    #[serde(default)]
    pub credentials_path: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            local_dir: defaults::local_dir(),
            year_mapping_env: defaults::year_mapping_env(),
            credentials_env: defaults::credentials_env(),
            credentials_path: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://api.themeparks.wiki/v1".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; waitlog/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn local_dir() -> String {
        "ledger".into()
    }
    pub fn year_mapping_env() -> String {
        "WAITLOG_LEDGER_IDS".into()
    }
    pub fn credentials_env() -> String {
        "GOOGLE_APPLICATION_CREDENTIALS".into()
    }
    pub fn log_level() -> String {
        "info".into()
    }
}
