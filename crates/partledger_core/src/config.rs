//! Environment-driven runtime configuration.
//!
//! # Responsibility
//! - Read database, logging, login and report settings from the process
//!   environment (the CLI loads `.env` first).
//!
//! # Invariants
//! - Missing or blank variables fall back to defaults; reading never fails.

use crate::logging::default_log_level;
use crate::report::renderer::ReportConfig;
use crate::session::Credentials;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "PARTLEDGER_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "PARTLEDGER_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PARTLEDGER_LOG_DIR";
pub const ENV_USERNAME: &str = "PARTLEDGER_USERNAME";
pub const ENV_PASSWORD: &str = "PARTLEDGER_PASSWORD";
pub const ENV_ORG_NAME: &str = "PARTLEDGER_ORG_NAME";
pub const ENV_ORG_SUBTITLE: &str = "PARTLEDGER_ORG_SUBTITLE";
pub const ENV_CURRENCY: &str = "PARTLEDGER_CURRENCY";
pub const ENV_FILE_PREFIX: &str = "PARTLEDGER_FILE_PREFIX";
pub const ENV_GENERATED_LABEL: &str = "PARTLEDGER_GENERATED_LABEL";

const DEFAULT_DB_FILE: &str = "partledger.sqlite3";

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is enabled only when this is set.
    pub log_dir: Option<PathBuf>,
    pub credentials: Credentials,
    pub report: ReportConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = ReportConfig::default();

        Self {
            db_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE)),
            log_level: read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
            credentials: Credentials::new(
                read(ENV_USERNAME).unwrap_or_default(),
                lookup(ENV_PASSWORD).unwrap_or_default(),
            ),
            report: ReportConfig {
                organization_name: read(ENV_ORG_NAME).unwrap_or(defaults.organization_name),
                organization_subtitle: read(ENV_ORG_SUBTITLE)
                    .unwrap_or(defaults.organization_subtitle),
                currency: read(ENV_CURRENCY).unwrap_or(defaults.currency),
                file_prefix: read(ENV_FILE_PREFIX).unwrap_or(defaults.file_prefix),
                generated_label: read(ENV_GENERATED_LABEL).unwrap_or(defaults.generated_label),
            },
        }
    }
}
