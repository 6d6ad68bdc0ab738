//! Application Settings Module
//! Layered configuration: defaults, an optional TOML file, then environment
//! variables prefixed with `NEXT_ACTION_BI_` (nested keys use `__`, e.g.
//! `NEXT_ACTION_BI_MAIL__SMTP_PORT`).

use crate::notify::MailSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PREFIX: &str = "NEXT_ACTION_BI";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings: {0}")]
    Read(#[from] config::ConfigError),
    #[error("Invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Sales dataset to load on startup.
    pub data_path: PathBuf,
    /// Optional JSON file replacing the built-in action catalog.
    pub catalog_path: Option<PathBuf>,
    /// Rows shown in the data preview grid.
    pub preview_rows: usize,
    pub mail: MailSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("discansamp.xlsx"),
            catalog_path: None,
            preview_rows: 20,
            mail: MailSettings::default(),
        }
    }
}

impl AppSettings {
    /// Read settings from `path` (if it exists) and the environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(data_path = ?settings.data_path, "settings loaded");
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.data_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "data_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.preview_rows == 0 {
            return Err(ConfigError::Invalid {
                key: "preview_rows",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.mail.smtp_port == 0 {
            return Err(ConfigError::Invalid {
                key: "mail.smtp_port",
                reason: "must be a valid port".to_string(),
            });
        }
        Ok(())
    }
}
