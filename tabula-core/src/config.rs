//! Engine configuration.
//!
//! Resolution order (lowest to highest priority):
//! 1. the `tabula:` section of a YAML file or string
//! 2. `.env` file (loaded into the process environment, never overwriting)
//! 3. environment variables `TABULA_MAX_PAGE_SIZE`, `TABULA_PARAM_STYLE`,
//!    `TABULA_LOG_REQUESTS`
//!
//! ```yaml
//! tabula:
//!   max_page_size: 500
//!   param_style: hash
//!   log_requests: true
//! ```

use crate::filter::ParamStyle;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O or YAML parsing error occurred while loading.
    Load(String),
    /// A value was present but could not be used.
    Invalid { key: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid { key, message } => {
                write!(f, "Invalid config value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings of the CRUD engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CrudConfig {
    /// Largest page size accepted by advanced selects. `None` means no limit.
    pub max_page_size: Option<u64>,
    /// Token syntax used by [`Filter`](crate::Filter)s built from this config.
    pub param_style: ParamStyle,
    /// Emit every request as JSON at TRACE level.
    pub log_requests: bool,
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    tabula: Option<CrudConfig>,
}

impl CrudConfig {
    /// Parse the `tabula:` section of a YAML document, without env overrides.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let doc: Document =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Load(e.to_string()))?;
        Ok(doc.tabula.unwrap_or_default())
    }

    /// Load from a YAML file (if it exists), then `.env`, then the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
            Self::from_yaml_str(&content)?
        } else {
            Self::default()
        };

        let _ = dotenvy::dotenv();
        config.apply_env()?;
        tracing::debug!(
            path = %path.display(),
            max_page_size = ?config.max_page_size,
            param_style = ?config.param_style,
            log_requests = config.log_requests,
            "Loaded CRUD configuration"
        );
        Ok(config)
    }

    /// Overlay `TABULA_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = std::env::var("TABULA_MAX_PAGE_SIZE") {
            let size = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "TABULA_MAX_PAGE_SIZE".into(),
                message: e.to_string(),
            })?;
            self.max_page_size = if size == 0 { None } else { Some(size) };
        }
        if let Ok(raw) = std::env::var("TABULA_PARAM_STYLE") {
            self.param_style = raw
                .trim()
                .parse()
                .map_err(|message| ConfigError::Invalid {
                    key: "TABULA_PARAM_STYLE".into(),
                    message,
                })?;
        }
        if let Ok(raw) = std::env::var("TABULA_LOG_REQUESTS") {
            self.log_requests = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "TABULA_LOG_REQUESTS".into(),
                        message: format!("expected a boolean, got `{other}`"),
                    })
                }
            };
        }
        Ok(())
    }
}
