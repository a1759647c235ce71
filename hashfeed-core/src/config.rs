use crate::error::{ConfigError, CoreError};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
const DEFAULT_PAGE_SIZE: u32 = 15;

/// Application configuration, loaded from a TOML file with environment
/// overrides for the credential pair (`HASHFEED_CONSUMER_KEY` /
/// `HASHFEED_CONSUMER_SECRET`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|_| {
            ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
        })?;
        let mut config: AppConfig = toml::from_str(&raw).map_err(ConfigError::Parse)?;
        config.apply_env_overrides();
        config.validate()?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Build from the environment alone, for setups without a config file.
    pub fn from_env() -> Result<Self, CoreError> {
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("HASHFEED_CONSUMER_KEY") {
            self.consumer_key = key;
        }
        if let Ok(secret) = std::env::var("HASHFEED_CONSUMER_SECRET") {
            self.consumer_secret = secret;
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.consumer_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "consumer_key".to_string(),
            }
            .into());
        }
        if self.consumer_secret.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "consumer_secret".to_string(),
            }
            .into());
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
