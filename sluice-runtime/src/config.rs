//! Runtime configuration, read from `sluice.toml`.

use crate::lifecycle::ReleasePolicy;
use crate::pool::PoolConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SinkConfig {
    pub release_policy: ReleasePolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub pool: PoolConfig,
    pub sink: SinkConfig,
}

impl RuntimeConfig {
    /// Loads configuration from `path`. A missing, unreadable or invalid
    /// file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "No runtime config found, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        release_policy = ?config.sink.release_policy,
                        "Loaded runtime config"
                    );
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid runtime config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read runtime config, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let pool = &self.pool;
        for (key, value) in [
            ("max-total-per-key", pool.max_total_per_key),
            ("max-total", pool.max_total),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("pool.{key} must be at least 1")));
            }
            if value > Semaphore::MAX_PERMITS {
                return Err(ConfigError::Invalid(format!(
                    "pool.{key} must be at most {}",
                    Semaphore::MAX_PERMITS
                )));
            }
        }
        if pool.max_block_wait_ms == 0 {
            return Err(ConfigError::Invalid(
                "pool.max-block-wait-ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
