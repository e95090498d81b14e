//! # memo-config
//!
//! Layered configuration loading for Memoreee using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`MEMOREEE_*` prefix, `__` as separator)
//! 2. Project-level `.memoreee/config.toml`
//! 3. User-level `~/.config/memoreee/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `MEMOREEE_STORAGE__PATH` -> `storage.path`,
//! `MEMOREEE_SESSION__PROBE_TIMEOUT_MS` -> `session.probe_timeout_ms`, etc.
//!
//! ```no_run
//! use memo_config::MemoConfig;
//!
//! let config = MemoConfig::load_with_dotenv().expect("config");
//! println!("probe timeout: {:?}", config.session.probe_timeout());
//! ```

mod error;
mod logging;
mod session;
mod storage;

pub use error::ConfigError;
pub use logging::LoggingConfig;
pub use session::SessionConfig;
pub use storage::{StorageBackend, StorageConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix for every override.
pub const ENV_PREFIX: &str = "MEMOREEE_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MemoConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MemoConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source fails to parse or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source fails to parse or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or layer additional
    /// providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(".memoreee/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject values that would make the coordinator misbehave.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero probe timeout or an
    /// empty log filter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.probe_timeout_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.filter".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("memoreee").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MemoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn zero_probe_timeout_is_rejected() {
        let mut config = MemoConfig::default();
        config.session.probe_timeout_ms = 0;
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("session.probe_timeout_ms"));
    }
}
