//! Identity mapping store configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Backing implementation for the mapping store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// JSON file on disk, shared across restarts.
    #[default]
    File,
    /// Process-local map. Mappings do not survive a restart.
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Mapping file path. Empty means `<data dir>/memoreee/identity.json`.
    #[serde(default)]
    pub path: String,
}

impl StorageConfig {
    /// Resolve the mapping file path, applying the platform default when unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoDefaultPath` if `path` is empty and the platform
    /// has no data directory.
    pub fn resolved_path(&self) -> Result<PathBuf, ConfigError> {
        if !self.path.trim().is_empty() {
            return Ok(PathBuf::from(self.path.trim()));
        }
        dirs::data_dir()
            .map(|dir| dir.join("memoreee").join("identity.json"))
            .ok_or_else(|| ConfigError::NoDefaultPath {
                field: "storage.path".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_file() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, StorageBackend::File);
        assert!(config.path.is_empty());
    }

    #[test]
    fn explicit_path_wins() {
        let config = StorageConfig {
            path: " /tmp/ids.json ".into(),
            ..Default::default()
        };
        assert_eq!(
            config.resolved_path().unwrap(),
            PathBuf::from("/tmp/ids.json")
        );
    }

    #[test]
    fn default_path_ends_with_identity_file() {
        if let Ok(path) = StorageConfig::default().resolved_path() {
            assert!(path.ends_with("memoreee/identity.json"));
        }
    }
}
