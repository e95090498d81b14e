//! Session coordinator configuration.

use serde::{Deserialize, Serialize};

/// Default bound on one auth provider probe, in milliseconds.
const fn default_probe_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// How long a provider probe may take before it counts as unavailable.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn probe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.probe_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = SessionConfig::default();
        assert_eq!(config.probe_timeout_ms, 5_000);
        assert_eq!(config.probe_timeout().as_secs(), 5);
    }
}
