//! Logging configuration.

use serde::{Deserialize, Serialize};

fn default_filter() -> String {
    "warn".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` env-filter directive used when `MEMOREEE_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}
