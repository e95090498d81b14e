use std::sync::Arc;

use anyhow::Context;
use memo_config::{MemoConfig, StorageBackend};
use memo_identity::{IdentityService, KeyValueStore};

/// Identity service over whichever store the configuration selects.
pub type Identity = IdentityService<Arc<dyn KeyValueStore>>;

pub fn load_config() -> anyhow::Result<MemoConfig> {
    MemoConfig::load_with_dotenv().context("failed to load memoreee configuration")
}

pub fn open_identity(config: &MemoConfig) -> anyhow::Result<Identity> {
    let store = memo_identity::open_store(&config.storage).with_context(|| {
        format!(
            "failed to open {:?} identity store",
            config.storage.backend
        )
    })?;

    match config.storage.backend {
        StorageBackend::File => tracing::debug!(
            path = ?config.storage.resolved_path().ok(),
            "opened file identity store"
        ),
        StorageBackend::Memory => {
            tracing::warn!("using in-memory identity store; mappings will not outlive this run");
        }
    }
    Ok(IdentityService::new(store))
}
