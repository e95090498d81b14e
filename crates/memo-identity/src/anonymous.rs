//! Anonymous identity store.
//!
//! Issues one `anonymous_<millis>_<suffix>` token per store and keeps
//! returning it. The token is deliberately local to the store: two devices
//! never share it. When the store is unusable the caller still gets a token,
//! just a fresh one per call.

use chrono::Utc;
use memo_core::{IdentityError, IdentityMapping, IdentityToken};
use uuid::Uuid;

use crate::error::StoreError;
use crate::keys;
use crate::store::KeyValueStore;

const PREFIX: &str = "anonymous";
const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a new anonymous token.
#[must_use]
pub fn generate_anonymous_token() -> IdentityToken {
    let mut bytes = [0u8; SUFFIX_LEN];
    if let Err(error) = getrandom::fill(&mut bytes) {
        tracing::warn!(%error, "OS randomness unavailable; using uuid entropy");
        bytes.copy_from_slice(&Uuid::new_v4().as_bytes()[..SUFFIX_LEN]);
    }
    let suffix: String = bytes
        .iter()
        .map(|b| char::from(BASE36[usize::from(*b) % BASE36.len()]))
        .collect();
    let millis = Utc::now().timestamp_millis();
    IdentityToken::anonymous(millis, &suffix)
}

/// Whether `token` has the current `anonymous_<millis>_<9 base36>` shape.
#[must_use]
pub fn is_current_format(token: &str) -> bool {
    let mut parts = token.splitn(3, '_');
    let (Some(prefix), Some(millis), Some(suffix)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    prefix == PREFIX
        && !millis.is_empty()
        && millis.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|b| BASE36.contains(&b))
}

#[derive(Debug, Clone)]
pub struct AnonymousIdStore<S> {
    store: S,
}

impl<S: KeyValueStore> AnonymousIdStore<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Return this store's anonymous token, creating it on first use.
    ///
    /// Never fails: if the store cannot be read or written, a fresh
    /// unpersisted token is returned and the degradation is logged.
    pub fn get_or_create(&self) -> IdentityToken {
        match self.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                let token = generate_anonymous_token();
                match self.save(&token) {
                    Ok(()) => tracing::info!(%token, "created anonymous identity"),
                    Err(error) => tracing::warn!(
                        %error,
                        "anonymous identity not persisted; it will not survive this call"
                    ),
                }
                token
            }
            Err(error) => {
                tracing::warn!(%error, "storage unavailable; issuing ephemeral anonymous identity");
                generate_anonymous_token()
            }
        }
    }

    /// Replace a stored anonymous id that predates the current format.
    ///
    /// Returns `true` if a replacement was written.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be read or written.
    pub fn migrate_anonymous_id(&self) -> Result<bool, IdentityError> {
        let Some(existing) = self.load()? else {
            return Ok(false);
        };
        if is_current_format(existing.as_str()) {
            return Ok(false);
        }
        let replacement = generate_anonymous_token();
        self.save(&replacement)?;
        tracing::info!(old = %existing, new = %replacement, "migrated anonymous identity format");
        Ok(true)
    }

    fn load(&self) -> Result<Option<IdentityToken>, StoreError> {
        let Some(raw) = self.store.get(keys::ANONYMOUS_KEY)? else {
            return Ok(None);
        };
        // Older stores kept the bare id string rather than a mapping record.
        let token = serde_json::from_str::<IdentityMapping>(&raw)
            .map(|mapping| mapping.token)
            .ok()
            .or_else(|| IdentityToken::new(raw.trim()).ok());
        Ok(token)
    }

    fn save(&self, token: &IdentityToken) -> Result<(), StoreError> {
        let json = serde_json::to_string(&IdentityMapping::anonymous(token.clone()))?;
        self.store.set(keys::ANONYMOUS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disk gone".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk gone".into()))
        }
        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk gone".into()))
        }
        fn keys(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("disk gone".into()))
        }
    }

    #[test]
    fn generated_tokens_have_current_format() {
        let token = generate_anonymous_token();
        assert!(is_current_format(token.as_str()), "{token}");
    }

    #[test]
    fn format_check_rejects_legacy_ids() {
        assert!(!is_current_format("3f1c2d4e-0000-4000-8000-000000000001"));
        assert!(!is_current_format("anonymous_abc_123456789"));
        assert!(!is_current_format("anonymous_1700000000000_short"));
        assert!(!is_current_format("anonymous_1700000000000_ABCDEFGHI"));
        assert!(is_current_format("anonymous_1700000000000_abc123xyz"));
    }

    #[test]
    fn same_store_returns_same_token() {
        let anon = AnonymousIdStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(anon.get_or_create(), anon.get_or_create());
    }

    #[test]
    fn separate_stores_get_separate_tokens() {
        let a = AnonymousIdStore::new(MemoryStore::new()).get_or_create();
        let b = AnonymousIdStore::new(MemoryStore::new()).get_or_create();
        assert_ne!(a, b);
    }

    #[test]
    fn broken_store_degrades_to_ephemeral_tokens() {
        let anon = AnonymousIdStore::new(BrokenStore);
        let first = anon.get_or_create();
        let second = anon.get_or_create();
        assert!(is_current_format(first.as_str()));
        assert_ne!(first, second);
    }

    #[test]
    fn bare_legacy_id_is_returned_then_migrated() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::ANONYMOUS_KEY, "legacy-device-id").unwrap();
        let anon = AnonymousIdStore::new(Arc::clone(&store));

        assert_eq!(anon.get_or_create().as_str(), "legacy-device-id");
        assert!(anon.migrate_anonymous_id().unwrap());
        assert!(!anon.migrate_anonymous_id().unwrap());

        let migrated = anon.get_or_create();
        assert!(is_current_format(migrated.as_str()));
        assert_eq!(anon.get_or_create(), migrated);
    }

    #[test]
    fn migrate_without_id_is_noop() {
        let anon = AnonymousIdStore::new(MemoryStore::new());
        assert!(!anon.migrate_anonymous_id().unwrap());
    }
}
