use memo_core::{AuthMethod, IdentityError, IdentityToken};

use crate::anonymous::AnonymousIdStore;
use crate::keys;
use crate::mapper::StableIdMapper;
use crate::store::KeyValueStore;

/// Outcome of [`IdentityService::run_migrations`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub wallet_mappings: usize,
    pub anonymous_id: bool,
}

/// Mapper and anonymous store sharing one backing store.
#[derive(Debug, Clone)]
pub struct IdentityService<S> {
    mapper: StableIdMapper<S>,
    anonymous: AnonymousIdStore<S>,
    store: S,
}

impl<S: KeyValueStore + Clone> IdentityService<S> {
    pub fn new(store: S) -> Self {
        Self {
            mapper: StableIdMapper::new(store.clone()),
            anonymous: AnonymousIdStore::new(store.clone()),
            store,
        }
    }
}

impl<S: KeyValueStore> IdentityService<S> {
    /// Resolve any auth method to its identity token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if an email or wallet resolution is missing its
    /// external id, and propagates mapper errors otherwise.
    pub fn resolve(
        &self,
        method: AuthMethod,
        external_id: Option<&str>,
    ) -> Result<IdentityToken, IdentityError> {
        if !method.requires_external_id() {
            return Ok(self.anonymous.get_or_create());
        }
        let external_id = external_id.ok_or_else(|| {
            IdentityError::InvalidInput(format!("{method} identity requires an external id"))
        })?;
        self.mapper.resolve(method, external_id)
    }

    pub const fn mapper(&self) -> &StableIdMapper<S> {
        &self.mapper
    }

    pub const fn anonymous(&self) -> &AnonymousIdStore<S> {
        &self.anonymous
    }

    /// Remove every mapping, redirect, and the anonymous id.
    ///
    /// Returns the number of keys removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be read or written.
    pub fn clear_all(&self) -> Result<usize, IdentityError> {
        let keys = self.store.keys(keys::ROOT_PREFIX)?;
        for key in &keys {
            self.store.remove(key)?;
        }
        tracing::info!(removed = keys.len(), "cleared identity mappings");
        Ok(keys.len())
    }

    /// Bring stored data up to the current token scheme.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be read or written.
    pub fn run_migrations(&self) -> Result<MigrationReport, IdentityError> {
        Ok(MigrationReport {
            wallet_mappings: self.mapper.migrate_wallet_mappings()?,
            anonymous_id: self.anonymous.migrate_anonymous_id()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn service() -> IdentityService<Arc<MemoryStore>> {
        IdentityService::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn anonymous_ignores_external_id() {
        let service = service();
        let a = service.resolve(AuthMethod::Anonymous, None).unwrap();
        let b = service.resolve(AuthMethod::Anonymous, Some("ignored")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_external_id_is_invalid() {
        for method in [AuthMethod::Email, AuthMethod::Wallet] {
            let error = service().resolve(method, None).unwrap_err();
            assert!(matches!(error, IdentityError::InvalidInput(_)), "{method}");
        }
    }

    #[test]
    fn clear_all_forgets_everything() {
        let service = service();
        let anon = service.resolve(AuthMethod::Anonymous, None).unwrap();
        let email = service.resolve(AuthMethod::Email, Some("user-9")).unwrap();
        service.resolve(AuthMethod::Wallet, Some("0xABCDEF0123456789")).unwrap();

        assert!(service.clear_all().unwrap() > 0);
        assert!(service.mapper().mappings().unwrap().is_empty());
        assert_ne!(service.resolve(AuthMethod::Anonymous, None).unwrap(), anon);
        assert_ne!(service.resolve(AuthMethod::Email, Some("user-9")).unwrap(), email);
    }

    #[test]
    fn migrations_on_clean_store_do_nothing() {
        let service = service();
        service.resolve(AuthMethod::Wallet, Some("0xABCDEF0123456789")).unwrap();
        assert_eq!(service.run_migrations().unwrap(), MigrationReport::default());
    }
}
