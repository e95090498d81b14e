//! Stable identifier mapper: `(auth method, external id) -> identity token`.
//!
//! Wallet tokens are a pure function of the address, so every deployment
//! derives the same token without sharing storage. Email tokens are looked up
//! in, and persisted to, the local store; without a working store the email
//! path fails rather than hand out a token it cannot reproduce.

use memo_core::{AuthMethod, IdentityError, IdentityMapping, IdentityToken, WalletAddress};
use uuid::Uuid;

use crate::error::StoreError;
use crate::keys;
use crate::store::KeyValueStore;

/// Namespace for wallet-derived v5 UUIDs. Changing it re-keys every wallet user.
const WALLET_NAMESPACE: Uuid = Uuid::from_u128(0x6d65_6d6f_7265_6565_9a3d_6e0f_1c2b_4a58);

/// Bound on redirect chains, guards against a cycle written by hand.
const MAX_REDIRECT_HOPS: usize = 8;

/// Deterministic token for a wallet address.
///
/// v5 UUID over `"<kind>:<normalized address>"`; casing and the `0x` prefix
/// do not affect the result.
#[must_use]
pub fn wallet_token(address: &WalletAddress) -> IdentityToken {
    let seed = format!("{}:{}", address.kind(), address.normalized());
    Uuid::new_v5(&WALLET_NAMESPACE, seed.as_bytes()).into()
}

/// `account_id` as a UUID, only when it is already in canonical hyphenated
/// form. Simple, braced, and URN forms are treated as opaque ids.
fn adoptable_uuid(account_id: &str) -> Option<Uuid> {
    Uuid::try_parse(account_id)
        .ok()
        .filter(|uuid| uuid.hyphenated().to_string() == account_id.to_ascii_lowercase())
}

#[derive(Debug, Clone)]
pub struct StableIdMapper<S> {
    store: S,
}

impl<S: KeyValueStore> StableIdMapper<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve an external identifier to its identity token.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `external_id` is empty or malformed, or `method`
    ///   is anonymous (anonymous ids come from `AnonymousIdStore`).
    /// - `StorageUnavailable` if an email mapping cannot be read or persisted.
    pub fn resolve(
        &self,
        method: AuthMethod,
        external_id: &str,
    ) -> Result<IdentityToken, IdentityError> {
        match method {
            AuthMethod::Wallet => self.resolve_wallet(external_id),
            AuthMethod::Email => self.resolve_email(external_id),
            AuthMethod::Anonymous => Err(IdentityError::InvalidInput(
                "anonymous identities are not keyed by an external id".into(),
            )),
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty or malformed address. Storage
    /// failures are logged and never fail the call.
    pub fn resolve_wallet(&self, address: &str) -> Result<IdentityToken, IdentityError> {
        let address = WalletAddress::parse(address)?;
        let token = wallet_token(&address);

        if let Err(error) = self.record_wallet(&address, &token) {
            tracing::warn!(%error, "wallet mapping not recorded; token is unaffected");
        }

        tracing::debug!(kind = %address.kind(), %token, "resolved wallet identity");
        Ok(token)
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty id and `StorageUnavailable` when the
    /// mapping cannot be read or persisted.
    pub fn resolve_email(&self, account_id: &str) -> Result<IdentityToken, IdentityError> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(IdentityError::InvalidInput(
                "email account id must not be empty".into(),
            ));
        }

        let key = keys::mapping(AuthMethod::Email, account_id);
        if let Some(existing) = self.load_mapping(&key)? {
            let token = self.canonical(&existing.token)?;
            tracing::debug!(%token, "found existing email mapping");
            return Ok(token);
        }

        // Account ids issued by the email provider are already UUIDs; adopt them.
        let token: IdentityToken = adoptable_uuid(account_id)
            .unwrap_or_else(Uuid::new_v4)
            .into();
        let mapping = IdentityMapping::external(AuthMethod::Email, account_id, token.clone());
        self.write_mapping(&key, &mapping)?;

        tracing::info!(auth_method = "email", %token, "created identity mapping");
        Ok(token)
    }

    /// Follow superseded-token redirects to the canonical token.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if a redirect cannot be read.
    pub fn canonical(&self, token: &IdentityToken) -> Result<IdentityToken, IdentityError> {
        let mut current = token.clone();
        for _ in 0..MAX_REDIRECT_HOPS {
            match self.store.get(&keys::redirect(&current))? {
                Some(next) => current = IdentityToken::new(next)?,
                None => return Ok(current),
            }
        }
        tracing::warn!(%token, "redirect chain too long; using last hop");
        Ok(current)
    }

    /// Mapping record for a token, after following redirects.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be read.
    pub fn user_info(
        &self,
        token: &IdentityToken,
    ) -> Result<Option<IdentityMapping>, IdentityError> {
        let token = self.canonical(token)?;
        Ok(self.load_mapping(&keys::token_index(&token))?)
    }

    /// Every email and wallet mapping in the store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be read.
    pub fn mappings(&self) -> Result<Vec<IdentityMapping>, IdentityError> {
        let mut mappings = Vec::new();
        for key in self.store.keys(keys::MAPPING_PREFIX)? {
            match self.load_mapping(&key) {
                Ok(Some(mapping)) => mappings.push(mapping),
                Ok(None) => {}
                Err(error) => tracing::warn!(%error, %key, "skipping unreadable mapping"),
            }
        }
        mappings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(mappings)
    }

    /// Rewrite wallet mappings whose token is not the deterministic one.
    ///
    /// Each rewritten mapping leaves a redirect from the old token so that
    /// anything still holding it resolves to the canonical token. Returns the
    /// number of mappings migrated.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if the store cannot be read or written.
    pub fn migrate_wallet_mappings(&self) -> Result<usize, IdentityError> {
        let prefix = keys::mapping(AuthMethod::Wallet, "");
        let mut migrated = 0;

        for key in self.store.keys(&prefix)? {
            let Some(mapping) = self.load_mapping(&key)? else {
                continue;
            };
            let Some(address) = mapping
                .external_id
                .as_deref()
                .and_then(|raw| WalletAddress::parse(raw).ok())
            else {
                tracing::warn!(%key, "wallet mapping has no valid address; left as is");
                continue;
            };

            let canonical = wallet_token(&address);
            if mapping.token == canonical {
                continue;
            }

            let old = mapping.token.clone();
            let updated = IdentityMapping {
                token: canonical.clone(),
                ..mapping
            };
            self.write_mapping(&key, &updated)?;
            self.store.remove(&keys::token_index(&old))?;
            self.store.set(&keys::redirect(&old), canonical.as_str())?;
            tracing::debug!(%old, new = %canonical, "migrated wallet mapping");
            migrated += 1;
        }

        if migrated > 0 {
            tracing::info!(migrated, "migrated wallet mappings to deterministic tokens");
        }
        Ok(migrated)
    }

    fn record_wallet(
        &self,
        address: &WalletAddress,
        token: &IdentityToken,
    ) -> Result<(), StoreError> {
        let key = keys::mapping(AuthMethod::Wallet, address.normalized());
        if self.store.get(&key)?.is_some() {
            return Ok(());
        }
        let mapping = IdentityMapping::external(AuthMethod::Wallet, address.normalized(), token.clone());
        self.write_mapping(&key, &mapping)?;
        tracing::info!(auth_method = "wallet", %token, "recorded identity mapping");
        Ok(())
    }

    fn load_mapping(&self, key: &str) -> Result<Option<IdentityMapping>, StoreError> {
        self.store
            .get(key)?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StoreError::from)
    }

    fn write_mapping(&self, key: &str, mapping: &IdentityMapping) -> Result<(), StoreError> {
        let json = serde_json::to_string(mapping)?;
        self.store.set(key, &json)?;
        self.store.set(&keys::token_index(&mapping.token), &json)
    }
}
