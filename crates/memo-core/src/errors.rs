//! Cross-cutting error types for identity resolution.
//!
//! Every failure that leaves a Memoreee crate is folded into one of three
//! kinds. Crate-local errors (e.g. `StoreError`) convert into these at the
//! boundary where the external collaborator is invoked.

use thiserror::Error;

use crate::enums::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// A required external identifier is missing, empty, or malformed.
    /// Caller bug; never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An auth provider probe or notification failed. Safe to retry; the
    /// previously confirmed session stays in effect.
    #[error("{provider} provider unavailable: {reason}")]
    ProviderUnavailable {
        provider: ProviderKind,
        reason: String,
    },

    /// The persistent mapping store cannot be read or written.
    #[error("identity storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl IdentityError {
    #[must_use]
    pub fn provider(provider: ProviderKind, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider,
            reason: reason.into(),
        }
    }

    /// Whether the failed operation may succeed if attempted again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_names_the_provider() {
        let error = IdentityError::provider(ProviderKind::Wallet, "timed out");
        assert_eq!(error.to_string(), "wallet provider unavailable: timed out");
    }

    #[test]
    fn invalid_input_is_not_retryable() {
        assert!(!IdentityError::InvalidInput("empty".into()).is_retryable());
        assert!(IdentityError::StorageUnavailable("disk".into()).is_retryable());
        assert!(IdentityError::provider(ProviderKind::Email, "down").is_retryable());
    }
}
