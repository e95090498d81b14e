//! Auth signals as reported by the providers.

use memo_core::ProviderKind;
use serde::{Deserialize, Serialize};

/// What one provider currently reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ProviderSignal {
    /// Confirmed session for `external_id` (email account id or wallet address).
    SignedIn { external_id: String },
    #[default]
    SignedOut,
    /// The provider is still working out its state.
    Loading,
    /// The provider failed to report; `reason` is for logs only.
    Failed { reason: String },
}

impl ProviderSignal {
    #[must_use]
    pub fn signed_in(external_id: impl Into<String>) -> Self {
        Self::SignedIn {
            external_id: external_id.into(),
        }
    }

    /// The confirmed external id, if this signal counts for precedence.
    ///
    /// Loading, failed, and blank sign-ins count as absent.
    #[must_use]
    pub fn confirmed_id(&self) -> Option<&str> {
        match self {
            Self::SignedIn { external_id } if !external_id.trim().is_empty() => {
                Some(external_id.as_str())
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.confirmed_id().is_some()
    }
}

/// Current signal from each provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSignals {
    pub email: ProviderSignal,
    pub wallet: ProviderSignal,
}

impl ActiveSignals {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn email(external_id: impl Into<String>) -> Self {
        Self {
            email: ProviderSignal::signed_in(external_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn wallet(address: impl Into<String>) -> Self {
        Self {
            wallet: ProviderSignal::signed_in(address),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with(mut self, provider: ProviderKind, signal: ProviderSignal) -> Self {
        *self.get_mut(provider) = signal;
        self
    }

    #[must_use]
    pub const fn get(&self, provider: ProviderKind) -> &ProviderSignal {
        match provider {
            ProviderKind::Email => &self.email,
            ProviderKind::Wallet => &self.wallet,
        }
    }

    pub fn get_mut(&mut self, provider: ProviderKind) -> &mut ProviderSignal {
        match provider {
            ProviderKind::Email => &mut self.email,
            ProviderKind::Wallet => &mut self.wallet,
        }
    }
}

/// One change notification from a provider.
///
/// `seq` increases monotonically per provider in emission order; the
/// coordinator ignores anything not newer than what it has already seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEvent {
    pub provider: ProviderKind,
    pub seq: u64,
    pub signal: ProviderSignal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_confirmed_sign_ins_are_valid() {
        assert!(ProviderSignal::signed_in("u1").is_valid());
        assert!(!ProviderSignal::signed_in("  ").is_valid());
        assert!(!ProviderSignal::SignedOut.is_valid());
        assert!(!ProviderSignal::Loading.is_valid());
        assert!(
            !ProviderSignal::Failed {
                reason: "timeout".into()
            }
            .is_valid()
        );
    }

    #[test]
    fn with_replaces_one_provider() {
        let signals = ActiveSignals::email("u1").with(ProviderKind::Wallet, ProviderSignal::Loading);
        assert_eq!(signals.email.confirmed_id(), Some("u1"));
        assert_eq!(signals.wallet, ProviderSignal::Loading);
    }

    #[test]
    fn signal_serializes_with_status_tag() {
        let json = serde_json::to_value(ProviderSignal::signed_in("u1")).unwrap();
        assert_eq!(json["status"], "signed_in");
        assert_eq!(json["external_id"], "u1");
    }
}
