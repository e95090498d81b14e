use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::capability::CapabilitySet;
use crate::enums::{SessionState, Tier};
use crate::identity::IdentityToken;

/// Point-in-time view of the resolved session.
///
/// Published by the session coordinator (the single writer) to every
/// subscriber. `tier` and `capabilities` are always derived from `state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Session {
    pub state: SessionState,
    pub tier: Tier,
    pub capabilities: CapabilitySet,
    /// `None` only while uninitialized.
    pub token: Option<IdentityToken>,
    /// Email account id or normalized wallet address backing `token`.
    pub external_id: Option<String>,
    /// Bumped on every published change.
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn uninitialized() -> Self {
        Self::new(SessionState::Uninitialized, None, None, 0)
    }

    #[must_use]
    pub fn new(
        state: SessionState,
        token: Option<IdentityToken>,
        external_id: Option<String>,
        revision: u64,
    ) -> Self {
        let tier = state.tier();
        Self {
            state,
            tier,
            capabilities: tier.capabilities(),
            token,
            external_id,
            revision,
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(
            self.state,
            SessionState::EmailActive | SessionState::WalletActive
        )
    }
}
