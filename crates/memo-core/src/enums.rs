//! Auth methods, providers, tiers, and the session state machine.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! `SessionState` provides `allowed_next_states()` so the coordinator can
//! assert every transition it makes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::capability::CapabilitySet;
use crate::errors::IdentityError;

// ---------------------------------------------------------------------------
// AuthMethod
// ---------------------------------------------------------------------------

/// How an identity mapping was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Anonymous,
    Email,
    Wallet,
}

impl AuthMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Email => "email",
            Self::Wallet => "wallet",
        }
    }

    /// Email and wallet mappings are keyed by an external identifier;
    /// anonymous mappings are scoped to one store instead.
    #[must_use]
    pub const fn requires_external_id(self) -> bool {
        !matches!(self, Self::Anonymous)
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anonymous" => Ok(Self::Anonymous),
            "email" => Ok(Self::Email),
            "wallet" => Ok(Self::Wallet),
            other => Err(IdentityError::InvalidInput(format!(
                "unknown auth method '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderKind
// ---------------------------------------------------------------------------

/// The two external auth providers that can report a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Email,
    Wallet,
}

impl ProviderKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Wallet => "wallet",
        }
    }

    #[must_use]
    pub const fn auth_method(self) -> AuthMethod {
        match self {
            Self::Email => AuthMethod::Email,
            Self::Wallet => AuthMethod::Wallet,
        }
    }

    #[must_use]
    pub const fn tier(self) -> Tier {
        match self {
            Self::Email => Tier::Email,
            Self::Wallet => Tier::Wallet,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Coarse authentication level of a session.
///
/// Variant order is precedence order: `Wallet > Email > Anonymous`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Anonymous,
    Email,
    Wallet,
}

impl Tier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Email => "email",
            Self::Wallet => "wallet",
        }
    }

    #[must_use]
    pub const fn capabilities(self) -> CapabilitySet {
        CapabilitySet::for_tier(self)
    }

    #[must_use]
    pub const fn auth_method(self) -> AuthMethod {
        match self {
            Self::Anonymous => AuthMethod::Anonymous,
            Self::Email => AuthMethod::Email,
            Self::Wallet => AuthMethod::Wallet,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// State of the session coordinator.
///
/// ```text
/// uninitialized → anonymous | email_active | wallet_active
/// anonymous     → email_active | wallet_active
/// email_active  → wallet_active | anonymous
/// wallet_active → email_active | anonymous
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Anonymous,
    EmailActive,
    WalletActive,
}

impl SessionState {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Uninitialized => &[Self::Anonymous, Self::EmailActive, Self::WalletActive],
            Self::Anonymous => &[Self::EmailActive, Self::WalletActive],
            Self::EmailActive => &[Self::WalletActive, Self::Anonymous],
            Self::WalletActive => &[Self::EmailActive, Self::Anonymous],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// The tier in effect. An uninitialized session is gated like an
    /// anonymous one.
    #[must_use]
    pub const fn tier(self) -> Tier {
        match self {
            Self::Uninitialized | Self::Anonymous => Tier::Anonymous,
            Self::EmailActive => Tier::Email,
            Self::WalletActive => Tier::Wallet,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Anonymous => "anonymous",
            Self::EmailActive => "email_active",
            Self::WalletActive => "wallet_active",
        }
    }
}

impl From<Tier> for SessionState {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Anonymous => Self::Anonymous,
            Tier::Email => Self::EmailActive,
            Tier::Wallet => Self::WalletActive,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
