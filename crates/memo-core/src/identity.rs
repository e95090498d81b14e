use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::enums::AuthMethod;
use crate::errors::IdentityError;

/// Stable internal identifier for one logical user.
///
/// Wallet and email tokens are UUID strings; anonymous tokens use the
/// `anonymous_<millis>_<suffix>` shape and are only meaningful inside the
/// store that issued them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct IdentityToken(String);

impl IdentityToken {
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidInput` if `value` is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(IdentityError::InvalidInput(
                "identity token must not be empty".into(),
            ));
        }
        Ok(Self(value))
    }

    /// `anonymous_<millis>_<suffix>`.
    #[must_use]
    pub fn anonymous(millis: i64, suffix: &str) -> Self {
        Self(format!("anonymous_{millis}_{suffix}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<Uuid> for IdentityToken {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.hyphenated().to_string())
    }
}

impl AsRef<str> for IdentityToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One persisted `(auth method, external id) -> token` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IdentityMapping {
    pub token: IdentityToken,
    pub auth_method: AuthMethod,
    /// Absent only for anonymous mappings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl IdentityMapping {
    #[must_use]
    pub fn anonymous(token: IdentityToken) -> Self {
        Self {
            token,
            auth_method: AuthMethod::Anonymous,
            external_id: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn external(
        auth_method: AuthMethod,
        external_id: impl Into<String>,
        token: IdentityToken,
    ) -> Self {
        Self {
            token,
            auth_method,
            external_id: Some(external_id.into()),
            created_at: Utc::now(),
        }
    }
}

/// Wallet address family, detected from the address shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    /// Flow account address: 8 bytes, 16 hex chars, `0x` optional.
    Cadence,
    /// EVM address: 20 bytes, `0x` followed by 40 hex chars.
    Evm,
}

impl WalletKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cadence => "cadence",
            Self::Evm => "evm",
        }
    }
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, normalized wallet address.
///
/// Normalized form is lowercase hex without the `0x` prefix, so
/// `0xABCDEF0123456789` and `abcdef0123456789` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletAddress {
    kind: WalletKind,
    normalized: String,
}

impl WalletAddress {
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidInput` if the address is empty or is
    /// neither a Flow nor an EVM address.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::InvalidInput(
                "wallet address must not be empty".into(),
            ));
        }

        let lower = trimmed.to_ascii_lowercase();
        let (prefixed, hex) = match lower.strip_prefix("0x") {
            Some(rest) => (true, rest),
            None => (false, lower.as_str()),
        };

        if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            let kind = match hex.len() {
                16 => Some(WalletKind::Cadence),
                40 if prefixed => Some(WalletKind::Evm),
                _ => None,
            };
            if let Some(kind) = kind {
                return Ok(Self {
                    kind,
                    normalized: hex.to_string(),
                });
            }
        }

        Err(IdentityError::InvalidInput(format!(
            "malformed wallet address '{trimmed}'"
        )))
    }

    #[must_use]
    pub const fn kind(&self) -> WalletKind {
        self.kind
    }

    /// Lowercase hex, no prefix.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.normalized)
    }
}
