//! External auth provider seams.
//!
//! Providers are probed on startup and push change notifications through an
//! [`EventSink`]. Each notification is stamped with a per-provider sequence
//! number at emission time.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use memo_core::ProviderKind;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::signal::{ProviderEvent, ProviderSignal};

/// A provider call failed (network, misconfiguration, SDK error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// Session reported by the email auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSession {
    pub account_id: String,
    pub email: Option<String>,
}

/// Current user reported by the wallet auth provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletUser {
    pub logged_in: bool,
    pub address: Option<String>,
}

impl WalletUser {
    #[must_use]
    pub fn logged_in(address: impl Into<String>) -> Self {
        Self {
            logged_in: true,
            address: Some(address.into()),
        }
    }

    /// The address, only when the user is logged in with a non-empty one.
    #[must_use]
    pub fn active_address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .filter(|addr| self.logged_in && !addr.trim().is_empty())
    }
}

pub trait EmailAuthProvider: Send + Sync {
    fn get_session(
        &self,
    ) -> impl Future<Output = Result<Option<EmailSession>, ProviderError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

pub trait WalletAuthProvider: Send + Sync {
    fn current_user(&self) -> impl Future<Output = Result<WalletUser, ProviderError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

// ---------------------------------------------------------------------------
// Event plumbing
// ---------------------------------------------------------------------------

/// Create the notification channel between providers and the coordinator.
#[must_use]
pub fn event_channel() -> (EventSink, mpsc::UnboundedReceiver<ProviderEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = EventSink {
        tx,
        email_seq: Arc::new(AtomicU64::new(0)),
        wallet_seq: Arc::new(AtomicU64::new(0)),
    };
    (sink, rx)
}

/// Cloneable sender that provider adapters report changes through.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ProviderEvent>,
    email_seq: Arc<AtomicU64>,
    wallet_seq: Arc<AtomicU64>,
}

impl EventSink {
    /// Stamp and send a notification. Returns the assigned sequence number.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the coordinator side has been dropped.
    pub fn emit(&self, provider: ProviderKind, signal: ProviderSignal) -> Result<u64, ProviderError> {
        let counter = match provider {
            ProviderKind::Email => &self.email_seq,
            ProviderKind::Wallet => &self.wallet_seq,
        };
        let seq = counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx
            .send(ProviderEvent {
                provider,
                seq,
                signal,
            })
            .map_err(|_| ProviderError("session coordinator is gone".into()))?;
        Ok(seq)
    }
}

// ---------------------------------------------------------------------------
// Static providers
// ---------------------------------------------------------------------------

/// Email provider with a fixed answer. For offline tools and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEmailProvider {
    session: Option<EmailSession>,
}

impl StaticEmailProvider {
    #[must_use]
    pub fn signed_in(account_id: impl Into<String>) -> Self {
        Self {
            session: Some(EmailSession {
                account_id: account_id.into(),
                email: None,
            }),
        }
    }

    #[must_use]
    pub const fn signed_out() -> Self {
        Self { session: None }
    }
}

impl EmailAuthProvider for StaticEmailProvider {
    async fn get_session(&self) -> Result<Option<EmailSession>, ProviderError> {
        Ok(self.session.clone())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Wallet provider with a fixed answer. For offline tools and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticWalletProvider {
    user: WalletUser,
}

impl StaticWalletProvider {
    #[must_use]
    pub fn logged_in(address: impl Into<String>) -> Self {
        Self {
            user: WalletUser::logged_in(address),
        }
    }

    #[must_use]
    pub fn logged_out() -> Self {
        Self::default()
    }
}

impl WalletAuthProvider for StaticWalletProvider {
    async fn current_user(&self) -> Result<WalletUser, ProviderError> {
        Ok(self.user.clone())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn active_address_requires_login() {
        assert_eq!(WalletUser::logged_in("0xabc").active_address(), Some("0xabc"));
        let stale = WalletUser {
            logged_in: false,
            address: Some("0xabc".into()),
        };
        assert_eq!(stale.active_address(), None);
        assert_eq!(WalletUser::logged_in(" ").active_address(), None);
    }

    #[tokio::test]
    async fn sink_numbers_each_provider_independently() {
        let (sink, mut rx) = event_channel();
        assert_eq!(sink.emit(ProviderKind::Email, ProviderSignal::Loading).unwrap(), 1);
        assert_eq!(sink.emit(ProviderKind::Wallet, ProviderSignal::Loading).unwrap(), 1);
        assert_eq!(sink.clone().emit(ProviderKind::Email, ProviderSignal::SignedOut).unwrap(), 2);

        let first = rx.recv().await.unwrap();
        assert_eq!((first.provider, first.seq), (ProviderKind::Email, 1));
        let second = rx.recv().await.unwrap();
        assert_eq!((second.provider, second.seq), (ProviderKind::Wallet, 1));
        let third = rx.recv().await.unwrap();
        assert_eq!((third.provider, third.seq), (ProviderKind::Email, 2));
    }

    #[test]
    fn emit_fails_when_receiver_dropped() {
        let (sink, rx) = event_channel();
        drop(rx);
        assert!(sink.emit(ProviderKind::Wallet, ProviderSignal::SignedOut).is_err());
    }
}
