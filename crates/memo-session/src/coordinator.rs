//! Session change coordinator.
//!
//! The coordinator is the only writer of the current [`Session`]. Readers
//! subscribe through a watch channel and always observe a complete session:
//! the state, tier, capabilities, and token are swapped in one publish.
//!
//! Re-entrancy is handled per provider. Every accepted event bumps the
//! provider's ticket; a resolution that finishes after its ticket moved on
//! is dropped, so the latest notification always wins.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use memo_config::SessionConfig;
use memo_core::{
    IdentityError, IdentityToken, ProviderKind, Session, SessionState, Tier, WalletAddress,
};
use memo_identity::{IdentityService, KeyValueStore, generate_anonymous_token};
use tokio::sync::{mpsc, watch};

use crate::provider::{EmailAuthProvider, ProviderError, WalletAuthProvider};
use crate::signal::{ActiveSignals, ProviderEvent, ProviderSignal};
use crate::tier::resolve_tier;

/// A provider session that has been resolved to an identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Confirmed {
    external_id: String,
    token: IdentityToken,
}

#[derive(Debug, Default)]
struct ProviderSlot {
    /// Highest event sequence number accepted from this provider.
    last_seq: u64,
    /// Bumped on every accepted event and sign-out.
    ticket: u64,
    confirmed: Option<Confirmed>,
}

impl ProviderSlot {
    fn signal(&self) -> ProviderSignal {
        self.confirmed
            .as_ref()
            .map_or(ProviderSignal::SignedOut, |c| {
                ProviderSignal::signed_in(c.external_id.clone())
            })
    }
}

#[derive(Debug, Default)]
struct Inner {
    email: ProviderSlot,
    wallet: ProviderSlot,
    /// This device's anonymous token, fetched once.
    anonymous: Option<IdentityToken>,
}

impl Inner {
    fn slot_mut(&mut self, provider: ProviderKind) -> &mut ProviderSlot {
        match provider {
            ProviderKind::Email => &mut self.email,
            ProviderKind::Wallet => &mut self.wallet,
        }
    }
}

pub struct SessionCoordinator<W, E, S> {
    wallet: W,
    email: E,
    identity: Arc<IdentityService<S>>,
    probe_timeout: Duration,
    inner: Mutex<Inner>,
    session_tx: watch::Sender<Session>,
}

impl<W, E, S> SessionCoordinator<W, E, S>
where
    W: WalletAuthProvider,
    E: EmailAuthProvider,
    S: KeyValueStore + 'static,
{
    pub fn new(wallet: W, email: E, identity: IdentityService<S>) -> Self {
        let (session_tx, _) = watch::channel(Session::uninitialized());
        Self {
            wallet,
            email,
            identity: Arc::new(identity),
            probe_timeout: SessionConfig::default().probe_timeout(),
            inner: Mutex::new(Inner::default()),
            session_tx,
        }
    }

    pub fn from_config(
        wallet: W,
        email: E,
        identity: IdentityService<S>,
        config: &SessionConfig,
    ) -> Self {
        Self::new(wallet, email, identity).with_probe_timeout(config.probe_timeout())
    }

    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session_tx.borrow().clone()
    }

    /// Receive every published session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session_tx.subscribe()
    }

    /// Probe the wallet provider, then the email provider, and settle.
    ///
    /// A provider that already delivered an event while its probe was in
    /// flight keeps the event's answer.
    ///
    /// # Errors
    ///
    /// Returns `ProviderUnavailable` when no provider confirmed a session and
    /// at least one probe failed or timed out; the coordinator then stays
    /// uninitialized rather than guess anonymous. A malformed wallet address
    /// counts as a failed wallet probe.
    pub async fn initialize(&self) -> Result<Session, IdentityError> {
        let wallet = match self
            .probe(ProviderKind::Wallet, self.wallet.current_user())
            .await
        {
            Ok(user) => match user.active_address() {
                Some(address) => self.confirm(ProviderKind::Wallet, address).await.map(Some),
                None => Ok(None),
            },
            Err(error) => Err(error),
        };

        let email = match self
            .probe(ProviderKind::Email, self.email.get_session())
            .await
        {
            Ok(Some(session)) => self
                .confirm(ProviderKind::Email, &session.account_id)
                .await
                .map(Some),
            Ok(None) => Ok(None),
            Err(error) => Err(error),
        };

        self.ensure_anonymous().await;

        let uninitialized = self.session().state == SessionState::Uninitialized;
        let mut inner = self.lock();
        let mut failure = None;
        for (provider, outcome) in [(ProviderKind::Wallet, wallet), (ProviderKind::Email, email)] {
            match outcome {
                Ok(confirmed) => {
                    let slot = inner.slot_mut(provider);
                    if slot.last_seq == 0 {
                        slot.confirmed = confirmed;
                    }
                }
                Err(error) => {
                    tracing::warn!(%provider, %error, "startup probe failed");
                    failure.get_or_insert(error);
                }
            }
        }

        let confirmed_any = inner.wallet.confirmed.is_some() || inner.email.confirmed.is_some();
        if !confirmed_any
            && uninitialized
            && let Some(error) = failure
        {
            return Err(error);
        }
        Ok(self.settle(&mut inner))
    }

    /// Apply one provider notification.
    ///
    /// Events not newer than the last accepted one from the same provider
    /// are ignored. Loading leaves the session alone.
    ///
    /// # Errors
    ///
    /// Returns the failure for a `Failed` signal or a sign-in that could not
    /// be resolved. The previously confirmed session stays in effect.
    pub async fn handle(&self, event: ProviderEvent) -> Result<Session, IdentityError> {
        let ProviderEvent {
            provider,
            seq,
            signal,
        } = event;

        let ticket = {
            let mut inner = self.lock();
            let slot = inner.slot_mut(provider);
            if seq <= slot.last_seq {
                tracing::debug!(%provider, seq, last = slot.last_seq, "ignoring out-of-order event");
                return Ok(self.session());
            }
            slot.last_seq = seq;
            slot.ticket += 1;
            slot.ticket
        };

        match signal {
            ProviderSignal::Loading => Ok(self.session()),
            ProviderSignal::Failed { reason } => {
                tracing::warn!(%provider, seq, %reason, "provider reported failure; keeping current session");
                Err(IdentityError::provider(provider, reason))
            }
            ProviderSignal::SignedOut => {
                self.ensure_anonymous().await;
                let mut inner = self.lock();
                let slot = inner.slot_mut(provider);
                if slot.ticket != ticket {
                    return Ok(self.session());
                }
                slot.confirmed = None;
                Ok(self.settle(&mut inner))
            }
            ProviderSignal::SignedIn { external_id } => {
                let confirmed = match self.confirm(provider, &external_id).await {
                    Ok(confirmed) => confirmed,
                    Err(error) => {
                        tracing::warn!(%provider, seq, %error, "sign-in not applied; keeping current session");
                        return Err(error);
                    }
                };
                let mut inner = self.lock();
                let slot = inner.slot_mut(provider);
                if slot.ticket != ticket {
                    tracing::debug!(%provider, seq, "discarding superseded resolution");
                    return Ok(self.session());
                }
                slot.confirmed = Some(confirmed);
                Ok(self.settle(&mut inner))
            }
        }
    }

    /// Sign out of the provider that backs the current tier.
    ///
    /// Signing out of the wallet falls back to an active email session. A
    /// no-op when nothing is signed in.
    ///
    /// # Errors
    ///
    /// Returns `ProviderUnavailable` if the provider refuses; the session is
    /// left unchanged.
    pub async fn sign_out(&self) -> Result<Session, IdentityError> {
        let provider = match self.session().state {
            SessionState::WalletActive => ProviderKind::Wallet,
            SessionState::EmailActive => ProviderKind::Email,
            SessionState::Anonymous | SessionState::Uninitialized => return Ok(self.session()),
        };

        let outcome = match provider {
            ProviderKind::Wallet => self.wallet.sign_out().await,
            ProviderKind::Email => self.email.sign_out().await,
        };
        if let Err(ProviderError(reason)) = outcome {
            tracing::warn!(%provider, %reason, "sign-out failed; keeping current session");
            return Err(IdentityError::provider(provider, reason));
        }

        self.ensure_anonymous().await;
        let mut inner = self.lock();
        let slot = inner.slot_mut(provider);
        slot.confirmed = None;
        slot.ticket += 1;
        Ok(self.settle(&mut inner))
    }

    /// Apply events in arrival order until every sender is dropped.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<ProviderEvent>) {
        while let Some(event) = events.recv().await {
            let (provider, seq) = (event.provider, event.seq);
            if let Err(error) = self.handle(event).await {
                tracing::debug!(%provider, seq, %error, "event left session unchanged");
            }
        }
        tracing::debug!("provider event channel closed");
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn probe<T>(
        &self,
        provider: ProviderKind,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, IdentityError> {
        match tokio::time::timeout(self.probe_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(ProviderError(reason))) => Err(IdentityError::provider(provider, reason)),
            Err(_) => Err(IdentityError::provider(
                provider,
                format!("no answer within {}ms", self.probe_timeout.as_millis()),
            )),
        }
    }

    /// Resolve a provider's external id to a token off the async runtime.
    async fn confirm(
        &self,
        provider: ProviderKind,
        external_id: &str,
    ) -> Result<Confirmed, IdentityError> {
        let external_id = match provider {
            ProviderKind::Wallet => WalletAddress::parse(external_id)?.to_string(),
            ProviderKind::Email => external_id.trim().to_string(),
        };
        let identity = Arc::clone(&self.identity);
        tokio::task::spawn_blocking(move || {
            let token = identity.resolve(provider.auth_method(), Some(&external_id))?;
            Ok::<_, IdentityError>(Confirmed { external_id, token })
        })
        .await
        .map_err(|e| IdentityError::StorageUnavailable(format!("resolution task failed: {e}")))?
    }

    async fn ensure_anonymous(&self) -> IdentityToken {
        let cached = self.lock().anonymous.clone();
        if let Some(token) = cached {
            return token;
        }

        let identity = Arc::clone(&self.identity);
        let token = tokio::task::spawn_blocking(move || identity.anonymous().get_or_create())
            .await
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "anonymous lookup task failed; using ephemeral identity");
                generate_anonymous_token()
            });
        self.lock().anonymous.get_or_insert(token).clone()
    }

    /// Recompute the tier from the confirmed slots and publish if anything
    /// changed. Must be called with the state lock held.
    fn settle(&self, inner: &mut Inner) -> Session {
        let signals = ActiveSignals {
            email: inner.email.signal(),
            wallet: inner.wallet.signal(),
        };
        let (tier, _) = resolve_tier(&signals);
        let next = SessionState::from(tier);

        let (token, external_id) = match tier {
            Tier::Wallet => Self::token_of(&inner.wallet),
            Tier::Email => Self::token_of(&inner.email),
            Tier::Anonymous => {
                let token = inner
                    .anonymous
                    .get_or_insert_with(generate_anonymous_token)
                    .clone();
                (Some(token), None)
            }
        };

        let current = self.session();
        if current.state == next && current.token == token && current.external_id == external_id {
            return current;
        }

        if current.state != next {
            debug_assert!(
                current.state.can_transition_to(next),
                "illegal transition {} -> {next}",
                current.state
            );
            tracing::info!(from = %current.state, to = %next, "session transition");
        }

        let session = Session::new(next, token, external_id, current.revision + 1);
        self.session_tx.send_replace(session.clone());
        session
    }

    fn token_of(slot: &ProviderSlot) -> (Option<IdentityToken>, Option<String>) {
        slot.confirmed.as_ref().map_or((None, None), |c| {
            (Some(c.token.clone()), Some(c.external_id.clone()))
        })
    }
}
