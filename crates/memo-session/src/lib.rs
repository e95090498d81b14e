//! # memo-session
//!
//! Turns auth provider signals into the current [`memo_core::Session`].
//!
//! - [`resolve_tier`]: pure precedence rule, wallet over email over anonymous
//! - [`SessionCoordinator`]: single writer of the session, fed by startup
//!   probes and ordered provider events
//! - [`provider`]: the email and wallet provider seams plus the event sink

pub mod coordinator;
pub mod provider;
pub mod signal;
pub mod tier;

pub use coordinator::SessionCoordinator;
pub use provider::{
    EmailAuthProvider, EmailSession, EventSink, ProviderError, StaticEmailProvider,
    StaticWalletProvider, WalletAuthProvider, WalletUser, event_channel,
};
pub use signal::{ActiveSignals, ProviderEvent, ProviderSignal};
pub use tier::resolve_tier;
