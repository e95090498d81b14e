//! # memo-core
//!
//! Core types and error taxonomy for Memoreee identity resolution.
//!
//! This crate provides the types shared across all Memoreee crates:
//! - Auth methods, tiers, and the session state machine
//! - Fixed per-tier capability sets
//! - Identity tokens, identity mappings, and wallet address parsing
//! - The session snapshot published to readers
//! - The cross-crate `IdentityError` taxonomy

pub mod capability;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod session;

pub use capability::{CapabilitySet, DifficultyCeiling};
pub use enums::{AuthMethod, ProviderKind, SessionState, Tier};
pub use errors::IdentityError;
pub use identity::{IdentityMapping, IdentityToken, WalletAddress, WalletKind};
pub use session::Session;
