//! # memo-identity
//!
//! Identity token resolution for Memoreee.
//!
//! - [`StableIdMapper`]: email and wallet identifiers to stable tokens
//!   (wallet tokens derived, email tokens persisted)
//! - [`AnonymousIdStore`]: one local token per store for unauthenticated users
//! - [`KeyValueStore`]: the storage seam, with [`FileStore`] and [`MemoryStore`]
//! - [`IdentityService`]: both of the above over one shared store

pub mod anonymous;
pub mod error;
pub mod keys;
pub mod mapper;
pub mod service;
pub mod store;
mod write_lock;

pub use anonymous::{AnonymousIdStore, generate_anonymous_token};
pub use error::StoreError;
pub use mapper::{StableIdMapper, wallet_token};
pub use service::{IdentityService, MigrationReport};
pub use store::{FileStore, KeyValueStore, MemoryStore, open_store};
