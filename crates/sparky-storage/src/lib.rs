//! # sparky-storage
//!
//! Persistence contract for user records.
//!
//! The identity layer treats storage as a keyed lookup service: every
//! operation is a single synchronous call on exact, case-sensitive keys.
//! Concurrent writes to the same `(username, realm)` key are serialized by
//! the store; a lost race surfaces as [`StorageError::Duplicate`].
//!
//! - [`UserStore`] - the contract
//! - [`InMemoryUserStore`] - process-local implementation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod user;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryUserStore;
pub use user::UserStore;
