//! Storage error types.

use sparky_model::Realm;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No record with the given key.
    #[error("User not found: '{username}' in realm {realm}")]
    NotFound {
        /// Requested username.
        username: String,
        /// Requested realm.
        realm: Realm,
    },

    /// No record with the given identifier.
    #[error("User not found: id {0}")]
    NotFoundById(i64),

    /// A different record already holds the key.
    #[error("Duplicate user: '{username}' already exists in realm {realm}")]
    Duplicate {
        /// Conflicting username.
        username: String,
        /// Conflicting realm.
        realm: Realm,
    },

    /// The record's realm is never stored.
    #[error("Users of realm {0} cannot be stored")]
    NotPersistable(Realm),

    /// Backing store unreachable or failed.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Creates a not found error for a key.
    #[must_use]
    pub fn not_found(username: impl Into<String>, realm: Realm) -> Self {
        Self::NotFound {
            username: username.into(),
            realm,
        }
    }

    /// Creates a duplicate error for a key.
    #[must_use]
    pub fn duplicate(username: impl Into<String>, realm: Realm) -> Self {
        Self::Duplicate {
            username: username.into(),
            realm,
        }
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NotFoundById(_))
    }

    /// Checks if this is a duplicate error.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
