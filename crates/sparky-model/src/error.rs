//! Model error types.

use thiserror::Error;

use crate::realm::Realm;

/// Errors raised while building or mutating model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// An authority string that maps to no [`crate::UserRole`].
    #[error("unknown role authority: '{0}'")]
    UnknownRole(String),

    /// A realm name that maps to no [`Realm`].
    #[error("unknown realm: '{0}'")]
    UnknownRealm(String),

    /// The record's realm does not allow credential changes.
    #[error("credential of {realm} users cannot be changed")]
    ImmutableCredential {
        /// Realm of the rejected record.
        realm: Realm,
    },
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
