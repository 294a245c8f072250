//! Error types.
//!
//! [`IdentityError`] is the taxonomy of the identity layer. Construction
//! errors (`IdentityNotFound`, `MissingData`, `AmbiguousRole`,
//! `UnsupportedRealm`) are raised immediately; storage errors are converted
//! and propagated unchanged in meaning.
//!
//! [`AuthError`] covers login, token and account management on top of it.

use std::fmt;

use sparky_model::{ModelError, Realm};
use sparky_storage::StorageError;
use thiserror::Error;

/// Identity resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Principal present but without a resolvable username.
    #[error("identity not found: principal carries no username")]
    IdentityNotFound,

    /// Recognized principal or transfer object lacks required fields.
    #[error("missing data: {0}")]
    MissingData(String),

    /// Zero or several authorities; the role cannot be derived.
    #[error("cannot derive a role from {count} authorities, exactly one is required")]
    AmbiguousRole {
        /// Number of authorities found.
        count: usize,
    },

    /// Single authority that names no known role.
    #[error("unknown role authority: '{0}'")]
    InvalidRole(String),

    /// No factory registered for the realm.
    #[error("no user factory registered for realm {0}")]
    UnsupportedRealm(Realm),

    /// Attributes violate identity rules (for example an empty username).
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// Storage lookup found no record.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Backing store unreachable or failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Write violates `(username, realm)` uniqueness.
    #[error("user '{username}' already exists in realm {realm}")]
    UniquenessViolation {
        /// Conflicting username.
        username: String,
        /// Conflicting realm.
        realm: Realm,
    },

    /// Records of the realm are never written to a store.
    #[error("users of realm {0} cannot be stored")]
    NotPersistable(Realm),

    /// The record's credential cannot be replaced.
    #[error("credential of {0} users cannot be changed")]
    ImmutableCredential(Realm),
}

impl IdentityError {
    /// Creates a missing data error.
    #[must_use]
    pub fn missing_data(what: impl Into<String>) -> Self {
        Self::MissingData(what.into())
    }

    /// Checks whether a directory principal failing with this error may
    /// still be resolved from the store.
    #[must_use]
    pub const fn is_recoverable_by_refresh(&self) -> bool {
        matches!(
            self,
            Self::MissingData(_)
                | Self::AmbiguousRole { .. }
                | Self::InvalidRole(_)
                | Self::InvalidIdentity(_)
        )
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_))
    }
}

impl From<StorageError> for IdentityError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { username, realm } => {
                Self::UserNotFound(format!("'{username}' in realm {realm}"))
            }
            StorageError::NotFoundById(id) => Self::UserNotFound(format!("id {id}")),
            StorageError::Duplicate { username, realm } => {
                Self::UniquenessViolation { username, realm }
            }
            StorageError::NotPersistable(realm) => Self::NotPersistable(realm),
            StorageError::Unavailable(msg) => Self::StorageUnavailable(msg),
        }
    }
}

impl From<ModelError> for IdentityError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnknownRole(authority) => Self::InvalidRole(authority),
            ModelError::UnknownRealm(name) => Self::InvalidIdentity(format!("unknown realm '{name}'")),
            ModelError::ImmutableCredential { realm } => Self::ImmutableCredential(realm),
        }
    }
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Authentication and account management errors.
#[derive(Debug)]
pub enum AuthError {
    /// Username or password rejected.
    InvalidCredentials,
    /// Account is disabled.
    UserDisabled,
    /// Account passed its expiration time.
    UserExpired,
    /// Account is locked.
    UserLocked,
    /// New password rejected by the password policy.
    WeakPassword(String),
    /// Bearer token rejected.
    InvalidToken(String),
    /// Caller may not perform the operation.
    AccessDenied(String),
    /// Identity resolution failed.
    Identity(IdentityError),
    /// Internal error.
    Internal(String),
}

impl AuthError {
    /// Creates an access denied error.
    #[must_use]
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied(reason.into())
    }

    /// Returns the wrapped identity error, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&IdentityError> {
        match self {
            Self::Identity(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::UserDisabled => write!(f, "user account is disabled"),
            Self::UserExpired => write!(f, "user account has expired"),
            Self::UserLocked => write!(f, "user account is locked"),
            Self::WeakPassword(msg) => write!(f, "password rejected: {msg}"),
            Self::InvalidToken(msg) => write!(f, "invalid token: {msg}"),
            Self::AccessDenied(msg) => write!(f, "access denied: {msg}"),
            Self::Identity(err) => write!(f, "{err}"),
            Self::Internal(msg) => write!(f, "internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Identity(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        Self::Identity(err)
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::Identity(err.into())
    }
}

impl From<ModelError> for AuthError {
    fn from(err: ModelError) -> Self {
        Self::Identity(err.into())
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
