//! # sparky-model
//!
//! Identity model for the sparkyservice user backend.
//!
//! A user lives in exactly one [`Realm`], the identity source that owns its
//! authoritative record:
//!
//! | Realm | Source | Credential | Persisted |
//! |-------|--------|------------|-----------|
//! | `LOCAL` | user store | always | yes |
//! | `LDAP` | directory | never | mirrored |
//! | `MEMORY` | process configuration | immutable | no |
//! | `UNKNOWN` | best-effort placeholder | never | no |
//!
//! Every record is a [`UserRecord`]; its capability set (enabled, expired,
//! locked, credential handling, persistence) is selected by the
//! [`UserVariant`] derived from realm and role.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod credential;
pub mod dto;
pub mod error;
pub mod profile;
pub mod realm;
pub mod role;
pub mod user;

pub use credential::{Credential, HashAlgorithm};
pub use dto::{ChangePasswordDto, NewUserDto, ProfileSettingsDto, UserDto};
pub use error::{ModelError, ModelResult};
pub use profile::ProfileSettings;
pub use realm::Realm;
pub use role::UserRole;
pub use user::{UserRecord, UserVariant};
