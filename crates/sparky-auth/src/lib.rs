//! # sparky-auth
//!
//! Identity resolution and authentication for sparkyservice.
//!
//! The heart of this crate is the [`IdentityExtractor`], which turns an
//! authenticated [`Principal`] of any recognized shape into a canonical
//! [`sparky_model::UserRecord`]:
//!
//! 1. [`IdentityExtractor::extract_lightweight`] - no I/O
//! 2. [`IdentityExtractor::extract_with_refresh`] - at most one store read
//!    plus the cross-realm fallback
//! 3. [`IdentityExtractor::extract_from_authentication_context`] - raw
//!    username/credential/authorities from a verified token
//! 4. [`IdentityExtractor::extract_from_transfer_object`] - store lookup by
//!    the identity carried in a transfer object
//! 5. [`IdentityExtractor::extract_polymorphic`] - dispatch over all shapes
//!
//! Records are built through the realm-indexed [`FactoryRegistry`].
//!
//! Around the extractor sit the services used by the HTTP layer:
//! [`PasswordHasherService`] (Argon2id), [`TokenService`] (HS512 JWT),
//! [`LoginService`] (MEMORY, LOCAL, then LDAP via a
//! [`DirectoryAuthenticator`]) and [`UserService`] (account management).
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sparky_auth::{ExtractorConfig, FactoryRegistry, IdentityExtractor, Principal};
//! use sparky_storage::InMemoryUserStore;
//!
//! let extractor = IdentityExtractor::new(
//!     Arc::new(InMemoryUserStore::new()),
//!     Arc::new(FactoryRegistry::with_defaults()),
//!     ExtractorConfig::default(),
//! );
//! let user = extractor.extract_with_refresh(&principal)?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod directory;
pub mod error;
pub mod extraction;
pub mod factory;
pub mod login;
pub mod memory;
pub mod password;
pub mod principal;
pub mod token;
pub mod users;

pub use directory::{DirectoryAuthenticator, StaticDirectory};
pub use error::{AuthError, AuthResult, IdentityError, IdentityResult};
pub use extraction::{ExtractorConfig, IdentityExtractor};
pub use factory::{
    FactoryRegistry, LdapUserFactory, LocalUserFactory, MemoryUserFactory, PlaceholderUserFactory,
    UserFactory,
};
pub use login::{AuthenticatedCaller, AuthenticationInfo, LoginService};
pub use memory::MemoryRealm;
pub use password::{PasswordHasherService, PasswordPolicy};
pub use principal::{
    AuthenticationContext, DirectoryPrincipal, MemoryPrincipal, OpaquePrincipal, Principal,
    PrincipalAttributes, PrincipalSource, TokenPrincipal,
};
pub use token::{Claims, IssuedToken, TokenService};
pub use users::UserService;
