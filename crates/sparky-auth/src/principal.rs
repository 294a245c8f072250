//! Authenticated principal shapes.
//!
//! Authentication mechanisms hand over loosely structured
//! [`PrincipalAttributes`]. [`Principal::classify`] turns them into a closed
//! set of shapes once, at the boundary; extraction then matches on the
//! shape exhaustively.

use sparky_model::{Realm, UserDto, UserRecord};

/// Mechanism that produced a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalSource {
    /// LDAP directory bind.
    Directory,
    /// In-process credential verifier (configured users, test fixtures).
    CredentialVerifier,
    /// Verified bearer token.
    Token,
    /// Anything else.
    Other,
}

/// Raw attributes of an authenticated principal.
#[derive(Clone)]
pub struct PrincipalAttributes {
    /// Producing mechanism.
    pub source: PrincipalSource,
    /// Username, if known.
    pub username: Option<String>,
    /// Realm claim, if any.
    pub realm: Option<Realm>,
    /// Credential material, if any.
    pub credential: Option<String>,
    /// Authority strings.
    pub authorities: Vec<String>,
    /// Enabled flag reported by the mechanism.
    pub enabled: bool,
}

impl std::fmt::Debug for PrincipalAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrincipalAttributes")
            .field("source", &self.source)
            .field("username", &self.username)
            .field("realm", &self.realm)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("authorities", &self.authorities)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Principal supplied by the directory after a successful bind.
///
/// Never carries a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPrincipal {
    /// Directory username.
    pub username: String,
    /// Authority strings from the directory's group mapping.
    pub authorities: Vec<String>,
    /// Whether the directory reports the account as enabled.
    pub enabled: bool,
}

impl DirectoryPrincipal {
    /// Creates an enabled directory principal.
    #[must_use]
    pub fn new(username: impl Into<String>, authorities: Vec<String>) -> Self {
        Self {
            username: username.into(),
            authorities,
            enabled: true,
        }
    }
}

/// Username, credential and authorities from an in-process verifier.
#[derive(Clone, PartialEq, Eq)]
pub struct MemoryPrincipal {
    /// Username.
    pub username: String,
    /// Credential material as handed over.
    pub credential: String,
    /// Authority strings.
    pub authorities: Vec<String>,
    /// Enabled flag.
    pub enabled: bool,
}

impl std::fmt::Debug for MemoryPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPrincipal")
            .field("username", &self.username)
            .field("credential", &"[REDACTED]")
            .field("authorities", &self.authorities)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Name and realm as carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPrincipal {
    /// Subject.
    pub username: String,
    /// Realm claim.
    pub realm: Realm,
}

/// Principal exposing a username and authorities but nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaquePrincipal {
    /// Username.
    pub username: String,
    /// Authority strings.
    pub authorities: Vec<String>,
    /// Enabled flag.
    pub enabled: bool,
}

/// Recognized principal shapes.
#[derive(Debug, Clone)]
pub enum Principal {
    /// Already a canonical record.
    Canonical(UserRecord),
    /// Directory principal.
    Directory(DirectoryPrincipal),
    /// In-process verifier principal.
    Memory(MemoryPrincipal),
    /// Token principal.
    Token(TokenPrincipal),
    /// Transfer object naming a stored user.
    Transfer(UserDto),
    /// Username and authorities of unknown origin.
    Opaque(OpaquePrincipal),
    /// Nothing usable.
    Unrecognized,
}

impl Principal {
    /// Classifies raw attributes into a principal shape.
    ///
    /// | Source | Condition | Shape |
    /// |--------|-----------|-------|
    /// | any | no username and no authorities | `Unrecognized` |
    /// | `Directory` | | `Directory` (credential dropped) |
    /// | `CredentialVerifier` | credential present | `Memory` |
    /// | `Token` | realm claim present | `Token` |
    /// | otherwise | | `Opaque` |
    #[must_use]
    pub fn classify(attributes: PrincipalAttributes) -> Self {
        let PrincipalAttributes {
            source,
            username,
            realm,
            credential,
            authorities,
            enabled,
        } = attributes;

        if username.is_none() && authorities.is_empty() {
            return Self::Unrecognized;
        }
        let username = username.unwrap_or_default();

        match (source, credential, realm) {
            (PrincipalSource::Directory, _, _) => Self::Directory(DirectoryPrincipal {
                username,
                authorities,
                enabled,
            }),
            (PrincipalSource::CredentialVerifier, Some(credential), _) => {
                Self::Memory(MemoryPrincipal {
                    username,
                    credential,
                    authorities,
                    enabled,
                })
            }
            (PrincipalSource::Token, _, Some(realm)) => {
                Self::Token(TokenPrincipal { username, realm })
            }
            _ => Self::Opaque(OpaquePrincipal {
                username,
                authorities,
                enabled,
            }),
        }
    }

    /// Username carried by the principal, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Canonical(user) => Some(user.username()),
            Self::Directory(p) => Some(&p.username),
            Self::Memory(p) => Some(&p.username),
            Self::Token(p) => Some(&p.username),
            Self::Transfer(dto) => dto.username.as_deref(),
            Self::Opaque(p) => Some(&p.username),
            Self::Unrecognized => None,
        }
    }

    /// Short shape name for logging.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Canonical(_) => "canonical",
            Self::Directory(_) => "directory",
            Self::Memory(_) => "memory",
            Self::Token(_) => "token",
            Self::Transfer(_) => "transfer",
            Self::Opaque(_) => "opaque",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl From<UserRecord> for Principal {
    fn from(user: UserRecord) -> Self {
        Self::Canonical(user)
    }
}

impl From<DirectoryPrincipal> for Principal {
    fn from(principal: DirectoryPrincipal) -> Self {
        Self::Directory(principal)
    }
}

impl From<UserDto> for Principal {
    fn from(dto: UserDto) -> Self {
        Self::Transfer(dto)
    }
}

/// Raw authentication context without a richer principal object.
///
/// Produced from verified bearer tokens and from freshly verified basic
/// credentials.
#[derive(Clone, Default)]
pub struct AuthenticationContext {
    /// Principal name.
    pub username: Option<String>,
    /// Realm claim.
    pub realm: Option<Realm>,
    /// Credential material, if the mechanism kept it.
    pub credential: Option<String>,
    /// Authority strings.
    pub authorities: Vec<String>,
}

impl AuthenticationContext {
    /// Creates a context for a named principal.
    #[must_use]
    pub fn new(username: impl Into<String>, authorities: Vec<String>) -> Self {
        Self {
            username: Some(username.into()),
            authorities,
            ..Self::default()
        }
    }

    /// Sets the realm claim.
    #[must_use]
    pub const fn with_realm(mut self, realm: Realm) -> Self {
        self.realm = Some(realm);
        self
    }

    /// Sets the credential material.
    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

impl std::fmt::Debug for AuthenticationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationContext")
            .field("username", &self.username)
            .field("realm", &self.realm)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("authorities", &self.authorities)
            .finish()
    }
}
