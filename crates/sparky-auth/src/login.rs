//! Login and bearer authentication.
//!
//! A login attempt walks the realms in a fixed order: configured `MEMORY`
//! users, stored `LOCAL` users, then the directory when one is configured.
//! The first realm accepting the password wins. Every failure is reported
//! to the client as the same generic [`AuthError::InvalidCredentials`]; the
//! real cause goes to the audit log only.

use std::sync::Arc;

use chrono::Utc;
use sparky_core::{Event, EventType};
use sparky_model::{Realm, UserRecord};
use sparky_storage::{StorageError, UserStore};

use crate::directory::DirectoryAuthenticator;
use crate::error::{AuthError, AuthResult, IdentityError};
use crate::extraction::IdentityExtractor;
use crate::memory::MemoryRealm;
use crate::password::PasswordHasherService;
use crate::principal::Principal;
use crate::token::{Claims, IssuedToken, TokenService};

/// A resolved user together with a token for it.
#[derive(Debug, Clone)]
pub struct AuthenticationInfo {
    /// The resolved user.
    pub user: UserRecord,
    /// Bearer token.
    pub token: IssuedToken,
}

/// The caller of a request authenticated by a bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    /// User built from the token without a store round trip.
    pub user: UserRecord,
    /// Validated claims.
    pub claims: Claims,
    /// Raw token.
    pub token: String,
}

impl AuthenticatedCaller {
    /// Checks whether the caller holds the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user.role().is_admin()
    }

    /// Checks whether the caller is the named user.
    #[must_use]
    pub fn is(&self, username: &str, realm: Realm) -> bool {
        self.user.has_identity(username, realm)
    }

    /// `username@REALM`, for audit records.
    #[must_use]
    pub fn actor(&self) -> String {
        format!("{}@{}", self.user.username(), self.user.realm())
    }

    /// The token with its expiration.
    #[must_use]
    pub fn issued_token(&self) -> IssuedToken {
        IssuedToken {
            token: self.token.clone(),
            expires_at: self.claims.expires_at().unwrap_or_else(Utc::now),
        }
    }
}

/// Orchestrates login and token checks across all realms.
#[derive(Clone)]
pub struct LoginService {
    store: Arc<dyn UserStore>,
    extractor: IdentityExtractor,
    memory: Arc<MemoryRealm>,
    directory: Option<Arc<dyn DirectoryAuthenticator>>,
    hasher: Arc<PasswordHasherService>,
    tokens: Arc<TokenService>,
}

impl std::fmt::Debug for LoginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginService")
            .field("memory_users", &self.memory.len())
            .field("directory", &self.directory.is_some())
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl LoginService {
    /// Creates a login service without a directory.
    pub fn new(
        store: Arc<dyn UserStore>,
        extractor: IdentityExtractor,
        memory: Arc<MemoryRealm>,
        hasher: Arc<PasswordHasherService>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            store,
            extractor,
            memory,
            directory: None,
            hasher,
            tokens,
        }
    }

    /// Enables directory logins.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn DirectoryAuthenticator>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Returns the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Authenticates a username and password and issues a token.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidCredentials` for every rejected attempt, including
    /// disabled, expired and locked accounts. Storage outages and internal
    /// failures propagate as they are.
    pub fn login(&self, username: &str, password: &str) -> AuthResult<AuthenticationInfo> {
        let result = self
            .authenticate(username, password)
            .and_then(|user| {
                let token = self.tokens.issue(&user)?;
                Ok(AuthenticationInfo { user, token })
            });

        match result {
            Ok(info) => {
                tracing::info!(
                    username = %info.user.username(),
                    realm = %info.user.realm(),
                    "Login succeeded"
                );
                Event::builder(EventType::Login)
                    .user(info.user.username(), info.user.realm())
                    .emit();
                Ok(info)
            }
            Err(err) => {
                Event::builder(EventType::LoginError)
                    .username(username)
                    .failure(err.to_string())
                    .emit();
                Err(match err {
                    AuthError::Internal(_)
                    | AuthError::Identity(IdentityError::StorageUnavailable(_)) => err,
                    _ => AuthError::InvalidCredentials,
                })
            }
        }
    }

    /// Validates a bearer token and builds the caller from its claims.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidToken` for rejected tokens, identity errors when
    /// the claims cannot produce a user.
    pub fn authenticate_bearer(&self, raw: &str) -> AuthResult<AuthenticatedCaller> {
        let claims = self.tokens.verify(raw)?;
        let user = self
            .extractor
            .extract_from_authentication_context(&claims.authentication_context())?;
        Ok(AuthenticatedCaller {
            user,
            claims,
            token: raw.to_string(),
        })
    }

    /// Verifies a raw token on behalf of a client.
    ///
    /// # Errors
    ///
    /// Same as [`authenticate_bearer`](Self::authenticate_bearer).
    pub fn verify(&self, raw: &str) -> AuthResult<AuthenticationInfo> {
        match self.authenticate_bearer(raw) {
            Ok(caller) => {
                Event::builder(EventType::VerifyToken)
                    .user(caller.user.username(), caller.user.realm())
                    .emit();
                Ok(AuthenticationInfo {
                    token: caller.issued_token(),
                    user: caller.user,
                })
            }
            Err(err) => {
                Event::builder(EventType::VerifyTokenError)
                    .failure(err.to_string())
                    .emit();
                Err(err)
            }
        }
    }

    fn authenticate(&self, username: &str, password: &str) -> AuthResult<UserRecord> {
        if username.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(user) = self.memory.find(username) {
            if let Some(credential) = user.credential() {
                if self.hasher.verify(password, credential).is_ok() {
                    check_account(user)?;
                    return Ok(user.clone());
                }
            }
        }

        match self.store.find_by_username_and_realm(username, Realm::Local) {
            Ok(user) => {
                if let Some(credential) = user.credential() {
                    if self.hasher.verify(password, credential).is_ok() {
                        check_account(&user)?;
                        return Ok(self.upgrade_hash(user, password));
                    }
                }
            }
            Err(StorageError::NotFound { .. }) => {}
            Err(err) => return Err(err.into()),
        }

        match &self.directory {
            Some(directory) => self.authenticate_directory(directory.as_ref(), username, password),
            None => Err(AuthError::InvalidCredentials),
        }
    }

    fn authenticate_directory(
        &self,
        directory: &dyn DirectoryAuthenticator,
        username: &str,
        password: &str,
    ) -> AuthResult<UserRecord> {
        let principal = directory.authenticate(username, password)?;
        let enabled = principal.enabled;
        let user = self
            .extractor
            .extract_with_refresh(&Principal::Directory(principal))?;

        let user = if user.realm() == Realm::Ldap {
            self.mirror_directory_user(user, enabled)?
        } else {
            user
        };
        check_account(&user)?;
        Ok(user)
    }

    /// Stores a directory user on first login and keeps role and active
    /// flag in sync afterwards.
    fn mirror_directory_user(&self, user: UserRecord, enabled: bool) -> AuthResult<UserRecord> {
        match self
            .store
            .find_by_username_and_realm(user.username(), Realm::Ldap)
        {
            Ok(mut stored) => {
                if stored.role() == user.role() && stored.is_active() == enabled {
                    return Ok(stored);
                }
                stored.set_role(user.role());
                stored.set_active(enabled);
                Ok(self.store.save(&stored)?)
            }
            Err(StorageError::NotFound { .. }) => {
                let saved = self.store.save(&user)?;
                tracing::info!(username = %saved.username(), "Directory user stored on first login");
                Event::builder(EventType::MirrorDirectoryUser)
                    .user(saved.username(), saved.realm())
                    .emit();
                Ok(saved)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Re-hashes a verified password created with outdated parameters.
    /// A failed upgrade never fails the login.
    fn upgrade_hash(&self, mut user: UserRecord, password: &str) -> UserRecord {
        let outdated = user
            .credential()
            .is_some_and(|credential| self.hasher.needs_rehash(credential));
        if !outdated {
            return user;
        }

        match self.rehash(&mut user, password) {
            Ok(saved) => {
                tracing::debug!(username = %saved.username(), "Password hash upgraded");
                saved
            }
            Err(err) => {
                tracing::warn!(username = %user.username(), error = %err, "Password re-hash failed");
                user
            }
        }
    }

    fn rehash(&self, user: &mut UserRecord, password: &str) -> AuthResult<UserRecord> {
        user.change_credential(self.hasher.hash_credential(password)?)?;
        Ok(self.store.save(user)?)
    }
}

/// Rejects accounts that may not log in.
fn check_account(user: &UserRecord) -> AuthResult<()> {
    if user.is_locked() {
        return Err(AuthError::UserLocked);
    }
    if !user.is_enabled() {
        return Err(AuthError::UserDisabled);
    }
    if user.is_expired() {
        return Err(AuthError::UserExpired);
    }
    Ok(())
}
