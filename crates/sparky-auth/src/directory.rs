//! Directory authentication seam.
//!
//! An LDAP client verifies a username and password by binding against the
//! directory and reports the account's authorities. The login flow only
//! depends on [`DirectoryAuthenticator`]; [`StaticDirectory`] is the
//! in-process implementation used in tests and local development.

use std::collections::HashMap;

use crate::error::{AuthError, AuthResult};
use crate::principal::DirectoryPrincipal;

/// Verifies directory credentials.
pub trait DirectoryAuthenticator: Send + Sync {
    /// Binds as the user and returns the directory principal.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the bind is rejected and
    /// `AuthError::Internal` if the directory cannot be reached.
    fn authenticate(&self, username: &str, password: &str) -> AuthResult<DirectoryPrincipal>;
}

#[derive(Clone)]
struct DirectoryEntry {
    password: String,
    principal: DirectoryPrincipal,
}

/// Fixed set of directory accounts.
#[derive(Clone, Default)]
pub struct StaticDirectory {
    entries: HashMap<String, DirectoryEntry>,
}

impl std::fmt::Debug for StaticDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticDirectory")
            .field("accounts", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StaticDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an enabled account.
    #[must_use]
    pub fn with_account(
        self,
        username: impl Into<String>,
        password: impl Into<String>,
        authorities: &[&str],
    ) -> Self {
        let username = username.into();
        let principal = DirectoryPrincipal::new(
            username,
            authorities.iter().map(|a| (*a).to_string()).collect(),
        );
        self.with_principal(principal, password)
    }

    /// Adds an account with a prepared principal.
    #[must_use]
    pub fn with_principal(mut self, principal: DirectoryPrincipal, password: impl Into<String>) -> Self {
        self.entries.insert(
            principal.username.clone(),
            DirectoryEntry {
                password: password.into(),
                principal,
            },
        );
        self
    }
}

impl DirectoryAuthenticator for StaticDirectory {
    fn authenticate(&self, username: &str, password: &str) -> AuthResult<DirectoryPrincipal> {
        match self.entries.get(username) {
            Some(entry) if entry.password == password => Ok(entry.principal.clone()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_succeeds_with_matching_password() {
        let directory = StaticDirectory::new().with_account("alice", "pw", &["ROLE_ADMIN"]);

        let principal = directory.authenticate("alice", "pw").unwrap();
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.authorities, vec!["ROLE_ADMIN".to_string()]);
        assert!(principal.enabled);
    }

    #[test]
    fn bind_fails_otherwise() {
        let directory = StaticDirectory::new().with_account("alice", "pw", &["ROLE_ADMIN"]);
        assert!(matches!(
            directory.authenticate("alice", "nope"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(directory.authenticate("bob", "pw").is_err());
    }
}
