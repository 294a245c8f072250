//! Realm-specific user factories and their registry.
//!
//! Each realm has one [`UserFactory`] that knows the realm's construction
//! rules. The [`FactoryRegistry`] is built once at startup and shared by
//! reference; adding a realm means registering another factory, extraction
//! code stays untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sparky_model::{Credential, Realm, UserRecord, UserRole};

use crate::error::{IdentityError, IdentityResult};

/// Builds user records for one realm.
pub trait UserFactory: Send + Sync + fmt::Debug {
    /// Realm whose records this factory builds.
    fn realm(&self) -> Realm;

    /// Creates a fresh, unpersisted record.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidIdentity`] for an empty username.
    fn create(
        &self,
        username: &str,
        credential: Option<Credential>,
        role: UserRole,
        active: bool,
    ) -> IdentityResult<UserRecord>;
}

fn require_username(username: &str) -> IdentityResult<()> {
    if username.is_empty() {
        Err(IdentityError::InvalidIdentity("username must not be empty".to_string()))
    } else {
        Ok(())
    }
}

/// Factory for stored local users.
///
/// The credential may be absent on records built from an authentication
/// context; such records never pass a password check.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalUserFactory;

impl UserFactory for LocalUserFactory {
    fn realm(&self) -> Realm {
        Realm::Local
    }

    fn create(
        &self,
        username: &str,
        credential: Option<Credential>,
        role: UserRole,
        active: bool,
    ) -> IdentityResult<UserRecord> {
        require_username(username)?;
        Ok(UserRecord::new(username, Realm::Local, role, active, credential))
    }
}

/// Factory for directory users. Credentials are discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapUserFactory;

impl UserFactory for LdapUserFactory {
    fn realm(&self) -> Realm {
        Realm::Ldap
    }

    fn create(
        &self,
        username: &str,
        credential: Option<Credential>,
        role: UserRole,
        active: bool,
    ) -> IdentityResult<UserRecord> {
        require_username(username)?;
        if credential.is_some() {
            tracing::debug!(username, "Discarding credential for directory user");
        }
        Ok(UserRecord::new(username, Realm::Ldap, role, active, None))
    }
}

/// Factory for in-memory users. Records are always active.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryUserFactory;

impl UserFactory for MemoryUserFactory {
    fn realm(&self) -> Realm {
        Realm::Memory
    }

    fn create(
        &self,
        username: &str,
        credential: Option<Credential>,
        role: UserRole,
        _active: bool,
    ) -> IdentityResult<UserRecord> {
        require_username(username)?;
        Ok(UserRecord::new(username, Realm::Memory, role, true, credential))
    }
}

/// Factory for best-effort placeholders of unrecognized principals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderUserFactory;

impl UserFactory for PlaceholderUserFactory {
    fn realm(&self) -> Realm {
        Realm::Unknown
    }

    fn create(
        &self,
        username: &str,
        _credential: Option<Credential>,
        role: UserRole,
        active: bool,
    ) -> IdentityResult<UserRecord> {
        require_username(username)?;
        Ok(UserRecord::new(username, Realm::Unknown, role, active, None))
    }
}

/// Realm-indexed factory lookup.
#[derive(Debug, Clone, Default)]
pub struct FactoryRegistry {
    factories: HashMap<Realm, Arc<dyn UserFactory>>,
}

impl FactoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with a factory for every built-in realm.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with_factory(LocalUserFactory)
            .with_factory(LdapUserFactory)
            .with_factory(MemoryUserFactory)
            .with_factory(PlaceholderUserFactory)
    }

    /// Registers a factory under its realm, replacing any previous one.
    #[must_use]
    pub fn with_factory<F: UserFactory + 'static>(mut self, factory: F) -> Self {
        self.factories.insert(factory.realm(), Arc::new(factory));
        self
    }

    /// Returns the factory for a realm.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UnsupportedRealm`] if none is registered.
    pub fn get(&self, realm: Realm) -> IdentityResult<&dyn UserFactory> {
        self.factories
            .get(&realm)
            .map(|factory| factory.as_ref())
            .ok_or(IdentityError::UnsupportedRealm(realm))
    }

    /// Checks whether a factory is registered for a realm.
    #[must_use]
    pub fn supports(&self, realm: Realm) -> bool {
        self.factories.contains_key(&realm)
    }

    /// Number of registered factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Checks whether no factory is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_factory_builds_its_own_realm() {
        let registry = FactoryRegistry::with_defaults();

        for realm in Realm::ALL {
            let factory = registry.get(realm).unwrap();
            assert_eq!(factory.realm(), realm);

            let user = factory
                .create("u", Some(Credential::plain("pw")), UserRole::Default, true)
                .unwrap();
            assert_eq!(user.realm(), realm);
            assert_eq!(user.username(), "u");
            assert!(user.id().is_none());
        }
    }

    #[test]
    fn empty_registry_rejects_every_realm() {
        let registry = FactoryRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.get(Realm::Local).unwrap_err(),
            IdentityError::UnsupportedRealm(Realm::Local)
        );
    }

    #[test]
    fn registry_is_open_for_replacement() {
        #[derive(Debug)]
        struct InactiveLocal;

        impl UserFactory for InactiveLocal {
            fn realm(&self) -> Realm {
                Realm::Local
            }

            fn create(
                &self,
                username: &str,
                credential: Option<Credential>,
                role: UserRole,
                _active: bool,
            ) -> IdentityResult<UserRecord> {
                Ok(UserRecord::new(username, Realm::Local, role, false, credential))
            }
        }

        let registry = FactoryRegistry::with_defaults().with_factory(InactiveLocal);
        assert_eq!(registry.len(), 4);

        let user = registry
            .get(Realm::Local)
            .unwrap()
            .create("x", None, UserRole::Default, true)
            .unwrap();
        assert!(!user.is_active());
    }

    #[test]
    fn empty_username_is_invalid() {
        let registry = FactoryRegistry::with_defaults();
        for realm in Realm::ALL {
            let err = registry
                .get(realm)
                .unwrap()
                .create("", None, UserRole::Default, true)
                .unwrap_err();
            assert!(matches!(err, IdentityError::InvalidIdentity(_)));
        }
    }

    #[test]
    fn ldap_factory_discards_credential() {
        let user = LdapUserFactory
            .create("alice", Some(Credential::plain("pw")), UserRole::Admin, true)
            .unwrap();
        assert!(user.credential().is_none());
    }

    #[test]
    fn memory_factory_forces_active() {
        let user = MemoryUserFactory
            .create("svc", None, UserRole::Service, false)
            .unwrap();
        assert!(user.is_active());
        assert!(user.is_enabled());
    }
}
