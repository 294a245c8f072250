//! Principal-to-user extraction.
//!
//! The extractor holds no mutable state. Every call works on its own
//! inputs and returns a freshly built or freshly loaded record, so one
//! extractor is shared by all request handlers. Store access is a single
//! synchronous call per lookup and is never retried here.

use std::sync::Arc;

use sparky_core::{Event, EventType};
use sparky_model::{Credential, Realm, UserDto, UserRecord, UserRole};
use sparky_storage::{StorageError, UserStore};

use crate::error::{IdentityError, IdentityResult};
use crate::factory::FactoryRegistry;
use crate::principal::{AuthenticationContext, DirectoryPrincipal, Principal, TokenPrincipal};

/// Extraction behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// When a directory user cannot be found in the `LDAP` realm, resolve
    /// the first stored user with the same username in any realm.
    ///
    /// Favors availability over correctness: colliding usernames across
    /// realms resolve to the record with the lowest identifier.
    pub cross_realm_fallback: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            cross_realm_fallback: true,
        }
    }
}

/// Converts principals into canonical user records.
#[derive(Clone)]
pub struct IdentityExtractor {
    store: Arc<dyn UserStore>,
    factories: Arc<FactoryRegistry>,
    config: ExtractorConfig,
}

impl std::fmt::Debug for IdentityExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityExtractor")
            .field("factories", &self.factories)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IdentityExtractor {
    /// Creates an extractor.
    pub fn new(
        store: Arc<dyn UserStore>,
        factories: Arc<FactoryRegistry>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            store,
            factories,
            config,
        }
    }

    /// Returns the factory registry.
    #[must_use]
    pub fn factories(&self) -> &FactoryRegistry {
        &self.factories
    }

    /// Returns the behavior switches.
    #[must_use]
    pub const fn config(&self) -> ExtractorConfig {
        self.config
    }

    /// Builds a record from the principal alone, without touching the store.
    ///
    /// | Shape | Result |
    /// |-------|--------|
    /// | `Canonical` | the record, unchanged |
    /// | `Directory` | `LDAP` record, role from the single authority, no credential |
    /// | `Memory` | `MEMORY` record, credential wrapped with an unknown algorithm |
    /// | `Opaque` | `UNKNOWN` placeholder record |
    /// | `Token`, `Transfer` | `MissingData`, these need the store |
    /// | `Unrecognized` or empty username | `IdentityNotFound` |
    ///
    /// # Errors
    ///
    /// `AmbiguousRole` when a directory, memory or opaque principal does not
    /// carry exactly one authority, `InvalidRole` when that authority is
    /// unknown, `UnsupportedRealm` when the realm has no factory.
    pub fn extract_lightweight(&self, principal: &Principal) -> IdentityResult<UserRecord> {
        let username = principal.username().unwrap_or_default();
        if username.is_empty() {
            return Err(IdentityError::IdentityNotFound);
        }

        match principal {
            Principal::Canonical(user) => Ok(user.clone()),
            Principal::Directory(directory) => {
                let role = derive_role(&directory.authorities)?;
                self.factories
                    .get(Realm::Ldap)?
                    .create(&directory.username, None, role, directory.enabled)
            }
            Principal::Memory(memory) => {
                let role = derive_role(&memory.authorities)?;
                self.factories.get(Realm::Memory)?.create(
                    &memory.username,
                    Some(Credential::unknown(memory.credential.as_str())),
                    role,
                    memory.enabled,
                )
            }
            Principal::Opaque(opaque) => {
                let role = derive_role(&opaque.authorities)?;
                self.factories
                    .get(Realm::Unknown)?
                    .create(&opaque.username, None, role, opaque.enabled)
            }
            Principal::Token(_) => Err(IdentityError::missing_data(
                "token principal carries no role; a store lookup is required",
            )),
            Principal::Transfer(_) => Err(IdentityError::missing_data(
                "transfer object carries no verified identity; a store lookup is required",
            )),
            Principal::Unrecognized => Err(IdentityError::IdentityNotFound),
        }
    }

    /// Extracts a record, consulting the store when the principal alone is
    /// not enough.
    ///
    /// Directory principals whose embedded data cannot produce a record
    /// are looked up as `(username, LDAP)`. If that finds nothing and the
    /// cross-realm fallback is enabled, the first stored record with the
    /// same username in any realm is used. Token principals and transfer
    /// objects are always loaded from the store.
    ///
    /// # Errors
    ///
    /// Construction errors of non-directory shapes propagate unchanged.
    /// `UserNotFound` propagates from the last lookup attempted.
    /// `StorageUnavailable` propagates from any lookup.
    pub fn extract_with_refresh(&self, principal: &Principal) -> IdentityResult<UserRecord> {
        match principal {
            Principal::Token(token) => return self.load_token_principal(token),
            Principal::Transfer(dto) => return self.extract_from_transfer_object(dto),
            _ => {}
        }

        match self.extract_lightweight(principal) {
            Ok(user) => Ok(user),
            Err(err) if err.is_recoverable_by_refresh() => match principal {
                Principal::Directory(directory) => self.refresh_directory_user(directory, &err),
                _ => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// Builds a record from a raw authentication context.
    ///
    /// The role comes from the single authority, credential material is
    /// kept with an unknown algorithm and the realm claim selects the
    /// factory.
    ///
    /// # Errors
    ///
    /// `IdentityNotFound` without a username, `AmbiguousRole` unless
    /// exactly one authority is present, `MissingData` without a realm
    /// claim, `UnsupportedRealm` when the realm has no factory.
    pub fn extract_from_authentication_context(
        &self,
        context: &AuthenticationContext,
    ) -> IdentityResult<UserRecord> {
        let username = context
            .username
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(IdentityError::IdentityNotFound)?;
        let role = derive_role(&context.authorities)?;
        let realm = context
            .realm
            .ok_or_else(|| IdentityError::missing_data("authentication context has no realm claim"))?;

        let credential = context.credential.as_deref().map(Credential::unknown);
        self.factories
            .get(realm)?
            .create(username, credential, role, true)
    }

    /// Loads the stored record named by a transfer object.
    ///
    /// # Errors
    ///
    /// `MissingData` if username or realm is absent, `UserNotFound` if no
    /// record matches, `StorageUnavailable` if the store fails.
    pub fn extract_from_transfer_object(&self, dto: &UserDto) -> IdentityResult<UserRecord> {
        let (username, realm) = dto
            .identity()
            .ok_or_else(|| IdentityError::missing_data("transfer object needs username and realm"))?;
        Ok(self.store.find_by_username_and_realm(username, realm)?)
    }

    /// Resolves any recognized principal shape.
    ///
    /// Directory principals take the refresh path, token principals and
    /// transfer objects are loaded from the store, the remaining shapes are
    /// built without I/O. Returns `Ok(None)` for unrecognized principals and
    /// leaves that decision to the caller.
    ///
    /// # Errors
    ///
    /// Errors of the delegated operation propagate unchanged.
    pub fn extract_polymorphic(&self, principal: &Principal) -> IdentityResult<Option<UserRecord>> {
        let user = match principal {
            Principal::Unrecognized => return Ok(None),
            Principal::Directory(_) | Principal::Token(_) => self.extract_with_refresh(principal)?,
            Principal::Transfer(dto) => self.extract_from_transfer_object(dto)?,
            Principal::Canonical(_) | Principal::Memory(_) | Principal::Opaque(_) => {
                self.extract_lightweight(principal)?
            }
        };
        Ok(Some(user))
    }

    fn load_token_principal(&self, token: &TokenPrincipal) -> IdentityResult<UserRecord> {
        if token.username.is_empty() {
            return Err(IdentityError::IdentityNotFound);
        }
        Ok(self
            .store
            .find_by_username_and_realm(&token.username, token.realm)?)
    }

    fn refresh_directory_user(
        &self,
        directory: &DirectoryPrincipal,
        cause: &IdentityError,
    ) -> IdentityResult<UserRecord> {
        tracing::debug!(
            username = %directory.username,
            error = %cause,
            "Directory principal incomplete, loading stored record"
        );

        match self
            .store
            .find_by_username_and_realm(&directory.username, Realm::Ldap)
        {
            Ok(user) => Ok(user),
            Err(StorageError::NotFound { .. }) if self.config.cross_realm_fallback => {
                self.first_user_in_any_realm(&directory.username)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn first_user_in_any_realm(&self, username: &str) -> IdentityResult<UserRecord> {
        tracing::warn!(
            username,
            "Realm of directory user unresolved, using first stored user with this name in any realm"
        );

        let user = self
            .store
            .find_all_by_username(username)?
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::UserNotFound(format!("'{username}' in any realm")))?;

        Event::builder(EventType::CrossRealmFallback)
            .user(user.username(), user.realm())
            .detail("requested_realm", Realm::Ldap.as_str())
            .emit();
        Ok(user)
    }
}

/// Derives the role from exactly one authority.
fn derive_role(authorities: &[String]) -> IdentityResult<UserRole> {
    match authorities {
        [authority] => Ok(UserRole::from_authority(authority)?),
        _ => Err(IdentityError::AmbiguousRole {
            count: authorities.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use sparky_model::ProfileSettings;
    use sparky_storage::{InMemoryUserStore, StorageResult};

    use super::*;
    use crate::principal::{MemoryPrincipal, OpaquePrincipal};

    /// Store wrapper counting every call.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryUserStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn tick(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl UserStore for CountingStore {
        fn find_by_username_and_realm(&self, username: &str, realm: Realm) -> StorageResult<UserRecord> {
            self.tick();
            self.inner.find_by_username_and_realm(username, realm)
        }

        fn find_all_by_username(&self, username: &str) -> StorageResult<Vec<UserRecord>> {
            self.tick();
            self.inner.find_all_by_username(username)
        }

        fn find_by_id(&self, id: i64) -> StorageResult<UserRecord> {
            self.tick();
            self.inner.find_by_id(id)
        }

        fn find_all(&self) -> StorageResult<Vec<UserRecord>> {
            self.tick();
            self.inner.find_all()
        }

        fn find_all_in_realm(&self, realm: Realm) -> StorageResult<Vec<UserRecord>> {
            self.tick();
            self.inner.find_all_in_realm(realm)
        }

        fn exists(&self, user: &UserRecord) -> StorageResult<bool> {
            self.tick();
            self.inner.exists(user)
        }

        fn save(&self, user: &UserRecord) -> StorageResult<UserRecord> {
            self.tick();
            self.inner.save(user)
        }

        fn delete_by_username_and_realm(&self, username: &str, realm: Realm) -> StorageResult<()> {
            self.tick();
            self.inner.delete_by_username_and_realm(username, realm)
        }
    }

    fn setup(config: ExtractorConfig) -> (Arc<CountingStore>, IdentityExtractor) {
        let store = Arc::new(CountingStore::default());
        let extractor = IdentityExtractor::new(
            store.clone(),
            Arc::new(FactoryRegistry::with_defaults()),
            config,
        );
        (store, extractor)
    }

    fn seed(store: &CountingStore, username: &str, realm: Realm, role: UserRole) -> UserRecord {
        let credential = (realm != Realm::Ldap).then(|| Credential::plain("pw"));
        store
            .inner
            .save(&UserRecord::new(username, realm, role, true, credential))
            .unwrap()
    }

    fn directory(username: &str, authorities: &[&str]) -> Principal {
        Principal::Directory(DirectoryPrincipal::new(
            username,
            authorities.iter().map(|a| (*a).to_string()).collect(),
        ))
    }

    #[test]
    fn canonical_record_is_returned_without_store_calls() {
        let (store, extractor) = setup(ExtractorConfig::default());
        let user = UserRecord::new("zoe", Realm::Local, UserRole::Default, true, Some(Credential::plain("pw")))
            .with_profile(ProfileSettings::new().with_email_receive(true));

        let extracted = extractor
            .extract_lightweight(&Principal::Canonical(user.clone()))
            .unwrap();

        assert_eq!(extracted, user);
        assert_eq!(extracted.profile(), user.profile());
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn directory_principal_becomes_ldap_record() {
        let (store, extractor) = setup(ExtractorConfig::default());

        let user = extractor
            .extract_lightweight(&directory("alice", &["ROLE_ADMIN"]))
            .unwrap();

        assert_eq!(user.username(), "alice");
        assert_eq!(user.realm(), Realm::Ldap);
        assert_eq!(user.role(), UserRole::Admin);
        assert!(user.credential().is_none());
        assert!(user.is_enabled());
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn directory_principal_without_authority_is_ambiguous() {
        let (_, extractor) = setup(ExtractorConfig::default());

        let err = extractor.extract_lightweight(&directory("alice", &[])).unwrap_err();
        assert_eq!(err, IdentityError::AmbiguousRole { count: 0 });

        let err = extractor
            .extract_lightweight(&directory("alice", &["ROLE_ADMIN", "ROLE_DEFAULT"]))
            .unwrap_err();
        assert_eq!(err, IdentityError::AmbiguousRole { count: 2 });
    }

    #[test]
    fn unknown_authority_is_rejected() {
        let (_, extractor) = setup(ExtractorConfig::default());
        let err = extractor
            .extract_lightweight(&directory("alice", &["ROLE_ROOT"]))
            .unwrap_err();
        assert_eq!(err, IdentityError::InvalidRole("ROLE_ROOT".to_string()));
    }

    #[test]
    fn memory_principal_becomes_memory_record() {
        let (_, extractor) = setup(ExtractorConfig::default());
        let principal = Principal::Memory(MemoryPrincipal {
            username: "svc".to_string(),
            credential: "secret".to_string(),
            authorities: vec!["ROLE_SERVICE".to_string()],
            enabled: false,
        });

        let user = extractor.extract_lightweight(&principal).unwrap();
        assert_eq!(user.realm(), Realm::Memory);
        assert_eq!(user.role(), UserRole::Service);
        assert!(user.is_enabled());
        let credential = user.credential().unwrap();
        assert_eq!(credential.representation(), "secret");
        assert_eq!(credential.algorithm(), sparky_model::HashAlgorithm::Unknown);
    }

    #[test]
    fn opaque_principal_becomes_placeholder() {
        let (_, extractor) = setup(ExtractorConfig::default());
        let principal = Principal::Opaque(OpaquePrincipal {
            username: "who".to_string(),
            authorities: vec!["ROLE_DEFAULT".to_string()],
            enabled: true,
        });

        let user = extractor.extract_lightweight(&principal).unwrap();
        assert_eq!(user.realm(), Realm::Unknown);
        assert!(!user.is_persistable());
    }

    #[test]
    fn missing_username_is_identity_not_found() {
        let (_, extractor) = setup(ExtractorConfig::default());
        assert_eq!(
            extractor.extract_lightweight(&Principal::Unrecognized).unwrap_err(),
            IdentityError::IdentityNotFound
        );
        assert_eq!(
            extractor.extract_lightweight(&directory("", &["ROLE_ADMIN"])).unwrap_err(),
            IdentityError::IdentityNotFound
        );
    }

    #[test]
    fn unsupported_realm_is_reported() {
        let store = Arc::new(InMemoryUserStore::new());
        let extractor = IdentityExtractor::new(
            store,
            Arc::new(FactoryRegistry::new()),
            ExtractorConfig::default(),
        );

        let err = extractor
            .extract_lightweight(&directory("alice", &["ROLE_ADMIN"]))
            .unwrap_err();
        assert_eq!(err, IdentityError::UnsupportedRealm(Realm::Ldap));
    }

    #[test]
    fn refresh_loads_directory_user_from_store() {
        let (store, extractor) = setup(ExtractorConfig::default());
        let stored = seed(&store, "alice", Realm::Ldap, UserRole::Admin);

        let user = extractor
            .extract_with_refresh(&directory("alice", &[]))
            .unwrap();

        assert_eq!(user, stored);
        assert_eq!(user.id(), stored.id());
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn refresh_skips_store_when_principal_is_complete() {
        let (store, extractor) = setup(ExtractorConfig::default());
        let user = extractor
            .extract_with_refresh(&directory("alice", &["ROLE_DEFAULT"]))
            .unwrap();

        assert_eq!(user.realm(), Realm::Ldap);
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn refresh_falls_back_to_any_realm() {
        let (store, extractor) = setup(ExtractorConfig::default());
        let local = seed(&store, "bob", Realm::Local, UserRole::Default);
        seed(&store, "carol", Realm::Ldap, UserRole::Admin);

        let user = extractor
            .extract_with_refresh(&directory("bob", &["ROLE_ADMIN", "ROLE_DEFAULT"]))
            .unwrap();

        assert_eq!(user, local);
        assert_eq!(store.calls(), 2);
    }

    #[test]
    fn final_fallback_failure_propagates_not_found() {
        let (_, extractor) = setup(ExtractorConfig::default());
        let err = extractor
            .extract_with_refresh(&directory("ghost", &[]))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn disabled_fallback_stops_after_realm_lookup() {
        let (store, extractor) = setup(ExtractorConfig {
            cross_realm_fallback: false,
        });
        seed(&store, "bob", Realm::Local, UserRole::Default);

        let err = extractor
            .extract_with_refresh(&directory("bob", &[]))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn refresh_propagates_storage_failure() {
        let (store, extractor) = setup(ExtractorConfig::default());
        store.inner.set_available(false);

        let err = extractor
            .extract_with_refresh(&directory("alice", &[]))
            .unwrap_err();
        assert!(matches!(err, IdentityError::StorageUnavailable(_)));
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn refresh_does_not_recover_other_shapes() {
        let (store, extractor) = setup(ExtractorConfig::default());
        seed(&store, "who", Realm::Local, UserRole::Default);
        let principal = Principal::Opaque(OpaquePrincipal {
            username: "who".to_string(),
            authorities: Vec::new(),
            enabled: true,
        });

        let err = extractor.extract_with_refresh(&principal).unwrap_err();
        assert_eq!(err, IdentityError::AmbiguousRole { count: 0 });
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn refresh_is_idempotent() {
        let (store, extractor) = setup(ExtractorConfig::default());
        seed(&store, "alice", Realm::Ldap, UserRole::Default);
        let principal = directory("alice", &[]);

        let first = extractor.extract_with_refresh(&principal).unwrap();
        let second = extractor.extract_with_refresh(&principal).unwrap();
        assert_eq!(first, second);

        let token = Principal::Token(TokenPrincipal {
            username: "alice".to_string(),
            realm: Realm::Ldap,
        });
        assert_eq!(
            extractor.extract_with_refresh(&token).unwrap(),
            extractor.extract_with_refresh(&token).unwrap()
        );
    }

    #[test]
    fn authentication_context_uses_realm_factory() {
        let (store, extractor) = setup(ExtractorConfig::default());
        let context = AuthenticationContext::new("carl", vec!["ROLE_DEFAULT".to_string()])
            .with_realm(Realm::Local)
            .with_credential("raw-secret");

        let user = extractor.extract_from_authentication_context(&context).unwrap();
        assert_eq!(user.realm(), Realm::Local);
        assert_eq!(user.role(), UserRole::Default);
        let credential = user.credential().unwrap();
        assert_eq!(credential.algorithm(), sparky_model::HashAlgorithm::Unknown);
        assert!(!credential.verify("raw-secret"));
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn authentication_context_requires_realm_and_single_role() {
        let (_, extractor) = setup(ExtractorConfig::default());

        let no_realm = AuthenticationContext::new("carl", vec!["ROLE_DEFAULT".to_string()]);
        assert!(matches!(
            extractor.extract_from_authentication_context(&no_realm),
            Err(IdentityError::MissingData(_))
        ));

        let no_role = AuthenticationContext::new("carl", Vec::new()).with_realm(Realm::Local);
        assert_eq!(
            extractor.extract_from_authentication_context(&no_role).unwrap_err(),
            IdentityError::AmbiguousRole { count: 0 }
        );

        let anonymous = AuthenticationContext::default();
        assert_eq!(
            extractor.extract_from_authentication_context(&anonymous).unwrap_err(),
            IdentityError::IdentityNotFound
        );
    }

    #[test]
    fn transfer_object_resolves_stored_record() {
        let (store, extractor) = setup(ExtractorConfig::default());
        let stored = seed(&store, "bob", Realm::Local, UserRole::Default);

        let user = extractor
            .extract_from_transfer_object(&UserDto::identifying("bob", Realm::Local))
            .unwrap();
        assert_eq!(user, stored);
    }

    #[test]
    fn transfer_object_against_empty_store_is_not_found() {
        let (_, extractor) = setup(ExtractorConfig::default());
        let err = extractor
            .extract_from_transfer_object(&UserDto::identifying("bob", Realm::Local))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn transfer_object_without_realm_is_missing_data() {
        let (store, extractor) = setup(ExtractorConfig::default());
        let dto = UserDto {
            username: Some("bob".to_string()),
            ..UserDto::default()
        };

        assert!(matches!(
            extractor.extract_from_transfer_object(&dto),
            Err(IdentityError::MissingData(_))
        ));
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn polymorphic_dispatch() {
        let (store, extractor) = setup(ExtractorConfig::default());
        let stored = seed(&store, "bob", Realm::Local, UserRole::Default);

        assert_eq!(extractor.extract_polymorphic(&Principal::Unrecognized), Ok(None));

        let from_dto = extractor
            .extract_polymorphic(&Principal::from(UserDto::identifying("bob", Realm::Local)))
            .unwrap();
        assert_eq!(from_dto, Some(stored.clone()));

        let from_directory = extractor
            .extract_polymorphic(&directory("dora", &["ROLE_DEFAULT"]))
            .unwrap()
            .unwrap();
        assert_eq!(from_directory.realm(), Realm::Ldap);

        let token = Principal::Token(TokenPrincipal {
            username: "bob".to_string(),
            realm: Realm::Local,
        });
        assert_eq!(extractor.extract_polymorphic(&token).unwrap(), Some(stored));
    }

    #[test]
    fn polymorphic_propagates_errors() {
        let (_, extractor) = setup(ExtractorConfig::default());
        let err = extractor
            .extract_polymorphic(&Principal::from(UserDto::identifying("nobody", Realm::Local)))
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
