//! User records.
//!
//! [`UserRecord`] is the canonical identity every principal is converted
//! into. Its realm is fixed at construction; everything else changes only
//! through the explicit setters below and is never persisted implicitly.

use chrono::{DateTime, Utc};

use crate::credential::Credential;
use crate::dto::{ProfileSettingsDto, UserDto};
use crate::error::{ModelError, ModelResult};
use crate::profile::ProfileSettings;
use crate::realm::Realm;
use crate::role::UserRole;

/// Capability set of a user record.
///
/// Derived from `(realm, role)`; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserVariant {
    /// Stored local user.
    Local,
    /// Stored local machine principal (`LOCAL` realm, `SERVICE` role).
    Service,
    /// Directory user. Credential is managed by the directory.
    Ldap,
    /// Configured in-memory user. Always enabled, never persisted.
    Memory,
    /// Best-effort placeholder for an unrecognized principal.
    Unknown,
}

impl UserVariant {
    /// Derives the variant for a realm and role.
    #[must_use]
    pub const fn of(realm: Realm, role: UserRole) -> Self {
        match (realm, role) {
            (Realm::Local, UserRole::Service) => Self::Service,
            (Realm::Local, _) => Self::Local,
            (Realm::Ldap, _) => Self::Ldap,
            (Realm::Memory, _) => Self::Memory,
            (Realm::Unknown, _) => Self::Unknown,
        }
    }

    /// Checks whether records of this variant may be written to a store.
    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        matches!(self, Self::Local | Self::Service | Self::Ldap)
    }

    /// Checks whether the credential of this variant may be replaced.
    #[must_use]
    pub const fn has_mutable_credential(&self) -> bool {
        matches!(self, Self::Local | Self::Service)
    }
}

/// Canonical user identity.
///
/// Equality compares username, realm and credential.
#[derive(Debug, Clone)]
pub struct UserRecord {
    id: Option<i64>,
    username: String,
    realm: Realm,
    role: UserRole,
    active: bool,
    credential: Option<Credential>,
    profile: Option<ProfileSettings>,
    expiration_time: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Creates an unpersisted record.
    ///
    /// Prefer the realm factories, which validate the username and apply
    /// realm rules (for example, directory users never carry a credential).
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        realm: Realm,
        role: UserRole,
        active: bool,
        credential: Option<Credential>,
    ) -> Self {
        Self {
            id: None,
            username: username.into(),
            realm,
            role,
            active,
            credential,
            profile: None,
            expiration_time: None,
        }
    }

    /// Sets the storage identifier.
    #[must_use]
    pub const fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Attaches profile settings.
    #[must_use]
    pub fn with_profile(mut self, profile: ProfileSettings) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expiration_time(mut self, expiration_time: DateTime<Utc>) -> Self {
        self.expiration_time = Some(expiration_time);
        self
    }

    /// Storage identifier, present once persisted.
    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.id
    }

    /// Username, unique within the realm.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Realm owning this user.
    #[must_use]
    pub const fn realm(&self) -> Realm {
        self.realm
    }

    /// Role of this user.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.role
    }

    /// Raw active flag as stored.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Expiration time, if any.
    #[must_use]
    pub const fn expiration_time(&self) -> Option<DateTime<Utc>> {
        self.expiration_time
    }

    /// Capability set of this record.
    #[must_use]
    pub const fn variant(&self) -> UserVariant {
        UserVariant::of(self.realm, self.role)
    }

    /// Checks whether the user may authenticate.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        match self.variant() {
            UserVariant::Memory => true,
            UserVariant::Local | UserVariant::Service | UserVariant::Ldap | UserVariant::Unknown => {
                self.active
            }
        }
    }

    /// Checks whether the account passed its expiration time.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Checks expiration against a given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.variant() {
            UserVariant::Memory => false,
            UserVariant::Local | UserVariant::Service | UserVariant::Ldap | UserVariant::Unknown => {
                self.expiration_time.is_some_and(|expires| expires <= now)
            }
        }
    }

    /// Checks whether the account is locked.
    ///
    /// Stored accounts are locked while inactive. Directory accounts are
    /// locked by the directory itself and never here.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        match self.variant() {
            UserVariant::Local | UserVariant::Service => !self.active,
            UserVariant::Ldap | UserVariant::Memory | UserVariant::Unknown => false,
        }
    }

    /// Stored credential. Always `None` for directory users.
    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        match self.variant() {
            UserVariant::Ldap => None,
            UserVariant::Local | UserVariant::Service | UserVariant::Memory | UserVariant::Unknown => {
                self.credential.as_ref()
            }
        }
    }

    /// Checks whether this record may be written to a store.
    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        self.variant().is_persistable()
    }

    /// Checks whether this record is identified by `(username, realm)`.
    #[must_use]
    pub fn has_identity(&self, username: &str, realm: Realm) -> bool {
        self.realm == realm && self.username == username
    }

    /// Profile settings without materializing them.
    #[must_use]
    pub const fn profile(&self) -> Option<&ProfileSettings> {
        self.profile.as_ref()
    }

    /// Returns the profile settings, attaching empty settings first if
    /// none exist.
    ///
    /// Mutates the record on first access. Repeated calls return the same
    /// instance.
    pub fn profile_or_create(&mut self) -> &mut ProfileSettings {
        self.profile.get_or_insert_with(ProfileSettings::default)
    }

    /// Sets the role.
    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
    }

    /// Sets the active flag.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Sets or clears the expiration time.
    pub fn set_expiration_time(&mut self, expiration_time: Option<DateTime<Utc>>) {
        self.expiration_time = expiration_time;
    }

    /// Replaces the credential.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ImmutableCredential`] for memory, directory and
    /// placeholder users.
    pub fn change_credential(&mut self, credential: Credential) -> ModelResult<()> {
        if !self.variant().has_mutable_credential() {
            return Err(ModelError::ImmutableCredential { realm: self.realm });
        }
        self.credential = Some(credential);
        Ok(())
    }

    /// Builds the transfer representation.
    ///
    /// Credential material is never included.
    #[must_use]
    pub fn to_dto(&self) -> UserDto {
        UserDto {
            username: Some(self.username.clone()),
            realm: Some(self.realm),
            role: Some(self.role),
            active: Some(self.is_enabled()),
            expiration_time: self.expiration_time,
            settings: self.profile.as_ref().map(ProfileSettingsDto::from),
            password: None,
        }
    }
}

impl PartialEq for UserRecord {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
            && self.realm == other.realm
            && self.credential() == other.credential()
    }
}

impl Eq for UserRecord {}
