//! Account management.
//!
//! Access rules:
//!
//! | Operation | Allowed for |
//! |-----------|-------------|
//! | create local user | admins |
//! | edit | admins (any user), everyone else only themselves |
//! | get single user | the owner and admins |
//! | list, delete | admins |
//!
//! Self edits may change profile settings and the password; changing the
//! password requires the current one whenever the record has a credential.
//! Admins may additionally change role, active flag and expiration time and
//! may set a password without knowing the current one.

use std::sync::Arc;

use sparky_core::{Event, EventType};
use sparky_model::{ChangePasswordDto, NewUserDto, ProfileSettingsDto, Realm, UserDto, UserRecord, UserRole};
use sparky_storage::UserStore;

use crate::error::{AuthError, AuthResult, IdentityError};
use crate::extraction::IdentityExtractor;
use crate::login::AuthenticatedCaller;
use crate::password::PasswordHasherService;
use crate::principal::Principal;

/// User management on behalf of an authenticated caller.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    extractor: IdentityExtractor,
    hasher: Arc<PasswordHasherService>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

impl UserService {
    /// Creates a user service.
    pub fn new(
        store: Arc<dyn UserStore>,
        extractor: IdentityExtractor,
        hasher: Arc<PasswordHasherService>,
    ) -> Self {
        Self {
            store,
            extractor,
            hasher,
        }
    }

    /// Creates a `LOCAL` user.
    ///
    /// # Errors
    ///
    /// `AccessDenied` for non-admins, `WeakPassword` for passwords the
    /// policy rejects, `UniquenessViolation` if the user exists.
    pub fn create_local_user(
        &self,
        caller: &AuthenticatedCaller,
        request: &NewUserDto,
    ) -> AuthResult<UserRecord> {
        require_admin(caller)?;

        let credential = self.hasher.hash_credential(&request.password)?;
        let user = self.extractor.factories().get(Realm::Local)?.create(
            &request.username,
            Some(credential),
            request.role.unwrap_or_default(),
            true,
        )?;

        if self.store.exists(&user)? {
            tracing::info!(username = %user.username(), "No user added: duplicate entry");
            return Err(IdentityError::UniquenessViolation {
                username: user.username().to_string(),
                realm: user.realm(),
            }
            .into());
        }

        let saved = self.store.save(&user)?;
        tracing::info!(username = %saved.username(), realm = %saved.realm(), "Created new user");
        Event::builder(EventType::CreateUser)
            .user(saved.username(), saved.realm())
            .actor(caller.actor())
            .emit();
        Ok(saved)
    }

    /// Applies an edit request and stores the result.
    ///
    /// # Errors
    ///
    /// `AccessDenied` when a non-admin edits someone else or supplies a
    /// wrong current password, `MissingData` if the request does not name
    /// a user, `UserNotFound` if the target does not exist,
    /// `ImmutableCredential` for password changes on directory users.
    pub fn edit(&self, caller: &AuthenticatedCaller, request: &UserDto) -> AuthResult<UserRecord> {
        let mut target = if caller.is_admin() {
            let mut target = self.extractor.extract_from_transfer_object(request)?;
            self.apply_admin_edit(&mut target, request)?;
            target
        } else if request
            .identity()
            .is_some_and(|(username, realm)| caller.is(username, realm))
        {
            let mut target = self.current_user(caller)?;
            self.apply_self_edit(&mut target, request)?;
            target
        } else {
            tracing::info!(
                actor = %caller.actor(),
                "User tries to modify the data of another user without admin privileges"
            );
            tracing::debug!(target_user = ?request.username, target_realm = ?request.realm, "Rejected edit target");
            return Err(AuthError::access_denied("not allowed to modify other users' data"));
        };

        target = self.store.save(&target)?;

        let event_type = if request.password.is_some() {
            EventType::UpdatePassword
        } else {
            EventType::UpdateUser
        };
        Event::builder(event_type)
            .user(target.username(), target.realm())
            .actor(caller.actor())
            .emit();
        Ok(target)
    }

    /// Loads a single user.
    ///
    /// # Errors
    ///
    /// `AccessDenied` unless the caller is the user or an admin,
    /// `UserNotFound` if it does not exist.
    pub fn get_user(
        &self,
        caller: &AuthenticatedCaller,
        realm: Realm,
        username: &str,
    ) -> AuthResult<UserRecord> {
        if !caller.is_admin() && !caller.is(username, realm) {
            return Err(AuthError::access_denied("only admins may view other users"));
        }
        Ok(self
            .extractor
            .extract_from_transfer_object(&UserDto::identifying(username, realm))?)
    }

    /// Lists all stored users.
    ///
    /// # Errors
    ///
    /// `AccessDenied` for non-admins, `StorageUnavailable` on store failure.
    pub fn list_all(&self, caller: &AuthenticatedCaller) -> AuthResult<Vec<UserRecord>> {
        require_admin(caller)?;
        Ok(self.store.find_all()?)
    }

    /// Lists the stored users of one realm.
    ///
    /// # Errors
    ///
    /// `AccessDenied` for non-admins, `StorageUnavailable` on store failure.
    pub fn list_realm(&self, caller: &AuthenticatedCaller, realm: Realm) -> AuthResult<Vec<UserRecord>> {
        require_admin(caller)?;
        Ok(self.store.find_all_in_realm(realm)?)
    }

    /// Deletes a user.
    ///
    /// # Errors
    ///
    /// `AccessDenied` for non-admins, `UserNotFound` if it does not exist.
    pub fn delete(&self, caller: &AuthenticatedCaller, realm: Realm, username: &str) -> AuthResult<()> {
        require_admin(caller)?;
        self.store.delete_by_username_and_realm(username, realm)?;

        tracing::info!(username, realm = %realm, actor = %caller.actor(), "Deleted user");
        Event::builder(EventType::DeleteUser)
            .user(username, realm)
            .actor(caller.actor())
            .emit();
        Ok(())
    }

    /// Loads the caller's stored record, bypassing the token snapshot.
    fn current_user(&self, caller: &AuthenticatedCaller) -> AuthResult<UserRecord> {
        let principal = Principal::Token(caller.claims.token_principal());
        self.extractor
            .extract_polymorphic(&principal)?
            .ok_or(AuthError::Identity(IdentityError::IdentityNotFound))
    }

    fn apply_admin_edit(&self, user: &mut UserRecord, request: &UserDto) -> AuthResult<()> {
        if let Some(role) = request.role {
            user.set_role(role);
        }
        if let Some(active) = request.active {
            user.set_active(active);
        }
        if let Some(expiration_time) = request.expiration_time {
            user.set_expiration_time(Some(expiration_time));
        }
        if let Some(settings) = &request.settings {
            apply_settings(user, settings);
        }
        if let Some(password) = &request.password {
            user.change_credential(self.hasher.hash_credential(&password.new_password)?)?;
        }
        Ok(())
    }

    fn apply_self_edit(&self, user: &mut UserRecord, request: &UserDto) -> AuthResult<()> {
        if let Some(settings) = &request.settings {
            apply_settings(user, settings);
        }
        if let Some(password) = &request.password {
            self.verify_current_password(user, password)?;
            user.change_credential(self.hasher.hash_credential(&password.new_password)?)?;
        }
        Ok(())
    }

    fn verify_current_password(&self, user: &UserRecord, request: &ChangePasswordDto) -> AuthResult<()> {
        let Some(credential) = user.credential() else {
            return Ok(());
        };
        let current = request.current_password.as_deref().unwrap_or_default();
        self.hasher
            .verify(current, credential)
            .map_err(|_| AuthError::access_denied("current password does not match"))
    }
}

fn require_admin(caller: &AuthenticatedCaller) -> AuthResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AuthError::access_denied(format!(
            "{} role required",
            UserRole::Admin.authority()
        )))
    }
}

/// Copies editable settings, creating the profile on first use.
fn apply_settings(user: &mut UserRecord, settings: &ProfileSettingsDto) {
    let profile = user.profile_or_create();
    if let Some(address) = &settings.email_address {
        profile.email_address = Some(address.clone());
    }
    if let Some(receive) = settings.email_receive {
        profile.email_receive = receive;
    }
}
