//! Transfer objects exchanged with API clients.
//!
//! Transfer objects never carry stored credential material. Identifying
//! fields are optional because clients routinely send partial objects;
//! consumers decide which fields they require.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::ProfileSettings;
use crate::realm::Realm;
use crate::role::UserRole;

/// Serializable view of a user, also used as an edit request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    /// Username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Realm owning the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<Realm>,
    /// Role of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Whether the account is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Point in time after which the account is expired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,
    /// Profile settings. Absent fields are left unchanged on edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ProfileSettingsDto>,
    /// Requested password change. Never populated on output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<ChangePasswordDto>,
}

impl UserDto {
    /// Creates a transfer object identifying a user.
    #[must_use]
    pub fn identifying(username: impl Into<String>, realm: Realm) -> Self {
        Self {
            username: Some(username.into()),
            realm: Some(realm),
            ..Self::default()
        }
    }

    /// Returns the identifying `(username, realm)` pair when both are
    /// present and the username is non-empty.
    #[must_use]
    pub fn identity(&self) -> Option<(&str, Realm)> {
        match (self.username.as_deref(), self.realm) {
            (Some(username), Some(realm)) if !username.is_empty() => Some((username, realm)),
            _ => None,
        }
    }
}

/// Profile settings as sent by clients; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettingsDto {
    /// Contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    /// Notification preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_receive: Option<bool>,
}

impl From<&ProfileSettings> for ProfileSettingsDto {
    fn from(settings: &ProfileSettings) -> Self {
        Self {
            email_address: settings.email_address.clone(),
            email_receive: Some(settings.email_receive),
        }
    }
}

/// Password change request.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordDto {
    /// Current password. Required unless an administrator edits the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    /// New password.
    pub new_password: String,
}

impl std::fmt::Debug for ChangePasswordDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordDto")
            .field("current_password", &self.current_password.as_ref().map(|_| "[REDACTED]"))
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}

/// Request to create a new local user.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserDto {
    /// Username, unique within the local realm.
    pub username: String,
    /// Initial password.
    pub password: String,
    /// Role, [`UserRole::Default`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl std::fmt::Debug for NewUserDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUserDto")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}
