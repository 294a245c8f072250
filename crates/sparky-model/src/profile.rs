//! Per-user profile settings.

use serde::{Deserialize, Serialize};

/// Editable personal settings attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettings {
    /// Contact address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    /// Whether the user wants to receive notification mails.
    #[serde(default)]
    pub email_receive: bool,
}

impl ProfileSettings {
    /// Creates empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the contact address.
    #[must_use]
    pub fn with_email_address(mut self, address: impl Into<String>) -> Self {
        self.email_address = Some(address.into());
        self
    }

    /// Sets the notification preference.
    #[must_use]
    pub const fn with_email_receive(mut self, receive: bool) -> Self {
        self.email_receive = receive;
        self
    }
}
