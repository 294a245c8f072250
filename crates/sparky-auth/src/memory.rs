//! Configured in-memory users.
//!
//! Service accounts and bootstrap administrators are declared in the
//! configuration, built through the `MEMORY` factory at startup and never
//! written to a store.

use std::collections::HashMap;

use sparky_core::MemoryUserSettings;
use sparky_model::{Credential, Realm, UserRecord};

use crate::error::IdentityResult;
use crate::factory::FactoryRegistry;

/// The `MEMORY` realm's user table.
#[derive(Debug, Clone, Default)]
pub struct MemoryRealm {
    users: HashMap<String, UserRecord>,
}

impl MemoryRealm {
    /// Builds the realm from configured users.
    ///
    /// A later entry with the same username replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Fails if no `MEMORY` factory is registered or a username is empty.
    pub fn from_settings(
        settings: &[MemoryUserSettings],
        factories: &FactoryRegistry,
    ) -> IdentityResult<Self> {
        let factory = factories.get(Realm::Memory)?;
        let mut users = HashMap::with_capacity(settings.len());

        for entry in settings {
            let user = factory.create(
                &entry.username,
                Some(Credential::plain(entry.password.as_str())),
                entry.role,
                true,
            )?;
            if users.insert(entry.username.clone(), user).is_some() {
                tracing::warn!(username = %entry.username, "Memory user configured twice, keeping the last entry");
            }
        }

        tracing::info!(count = users.len(), "Memory realm initialized");
        Ok(Self { users })
    }

    /// Looks up a user by exact username.
    #[must_use]
    pub fn find(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    /// Returns all configured users.
    pub fn users(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.values()
    }

    /// Number of configured users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Checks whether no users are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
