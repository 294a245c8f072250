//! Process-local user store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use parking_lot::RwLock;
use sparky_model::{Realm, UserRecord};

use crate::error::{StorageError, StorageResult};
use crate::user::UserStore;

/// User store keeping records in a map ordered by identifier.
///
/// Writes take the map's write lock, so the uniqueness check and the
/// insert happen atomically. Lookups by username return records in
/// identifier order, which makes "first match" deterministic.
#[derive(Debug)]
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<i64, UserRecord>>,
    next_id: AtomicI64,
    available: AtomicBool,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            available: AtomicBool::new(true),
        }
    }

    /// Marks the store reachable or unreachable.
    ///
    /// While unreachable, every operation fails with
    /// [`StorageError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Checks whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("in-memory store is offline".to_string()))
        }
    }

    fn collect<F>(&self, filter: F) -> StorageResult<Vec<UserRecord>>
    where
        F: Fn(&UserRecord) -> bool,
    {
        self.ensure_available()?;
        Ok(self
            .users
            .read()
            .values()
            .filter(|user| filter(user))
            .cloned()
            .collect())
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_username_and_realm(&self, username: &str, realm: Realm) -> StorageResult<UserRecord> {
        self.ensure_available()?;
        self.users
            .read()
            .values()
            .find(|user| user.has_identity(username, realm))
            .cloned()
            .ok_or_else(|| StorageError::not_found(username, realm))
    }

    fn find_all_by_username(&self, username: &str) -> StorageResult<Vec<UserRecord>> {
        self.collect(|user| user.username() == username)
    }

    fn find_by_id(&self, id: i64) -> StorageResult<UserRecord> {
        self.ensure_available()?;
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFoundById(id))
    }

    fn find_all(&self) -> StorageResult<Vec<UserRecord>> {
        self.collect(|_| true)
    }

    fn find_all_in_realm(&self, realm: Realm) -> StorageResult<Vec<UserRecord>> {
        self.collect(|user| user.realm() == realm)
    }

    fn exists(&self, user: &UserRecord) -> StorageResult<bool> {
        self.ensure_available()?;
        Ok(self
            .users
            .read()
            .values()
            .any(|stored| stored.has_identity(user.username(), user.realm())))
    }

    fn save(&self, user: &UserRecord) -> StorageResult<UserRecord> {
        self.ensure_available()?;
        if !user.is_persistable() {
            return Err(StorageError::NotPersistable(user.realm()));
        }

        let mut users = self.users.write();
        let conflict = users
            .iter()
            .any(|(id, stored)| {
                Some(*id) != user.id() && stored.has_identity(user.username(), user.realm())
            });
        if conflict {
            return Err(StorageError::duplicate(user.username(), user.realm()));
        }

        let id = match user.id() {
            Some(id) => {
                self.next_id.fetch_max(id + 1, Ordering::SeqCst);
                id
            }
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        let stored = user.clone().with_id(id);
        users.insert(id, stored.clone());

        tracing::debug!(id, username = %user.username(), realm = %user.realm(), "User stored");
        Ok(stored)
    }

    fn delete_by_username_and_realm(&self, username: &str, realm: Realm) -> StorageResult<()> {
        self.ensure_available()?;
        let mut users = self.users.write();
        let id = users
            .iter()
            .find(|(_, user)| user.has_identity(username, realm))
            .map(|(id, _)| *id)
            .ok_or_else(|| StorageError::not_found(username, realm))?;
        users.remove(&id);

        tracing::debug!(id, username, realm = %realm, "User deleted");
        Ok(())
    }
}
