//! User store contract.

use std::sync::Arc;

use sparky_model::{Realm, UserRecord};

use crate::error::StorageResult;

/// Persistence operations on user records.
///
/// Implementations must be thread-safe. Every method is a single blocking
/// call; failures of the backing store are reported as
/// [`crate::StorageError::Unavailable`] and are not retried by callers.
pub trait UserStore: Send + Sync {
    /// Finds the record identified by `(username, realm)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no record matches.
    fn find_by_username_and_realm(&self, username: &str, realm: Realm) -> StorageResult<UserRecord>;

    /// Finds every record with the given username, ordered by identifier.
    fn find_all_by_username(&self, username: &str) -> StorageResult<Vec<UserRecord>>;

    /// Finds a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFoundById` if no record matches.
    fn find_by_id(&self, id: i64) -> StorageResult<UserRecord>;

    /// Lists every stored record.
    fn find_all(&self) -> StorageResult<Vec<UserRecord>>;

    /// Lists every stored record of one realm.
    fn find_all_in_realm(&self, realm: Realm) -> StorageResult<Vec<UserRecord>>;

    /// Checks whether a record with the same `(username, realm)` is stored.
    fn exists(&self, user: &UserRecord) -> StorageResult<bool>;

    /// Inserts or updates a record and returns the stored version.
    ///
    /// A record without an identifier is inserted and receives one. A
    /// record with an identifier replaces the stored row with that
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Duplicate` if a different row holds the same
    /// `(username, realm)`, and `StorageError::NotPersistable` for memory
    /// and placeholder users.
    fn save(&self, user: &UserRecord) -> StorageResult<UserRecord>;

    /// Deletes the record identified by `(username, realm)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no record matches.
    fn delete_by_username_and_realm(&self, username: &str, realm: Realm) -> StorageResult<()>;
}

impl<S: UserStore + ?Sized> UserStore for Arc<S> {
    fn find_by_username_and_realm(&self, username: &str, realm: Realm) -> StorageResult<UserRecord> {
        (**self).find_by_username_and_realm(username, realm)
    }

    fn find_all_by_username(&self, username: &str) -> StorageResult<Vec<UserRecord>> {
        (**self).find_all_by_username(username)
    }

    fn find_by_id(&self, id: i64) -> StorageResult<UserRecord> {
        (**self).find_by_id(id)
    }

    fn find_all(&self) -> StorageResult<Vec<UserRecord>> {
        (**self).find_all()
    }

    fn find_all_in_realm(&self, realm: Realm) -> StorageResult<Vec<UserRecord>> {
        (**self).find_all_in_realm(realm)
    }

    fn exists(&self, user: &UserRecord) -> StorageResult<bool> {
        (**self).exists(user)
    }

    fn save(&self, user: &UserRecord) -> StorageResult<UserRecord> {
        (**self).save(user)
    }

    fn delete_by_username_and_realm(&self, username: &str, realm: Realm) -> StorageResult<()> {
        (**self).delete_by_username_and_realm(username, realm)
    }
}
