use std::sync::Arc;

use crate::core::error::StoreResult;
use crate::crypto::keyring::Keyring;
use crate::db::pool::Database;
use crate::models::user::{NewUser, User, UserUpdate};
use crate::stores::encrypted_store::EncryptedStore;
use crate::stores::user_store::SqliteUserStore;
use crate::stores::UserStore;

/// Typed entry point for `User` records.
///
/// Everything goes through the encryption decorator, so callers only ever
/// see plaintext.
#[derive(Clone)]
pub struct Users {
    store: Arc<dyn UserStore>,
}

impl Users {
    /// SQLite storage wrapped in field encryption.
    pub fn new(db: Arc<Database>, keyring: Keyring) -> Self {
        Self::from_store(EncryptedStore::new(SqliteUserStore::new(db), keyring))
    }

    pub fn from_store(store: impl UserStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn create(&self, input: NewUser) -> StoreResult<User> {
        self.store.create(input)
    }

    pub fn find_many(&self) -> StoreResult<Vec<User>> {
        self.store.find_many()
    }

    pub fn find_unique(&self, id: i64) -> StoreResult<Option<User>> {
        self.store.find_unique(id)
    }

    pub fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.store.find_by_email(email)
    }

    pub fn update(&self, id: i64, changes: UserUpdate) -> StoreResult<User> {
        self.store.update(id, changes)
    }
}
