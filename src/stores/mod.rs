pub mod encrypted_store;
pub mod user_store;
pub mod users;

use crate::core::error::StoreResult;
use crate::models::user::{NewUser, User, UserUpdate};

/// Storage client for `User` records.
///
/// Implementations either talk to the database directly or decorate another
/// store, as [`encrypted_store::EncryptedStore`] does.
pub trait UserStore: Send + Sync {
    /// Insert one record. Fails with `UniqueConstraint` on a duplicate email.
    fn create(&self, input: NewUser) -> StoreResult<User>;

    /// Every record, in storage order.
    fn find_many(&self) -> StoreResult<Vec<User>>;

    fn find_unique(&self, id: i64) -> StoreResult<Option<User>>;

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Apply a partial update. Fails with `NotFound` for an unknown id.
    fn update(&self, id: i64, changes: UserUpdate) -> StoreResult<User>;
}

/// Record types that carry columns sealed at rest.
pub trait SensitiveFields {
    /// Column name and value slot of every sensitive field.
    fn sensitive_fields_mut(&mut self) -> Vec<(&'static str, &mut Option<String>)>;
}
