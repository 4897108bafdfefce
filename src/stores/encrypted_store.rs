//! Transparent field encryption around any `UserStore`.
//!
//! Every value passed to the inner store goes through
//! [`EncryptedStore::encrypt_on_write`] and every record coming back goes
//! through [`EncryptedStore::decrypt_on_read`]. Which columns are touched is
//! declared once per record type by [`SensitiveFields`], so callers never
//! mention encryption.
//!
//! `NULL` and the empty string are stored unchanged. Any other stored value
//! must be a valid envelope for a configured key; otherwise the read fails
//! with `StoreError::Decryption`.

use tracing::warn;

use crate::core::error::{StoreError, StoreResult};
use crate::crypto::keyring::Keyring;
use crate::models::user::{NewUser, User, UserUpdate};
use crate::stores::{SensitiveFields, UserStore};

pub struct EncryptedStore<S> {
    inner: S,
    keyring: Keyring,
}

impl<S: UserStore> EncryptedStore<S> {
    pub fn new(inner: S, keyring: Keyring) -> Self {
        Self { inner, keyring }
    }

    #[cfg(test)]
    fn inner(&self) -> &S {
        &self.inner
    }

    /// Replace each non-empty sensitive value with its ciphertext envelope.
    pub fn encrypt_on_write<T: SensitiveFields>(&self, mut record: T) -> StoreResult<T> {
        for (field, slot) in record.sensitive_fields_mut() {
            if let Some(plaintext) = slot.as_deref().filter(|v| !v.is_empty()) {
                let sealed = self
                    .keyring
                    .encrypt(plaintext)
                    .map_err(|source| StoreError::Encryption { field, source })?;
                *slot = Some(sealed);
            }
        }
        Ok(record)
    }

    /// Replace each stored envelope with the plaintext it protects.
    pub fn decrypt_on_read<T: SensitiveFields>(&self, mut record: T) -> StoreResult<T> {
        for (field, slot) in record.sensitive_fields_mut() {
            if let Some(stored) = slot.as_deref().filter(|v| !v.is_empty()) {
                let plaintext = self.keyring.decrypt(stored).map_err(|source| {
                    warn!(field, error = %source, "Failed to decrypt stored field");
                    StoreError::Decryption { field, source }
                })?;
                *slot = Some(plaintext);
            }
        }
        Ok(record)
    }
}

impl<S: UserStore> UserStore for EncryptedStore<S> {
    fn create(&self, input: NewUser) -> StoreResult<User> {
        let sealed = self.encrypt_on_write(input)?;
        let stored = self.inner.create(sealed)?;
        self.decrypt_on_read(stored)
    }

    fn find_many(&self) -> StoreResult<Vec<User>> {
        self.inner
            .find_many()?
            .into_iter()
            .map(|user| self.decrypt_on_read(user))
            .collect()
    }

    fn find_unique(&self, id: i64) -> StoreResult<Option<User>> {
        self.inner
            .find_unique(id)?
            .map(|user| self.decrypt_on_read(user))
            .transpose()
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner
            .find_by_email(email)?
            .map(|user| self.decrypt_on_read(user))
            .transpose()
    }

    fn update(&self, id: i64, changes: UserUpdate) -> StoreResult<User> {
        let sealed = self.encrypt_on_write(changes)?;
        let stored = self.inner.update(id, sealed)?;
        self.decrypt_on_read(stored)
    }
}
