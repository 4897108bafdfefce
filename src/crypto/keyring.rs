use std::collections::HashMap;

use crate::core::error::CipherError;
use crate::crypto::envelope::Envelope;
use crate::crypto::keys::FieldKey;

/// The set of keys a process may use.
///
/// New values are always sealed with the encryption key. Decryption looks
/// up the key by the fingerprint recorded in the envelope, so values written
/// under a retired key stay readable while it is listed as a decryption key.
#[derive(Debug, Clone)]
pub struct Keyring {
    encryption_key: FieldKey,
    decryption_keys: HashMap<String, FieldKey>,
}

impl Keyring {
    pub fn new(encryption_key: FieldKey) -> Self {
        let mut decryption_keys = HashMap::new();
        decryption_keys.insert(encryption_key.fingerprint().to_string(), encryption_key.clone());

        Self {
            encryption_key,
            decryption_keys,
        }
    }

    pub fn with_decryption_key(mut self, key: FieldKey) -> Self {
        self.decryption_keys
            .entry(key.fingerprint().to_string())
            .or_insert(key);
        self
    }

    pub fn from_strings(encryption_key: &str, decryption_keys: &[String]) -> Result<Self, CipherError> {
        let mut keyring = Keyring::new(FieldKey::parse(encryption_key)?);
        for key in decryption_keys {
            keyring = keyring.with_decryption_key(FieldKey::parse(key)?);
        }
        Ok(keyring)
    }

    pub fn encryption_fingerprint(&self) -> &str {
        self.encryption_key.fingerprint()
    }

    /// Number of keys accepted for decryption, the encryption key included.
    pub fn decryption_key_count(&self) -> usize {
        self.decryption_keys.len()
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let (nonce, ciphertext) = self.encryption_key.seal(plaintext.as_bytes())?;

        let envelope = Envelope {
            algorithm: self.encryption_key.algorithm(),
            fingerprint: self.encryption_key.fingerprint().to_string(),
            nonce,
            ciphertext,
        };

        Ok(envelope.to_string())
    }

    pub fn decrypt(&self, stored: &str) -> Result<String, CipherError> {
        let envelope = Envelope::parse(stored)?;

        let key = self
            .decryption_keys
            .get(&envelope.fingerprint)
            .ok_or_else(|| CipherError::UnknownKey(envelope.fingerprint.clone()))?;

        if key.algorithm() != envelope.algorithm {
            return Err(CipherError::MalformedCiphertext(format!(
                "key {} is {}, ciphertext says {}",
                key.fingerprint(),
                key.algorithm(),
                envelope.algorithm
            )));
        }

        let plaintext = key.open(&envelope.nonce, &envelope.ciphertext)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }
}
