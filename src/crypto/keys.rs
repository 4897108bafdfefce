//! Field encryption keys.
//!
//! A key is written as `k1.<algorithm>.<base64 32 bytes>`, for example
//! `k1.aesgcm256.AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=`. A bare
//! 64-char hex string is also accepted and treated as an AES-256-GCM key.
//! Every key is identified by a short fingerprint that is embedded in each
//! ciphertext it produces, so the right key can be picked on decryption.
//! The fingerprint covers the algorithm as well as the key bytes.

use aes_gcm::{
    aead::{Aead, KeyInit, Nonce},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::core::error::CipherError;

/// Key size shared by both algorithms (256 bits).
pub const KEY_SIZE: usize = 32;

/// Nonce size shared by both algorithms (96 bits).
pub const NONCE_SIZE: usize = 12;

const KEY_PREFIX: &str = "k1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl Algorithm {
    pub fn identifier(&self) -> &'static str {
        match self {
            Algorithm::Aes256Gcm => "aesgcm256",
            Algorithm::ChaCha20Poly1305 => "chacha20poly1305",
        }
    }

    pub fn from_identifier(identifier: &str) -> Result<Self, CipherError> {
        match identifier {
            "aesgcm256" => Ok(Algorithm::Aes256Gcm),
            "chacha20poly1305" => Ok(Algorithm::ChaCha20Poly1305),
            other => Err(CipherError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

#[derive(Clone)]
pub struct FieldKey {
    algorithm: Algorithm,
    bytes: [u8; KEY_SIZE],
    fingerprint: String,
}

impl FieldKey {
    pub fn new(algorithm: Algorithm, bytes: [u8; KEY_SIZE]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(algorithm.identifier().as_bytes());
        hasher.update(b":");
        hasher.update(bytes);
        let digest = hasher.finalize();

        Self {
            algorithm,
            bytes,
            fingerprint: hex::encode(&digest[..4]),
        }
    }

    /// Generate a random key.
    pub fn generate(algorithm: Algorithm) -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self::new(algorithm, bytes)
    }

    /// Parse `k1.<algorithm>.<base64>` or a 64-char hex AES key.
    pub fn parse(value: &str) -> Result<Self, CipherError> {
        let value = value.trim();

        if !value.contains('.') {
            let bytes = hex::decode(value)
                .map_err(|e| CipherError::InvalidKey(format!("invalid hex: {}", e)))?;
            return Ok(Self::new(Algorithm::Aes256Gcm, to_key_bytes(&bytes)?));
        }

        let parts: Vec<&str> = value.split('.').collect();
        if parts.len() != 3 || parts[0] != KEY_PREFIX {
            return Err(CipherError::InvalidKey(
                "expected k1.<algorithm>.<base64 key>".to_string(),
            ));
        }

        let algorithm = Algorithm::from_identifier(parts[1])?;
        let bytes = STANDARD
            .decode(parts[2])
            .map_err(|e| CipherError::InvalidKey(format!("invalid base64: {}", e)))?;

        Ok(Self::new(algorithm, to_key_bytes(&bytes)?))
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Serialized form accepted by [`FieldKey::parse`].
    pub fn to_key_string(&self) -> String {
        format!(
            "{}.{}.{}",
            KEY_PREFIX,
            self.algorithm.identifier(),
            STANDARD.encode(self.bytes)
        )
    }

    /// Encrypt with a fresh random nonce. Returns `(nonce, ciphertext || tag)`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<([u8; NONCE_SIZE], Vec<u8>), CipherError> {
        let mut nonce = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce);

        let ciphertext = match self.algorithm {
            Algorithm::Aes256Gcm => seal_with::<Aes256Gcm>(&self.bytes, &nonce, plaintext)?,
            Algorithm::ChaCha20Poly1305 => {
                seal_with::<ChaCha20Poly1305>(&self.bytes, &nonce, plaintext)?
            }
        };

        Ok((nonce, ciphertext))
    }

    pub fn open(&self, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        match self.algorithm {
            Algorithm::Aes256Gcm => open_with::<Aes256Gcm>(&self.bytes, nonce, ciphertext),
            Algorithm::ChaCha20Poly1305 => {
                open_with::<ChaCha20Poly1305>(&self.bytes, nonce, ciphertext)
            }
        }
    }
}

// Never print key material.
impl fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldKey")
            .field("algorithm", &self.algorithm)
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

fn to_key_bytes(bytes: &[u8]) -> Result<[u8; KEY_SIZE], CipherError> {
    if bytes.len() != KEY_SIZE {
        return Err(CipherError::InvalidKey(format!(
            "expected {} bytes, got {}",
            KEY_SIZE,
            bytes.len()
        )));
    }

    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(bytes);
    Ok(key)
}

fn seal_with<C: KeyInit + Aead>(
    key: &[u8],
    nonce: &[u8; NONCE_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let cipher =
        C::new_from_slice(key).map_err(|e| CipherError::InvalidKey(e.to_string()))?;

    cipher
        .encrypt(Nonce::<C>::from_slice(&nonce[..]), plaintext)
        .map_err(|_| CipherError::EncryptionFailed)
}

fn open_with<C: KeyInit + Aead>(
    key: &[u8],
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let cipher =
        C::new_from_slice(key).map_err(|e| CipherError::InvalidKey(e.to_string()))?;

    cipher
        .decrypt(Nonce::<C>::from_slice(&nonce[..]), ciphertext)
        .map_err(|_| CipherError::AuthenticationFailed)
}
