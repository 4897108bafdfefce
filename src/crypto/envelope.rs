use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

use crate::core::error::CipherError;
use crate::crypto::keys::{Algorithm, NONCE_SIZE};

const ENVELOPE_VERSION: &str = "v1";

/// Self-describing ciphertext as it is stored in a column:
/// `v1.<algorithm>.<key fingerprint>.<base64 nonce>.<base64 ciphertext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub algorithm: Algorithm,
    pub fingerprint: String,
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn parse(value: &str) -> Result<Self, CipherError> {
        let parts: Vec<&str> = value.split('.').collect();

        if parts.len() != 5 {
            return Err(CipherError::MalformedCiphertext(format!(
                "expected 5 segments, got {}",
                parts.len()
            )));
        }

        if parts[0] != ENVELOPE_VERSION {
            return Err(CipherError::MalformedCiphertext(format!(
                "unknown version '{}'",
                parts[0]
            )));
        }

        let algorithm = Algorithm::from_identifier(parts[1])?;

        let fingerprint = parts[2];
        if fingerprint.is_empty() || hex::decode(fingerprint).is_err() {
            return Err(CipherError::MalformedCiphertext(
                "invalid key fingerprint".to_string(),
            ));
        }

        let nonce_bytes = STANDARD
            .decode(parts[3])
            .map_err(|e| CipherError::MalformedCiphertext(format!("invalid nonce: {}", e)))?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(CipherError::MalformedCiphertext(format!(
                "nonce must be {} bytes, got {}",
                NONCE_SIZE,
                nonce_bytes.len()
            )));
        }
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&nonce_bytes);

        let ciphertext = STANDARD
            .decode(parts[4])
            .map_err(|e| CipherError::MalformedCiphertext(format!("invalid payload: {}", e)))?;

        Ok(Self {
            algorithm,
            fingerprint: fingerprint.to_string(),
            nonce,
            ciphertext,
        })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}",
            ENVELOPE_VERSION,
            self.algorithm.identifier(),
            self.fingerprint,
            STANDARD.encode(self.nonce),
            STANDARD.encode(&self.ciphertext)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Envelope {
        Envelope {
            algorithm: Algorithm::Aes256Gcm,
            fingerprint: "deadbeef".to_string(),
            nonce: [7u8; NONCE_SIZE],
            ciphertext: vec![1, 2, 3, 4, 5],
        }
    }

    #[test]
    fn test_display_format() {
        let text = sample().to_string();
        assert!(text.starts_with("v1.aesgcm256.deadbeef."));
        assert_eq!(text.split('.').count(), 5);
    }

    #[test]
    fn test_parse_display_output() {
        let envelope = sample();
        assert_eq!(Envelope::parse(&envelope.to_string()).unwrap(), envelope);
    }

    #[test]
    fn test_rejects_plaintext() {
        assert!(matches!(
            Envelope::parse("10000-10000-001"),
            Err(CipherError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let text = sample().to_string().replacen("v1", "v9", 1);
        assert!(Envelope::parse(&text).is_err());
    }

    #[test]
    fn test_rejects_short_nonce() {
        let text = "v1.aesgcm256.deadbeef.AAAA.AQIDBAU=";
        assert!(matches!(
            Envelope::parse(text),
            Err(CipherError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn test_rejects_bad_base64_payload() {
        let mut text = sample().to_string();
        text.push_str("!!");
        assert!(Envelope::parse(&text).is_err());
    }
}
