//! PII field encryption
//!
//! Sensitive columns (phone numbers, addresses, tax ids, salaries) are
//! encrypted at rest with AES-256-GCM. Values are stored as
//! `base64(nonce || ciphertext)`. Decryption is tolerant of legacy plaintext
//! rows: anything that does not decrypt comes back unchanged.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Invalid field key: {0}")]
    InvalidKey(String),
    #[error("Encryption failed")]
    EncryptionFailed,
}

/// Encrypts and decrypts string fields. Built once from configuration and
/// shared behind an `Arc`. An empty key disables encryption entirely and
/// both operations become identity.
pub struct FieldCipher {
    cipher: Option<Aes256Gcm>,
}

impl FieldCipher {
    /// `key_b64` is a base64-encoded 32-byte key, or empty to disable.
    pub fn new(key_b64: &str) -> Result<Self, CipherError> {
        if key_b64.is_empty() {
            return Ok(Self { cipher: None });
        }
        let key_bytes = BASE64
            .decode(key_b64)
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        if key_bytes.len() != 32 {
            return Err(CipherError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                key_bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self { cipher: Some(Aes256Gcm::new(key)) })
    }

    pub fn is_enabled(&self) -> bool {
        self.cipher.is_some()
    }

    /// Empty values and disabled ciphers pass the input through.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let Some(cipher) = &self.cipher else {
            return Ok(plaintext.to_string());
        };
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    /// Returns the input unchanged when it is not a ciphertext this cipher
    /// produced, so rows written before encryption was enabled stay readable.
    pub fn decrypt(&self, value: &str) -> String {
        let Some(cipher) = &self.cipher else {
            return value.to_string();
        };
        if value.is_empty() {
            return String::new();
        }
        let Ok(raw) = BASE64.decode(value) else {
            return value.to_string();
        };
        if raw.len() <= NONCE_LEN {
            return value.to_string();
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        match cipher.decrypt(Nonce::from_slice(nonce), ciphertext) {
            Ok(plain) => String::from_utf8(plain).unwrap_or_else(|_| value.to_string()),
            Err(_) => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> FieldCipher {
        let key = BASE64.encode([7u8; 32]);
        FieldCipher::new(&key).unwrap()
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let c = cipher();
        let ct = c.encrypt("+55 11 91234-5678").unwrap();
        assert_ne!(ct, "+55 11 91234-5678");
        assert_eq!(c.decrypt(&ct), "+55 11 91234-5678");
    }

    #[test]
    fn legacy_plaintext_passes_through() {
        let c = cipher();
        assert_eq!(c.decrypt("not encrypted"), "not encrypted");
    }

    #[test]
    fn empty_values_stay_empty() {
        let c = cipher();
        assert_eq!(c.encrypt("").unwrap(), "");
        assert_eq!(c.decrypt(""), "");
    }

    #[test]
    fn disabled_cipher_is_identity() {
        let c = FieldCipher::new("").unwrap();
        assert!(!c.is_enabled());
        assert_eq!(c.encrypt("raw").unwrap(), "raw");
        assert_eq!(c.decrypt("raw"), "raw");
    }

    #[test]
    fn wrong_size_key_rejected() {
        let short = BASE64.encode([1u8; 16]);
        assert!(FieldCipher::new(&short).is_err());
    }
}
