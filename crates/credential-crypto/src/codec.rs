//! ChaCha20-Poly1305 credential codec with HKDF-SHA256 key derivation.

use crate::{CredentialCodec, CredentialCryptoError, CryptoResult};
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// HKDF info string binding derived keys to this use.
const HKDF_INFO: &[u8] = b"pg2json-session-credentials-v1";

/// Nonce size for ChaCha20-Poly1305 (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Key size for ChaCha20-Poly1305 (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Poly1305 authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Production credential codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChaChaCredentialCodec;

impl ChaChaCredentialCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encrypt with a caller-provided nonce.
    ///
    /// Only meant for deterministic tests; production callers go through
    /// [`CredentialCodec::encrypt`], which draws a fresh nonce.
    pub fn encrypt_with_nonce(
        &self,
        plaintext: &[u8],
        secret: &str,
        nonce: &[u8; NONCE_SIZE],
    ) -> CryptoResult<String> {
        let cipher = cipher_for(secret)
            .map_err(|e| match e {
                CredentialCryptoError::EmptySecret => e,
                other => CredentialCryptoError::Encrypt(other.to_string()),
            })?;

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|e| CredentialCryptoError::Encrypt(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(nonce);
        sealed.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(sealed))
    }
}

impl CredentialCodec for ChaChaCredentialCodec {
    fn encrypt(&self, plaintext: &[u8], secret: &str) -> CryptoResult<String> {
        let mut nonce = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce);
        self.encrypt_with_nonce(plaintext, secret, &nonce)
    }

    fn decrypt(&self, ciphertext: &str, secret: &str) -> CryptoResult<Vec<u8>> {
        let sealed = BASE64
            .decode(ciphertext.trim())
            .map_err(|e| CredentialCryptoError::Malformed(e.to_string()))?;

        if sealed.len() < NONCE_SIZE {
            return Err(CredentialCryptoError::Truncated {
                expected: NONCE_SIZE,
                actual: sealed.len(),
            });
        }

        let cipher = cipher_for(secret).map_err(|e| match e {
            CredentialCryptoError::EmptySecret => e,
            other => CredentialCryptoError::Decrypt(other.to_string()),
        })?;

        let (nonce, body) = sealed.split_at(NONCE_SIZE);
        cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|e| CredentialCryptoError::Decrypt(e.to_string()))
    }
}

/// Derive the symmetric key for `secret` and build the cipher.
fn cipher_for(secret: &str) -> CryptoResult<ChaCha20Poly1305> {
    if secret.is_empty() {
        return Err(CredentialCryptoError::EmptySecret);
    }

    let hkdf = Hkdf::<Sha256>::new(None, secret.as_bytes());
    let mut key = [0u8; KEY_SIZE];
    hkdf.expand(HKDF_INFO, &mut key)
        .map_err(|e| CredentialCryptoError::Encrypt(format!("HKDF expand failed: {e}")))?;

    Ok(ChaCha20Poly1305::new(Key::from_slice(&key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] =
        br#"{"host":"db.internal","port":5432,"username":"app","password":"hunter2","databaseName":"shop","sslModeEnabled":false}"#;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let codec = ChaChaCredentialCodec::new();

        let sealed = codec.encrypt(PAYLOAD, "dxc3hve7mwfJEU9q").unwrap();
        let opened = codec.decrypt(&sealed, "dxc3hve7mwfJEU9q").unwrap();

        assert_eq!(opened, PAYLOAD);
    }

    #[test]
    fn test_encrypt_is_not_deterministic() {
        let codec = ChaChaCredentialCodec::new();

        let a = codec.encrypt(PAYLOAD, "secret").unwrap();
        let b = codec.encrypt(PAYLOAD, "secret").unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_nonce_is_deterministic() {
        let codec = ChaChaCredentialCodec::new();
        let nonce = [3u8; NONCE_SIZE];

        let a = codec.encrypt_with_nonce(PAYLOAD, "secret", &nonce).unwrap();
        let b = codec.encrypt_with_nonce(PAYLOAD, "secret", &nonce).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_output_is_nonce_prefixed() {
        let codec = ChaChaCredentialCodec::new();
        let nonce = [9u8; NONCE_SIZE];

        let sealed = codec.encrypt_with_nonce(b"abc", "secret", &nonce).unwrap();
        let raw = BASE64.decode(sealed).unwrap();

        assert_eq!(&raw[..NONCE_SIZE], &nonce);
        assert_eq!(raw.len(), NONCE_SIZE + 3 + TAG_SIZE);
    }

    #[test]
    fn test_wrong_secret_fails() {
        let codec = ChaChaCredentialCodec::new();
        let sealed = codec.encrypt(PAYLOAD, "secret-one").unwrap();

        let err = codec.decrypt(&sealed, "secret-two").unwrap_err();
        assert!(matches!(err, CredentialCryptoError::Decrypt(_)));
    }

    #[test]
    fn test_every_tampered_byte_is_rejected() {
        let codec = ChaChaCredentialCodec::new();
        let sealed = codec.encrypt(b"short payload", "secret").unwrap();
        let raw = BASE64.decode(&sealed).unwrap();

        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let result = codec.decrypt(&BASE64.encode(&tampered), "secret");
            assert!(result.is_err(), "byte {i} flip was accepted");
        }
    }

    #[test]
    fn test_malformed_encoding_fails() {
        let codec = ChaChaCredentialCodec::new();

        let err = codec.decrypt("not base64 at all!", "secret").unwrap_err();
        assert!(matches!(err, CredentialCryptoError::Malformed(_)));
    }

    #[test]
    fn test_truncated_input_fails() {
        let codec = ChaChaCredentialCodec::new();
        let short = BASE64.encode([0u8; 5]);

        let err = codec.decrypt(&short, "secret").unwrap_err();
        assert_eq!(
            err,
            CredentialCryptoError::Truncated {
                expected: NONCE_SIZE,
                actual: 5
            }
        );
    }

    #[test]
    fn test_nonce_only_input_fails_authentication() {
        let codec = ChaChaCredentialCodec::new();
        let nonce_only = BASE64.encode([0u8; NONCE_SIZE]);

        let err = codec.decrypt(&nonce_only, "secret").unwrap_err();
        assert!(matches!(err, CredentialCryptoError::Decrypt(_)));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let codec = ChaChaCredentialCodec::new();

        assert_eq!(
            codec.encrypt(PAYLOAD, "").unwrap_err(),
            CredentialCryptoError::EmptySecret
        );
    }
}
