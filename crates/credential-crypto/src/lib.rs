//! Credential encryption for pg2json sessions.
//!
//! Session credentials are sealed with ChaCha20-Poly1305 under a key derived
//! from a caller-supplied secret. The secret is never stored: it is passed to
//! every `encrypt`/`decrypt` call and dropped afterwards.
//!
//! Wire format (base64, standard alphabet):
//!
//! ```text
//! nonce(12) || ciphertext || tag(16)
//! ```

mod codec;

pub use codec::{ChaChaCredentialCodec, KEY_SIZE, NONCE_SIZE, TAG_SIZE};

use thiserror::Error;

/// Errors returned by credential codecs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialCryptoError {
    /// The secret was empty, so no key can be derived from it.
    #[error("encryption secret must not be empty")]
    EmptySecret,

    /// Key derivation or cipher construction failed.
    #[error("encryption failed: {0}")]
    Encrypt(String),

    /// The ciphertext is not valid base64.
    #[error("malformed ciphertext encoding: {0}")]
    Malformed(String),

    /// The decoded ciphertext is too short to contain a nonce.
    #[error("ciphertext too short: need at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Authentication failed (wrong secret or tampered ciphertext).
    #[error("decryption failed: {0}")]
    Decrypt(String),
}

/// Result type for credential codec operations.
pub type CryptoResult<T> = Result<T, CredentialCryptoError>;

/// Symmetric, authenticated encryption of serialized credentials.
///
/// Implementations must be non-deterministic (fresh nonce per call) and must
/// never return unauthenticated plaintext.
pub trait CredentialCodec: Send + Sync {
    /// Seal `plaintext` under `secret`, returning a printable ciphertext.
    fn encrypt(&self, plaintext: &[u8], secret: &str) -> CryptoResult<String>;

    /// Open a ciphertext produced by [`CredentialCodec::encrypt`].
    fn decrypt(&self, ciphertext: &str, secret: &str) -> CryptoResult<Vec<u8>>;
}
