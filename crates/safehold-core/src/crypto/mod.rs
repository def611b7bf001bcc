//! Cryptographic services for the vault.
//!
//! - [`encryptor`]: AES-CBC with a fresh random IV, payload `IV || ciphertext`
//! - [`hash`]: PBKDF2 key derivation and salted secret hashing
//! - [`session_key`]: the ephemeral, memory-protected key wrapping the store key

pub mod encryptor;
pub mod hash;
pub mod session_key;
mod thread_safety;

use thiserror::Error;

pub use encryptor::{IV_SIZE, decrypt, encrypt};
pub use hash::{HashAlgorithm, HashProvider, KdfParams, SaltedHash};
pub use session_key::{KeyAccessError, SessionKey};

/// Errors that can occur during cryptographic operations.
///
/// # Security Classification
///
/// CBC has no authentication tag, so a wrong key and tampered ciphertext
/// look the same: a padding failure here or a parse failure one layer up.
/// Both are marked `[INTEGRITY VIOLATION]`.
#[derive(Error, Debug)]
pub enum CryptoError {
    // =========================================================================
    // INTEGRITY VIOLATIONS
    // =========================================================================
    /// Padding was invalid after decryption.
    ///
    /// **[INTEGRITY VIOLATION]** Wrong key, or the ciphertext was modified.
    #[error("[INTEGRITY VIOLATION] Decryption failed - wrong key or corrupted data")]
    DecryptionFailed,

    /// The payload is too short or not a whole number of blocks.
    ///
    /// **[INTEGRITY VIOLATION]**
    #[error("Invalid ciphertext length {length}")]
    InvalidCiphertextLength { length: usize },

    // =========================================================================
    // PROGRAMMING ERRORS
    // =========================================================================
    /// AES keys must be 16, 24 or 32 bytes.
    ///
    /// **[PROGRAMMING ERROR]**
    #[error("Invalid key length {actual}: expected 16, 24 or 32 bytes")]
    InvalidKeyLength { actual: usize },

    /// Key derivation parameters are out of range.
    ///
    /// **[PROGRAMMING ERROR]**
    #[error("Invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    // =========================================================================
    // SYSTEM ERRORS
    // =========================================================================
    /// Key access failed due to a memory protection error or a poisoned lock.
    ///
    /// **[SYSTEM ERROR]**
    #[error("Key access failed: {0}")]
    KeyAccess(#[from] KeyAccessError),
}
