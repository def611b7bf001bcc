use std::fmt;
use std::sync::RwLock;

use memsafe::MemSafe;
use rand::RngCore;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroize;

use super::{CryptoError, encryptor};
use crate::memory::SecureBuffer;

/// Size of a session key in bytes.
pub const SESSION_KEY_SIZE: usize = 32;

/// Failure to reach the session key.
#[derive(Debug, Error)]
pub enum KeyAccessError {
    /// The protected mapping could not be made readable.
    #[error("Session key memory could not be accessed: {0}")]
    MemoryProtection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A thread panicked while using the session key.
    #[error("Session key lock was poisoned")]
    LockPoisoned,
}

impl KeyAccessError {
    pub fn memory_protection<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        KeyAccessError::MemoryProtection(Box::new(err))
    }
}

enum KeyStorage {
    /// `PROT_NONE` mapping, readable only inside `with_key`.
    Protected(MemSafe<[u8; SESSION_KEY_SIZE]>),
    /// Used when the platform refuses a protected mapping.
    Buffer(SecureBuffer),
}

/// Ephemeral 256-bit key that wraps the store key for one session.
///
/// # Security
///
/// The key normally lives in a `memsafe::MemSafe` region: locked in RAM,
/// excluded from core dumps on Linux, and mapped `PROT_NONE` except while
/// [`with_key`](Self::with_key) is running. If that region cannot be set up
/// (typically an exhausted `RLIMIT_MEMLOCK`) the key is kept in a
/// [`SecureBuffer`] instead, which is still wiped on drop and locked on a
/// best-effort basis. It is generated fresh for every session and never
/// persisted.
///
/// # Thread Safety
///
/// `SessionKey` is `Send + Sync`; the `RwLock` serializes every access to
/// the key. A panic while the lock is held poisons it and the key becomes
/// unusable.
pub struct SessionKey {
    key: RwLock<KeyStorage>,
}

impl SessionKey {
    /// Generate a random session key.
    pub fn generate() -> Self {
        let mut key = [0u8; SESSION_KEY_SIZE];
        rand::rng().fill_bytes(&mut key);
        let storage = match MemSafe::new(key) {
            Ok(protected) => KeyStorage::Protected(protected),
            Err(e) => {
                debug!(error = %e, "Protected key memory unavailable, using secure buffer");
                KeyStorage::Buffer(SecureBuffer::from_slice(&key))
            }
        };
        key.zeroize();
        Self {
            key: RwLock::new(storage),
        }
    }

    #[cfg(test)]
    fn unprotected(key: &[u8; SESSION_KEY_SIZE]) -> Self {
        Self {
            key: RwLock::new(KeyStorage::Buffer(SecureBuffer::from_slice(key))),
        }
    }

    /// Whether the key sits in a `PROT_NONE` mapping rather than the fallback buffer.
    pub fn is_memory_protected(&self) -> bool {
        self.key
            .read()
            .is_ok_and(|storage| matches!(*storage, KeyStorage::Protected(_)))
    }

    /// Run `f` with the raw key while memory permissions are raised.
    pub fn with_key<F, R>(&self, f: F) -> Result<R, KeyAccessError>
    where
        F: FnOnce(&[u8]) -> R,
    {
        let mut storage = self.key.write().map_err(|_| KeyAccessError::LockPoisoned)?;
        match &mut *storage {
            KeyStorage::Protected(protected) => {
                let guard = protected.read().map_err(KeyAccessError::memory_protection)?;
                Ok(f(&guard[..]))
            }
            KeyStorage::Buffer(buffer) => Ok(f(buffer.as_slice())),
        }
    }

    /// Encrypt `plaintext` under this key.
    pub fn wrap(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.with_key(|key| encryptor::encrypt(plaintext, key))?
    }

    /// Decrypt a payload produced by [`wrap`](Self::wrap).
    pub fn unwrap_key(&self, payload: &[u8]) -> Result<SecureBuffer, CryptoError> {
        self.with_key(|key| encryptor::decrypt(payload, key))?
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_differ() {
        let a = SessionKey::generate();
        let b = SessionKey::generate();
        let a_bytes = a.with_key(<[u8]>::to_vec).unwrap();
        let b_bytes = b.with_key(<[u8]>::to_vec).unwrap();
        assert_ne!(a_bytes, b_bytes);
    }

    #[test]
    fn test_wrap_unwrap() {
        let session = SessionKey::generate();
        let wrapped = session.wrap(&[9u8; 32]).unwrap();
        assert_ne!(&wrapped[encryptor::IV_SIZE..encryptor::IV_SIZE + 32], &[9u8; 32]);
        assert_eq!(session.unwrap_key(&wrapped).unwrap().as_slice(), &[9u8; 32]);
    }

    #[test]
    fn test_unwrap_with_other_session_fails() {
        let a = SessionKey::generate();
        let b = SessionKey::generate();
        let wrapped = a.wrap(b"store key material, 32 bytes!!!!").unwrap();
        // a foreign key almost always breaks the padding; if it happens not
        // to, the bytes still differ from the original
        match b.unwrap_key(&wrapped) {
            Err(CryptoError::DecryptionFailed) => {}
            Ok(plain) => assert_ne!(plain.as_slice(), b"store key material, 32 bytes!!!!"),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_fallback_buffer_wraps_and_unwraps() {
        let session = SessionKey::unprotected(&[7u8; SESSION_KEY_SIZE]);
        assert!(!session.is_memory_protected());
        assert_eq!(session.with_key(<[u8]>::to_vec).unwrap(), vec![7u8; SESSION_KEY_SIZE]);

        let wrapped = session.wrap(b"store key").unwrap();
        assert_eq!(session.unwrap_key(&wrapped).unwrap().as_slice(), b"store key");
    }

    #[test]
    fn test_key_access_errors_name_the_session_key() {
        assert_eq!(KeyAccessError::LockPoisoned.to_string(), "Session key lock was poisoned");
        let err = KeyAccessError::memory_protection(std::io::Error::other("mprotect"));
        assert!(err.to_string().starts_with("Session key memory could not be accessed"));
    }

    #[test]
    fn test_debug_redacted() {
        let session = SessionKey::generate();
        assert!(format!("{session:?}").contains("[REDACTED]"));
    }
}
