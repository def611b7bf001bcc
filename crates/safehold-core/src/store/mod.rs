//! Session and envelope state for one vault.
//!
//! See [`StoreManager`] for the state machine.

mod manager;

use thiserror::Error;

use crate::crypto::{CryptoError, KeyAccessError};
use crate::wire::WireError;

pub use manager::{STORE_KEY_SALT, SiteLoadReport, StoreManager};

/// Errors raised by [`StoreManager`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// An operation needing a session was called before `authenticate`.
    ///
    /// **[USER ERROR]** Recoverable by authenticating.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// A blob could not be decrypted or parsed under the current store key.
    ///
    /// **[INTEGRITY VIOLATION]** Usually a wrong master password, otherwise
    /// corrupted or tampered storage. Retrying with the same key will not help.
    #[error("[INTEGRITY VIOLATION] Invalid authentication - wrong password or corrupted data")]
    InvalidAuthentication,

    /// A site record names a variant this build does not support.
    ///
    /// Reported per record; other records still load.
    #[error("Unsupported storage site type '{type_name}'")]
    UnsupportedStorageSite { type_name: String },

    /// A site with this name is already configured.
    #[error("A storage site named '{0}' already exists")]
    DuplicateSite(String),

    /// **[SYSTEM ERROR]**
    #[error("Cryptographic operation failed: {0}")]
    Crypto(#[from] CryptoError),

    /// Encoding failed while serializing.
    #[error("Serialization failed: {0}")]
    Wire(#[from] WireError),
}

impl From<KeyAccessError> for StoreError {
    fn from(err: KeyAccessError) -> Self {
        StoreError::Crypto(CryptoError::KeyAccess(err))
    }
}
