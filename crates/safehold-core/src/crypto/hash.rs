//! PBKDF2 key derivation and salted secret hashing.

use std::fmt;
use std::num::NonZeroU32;

use rand::RngCore;
use ring::pbkdf2;
use secrecy::SecretBox;
use tracing::{debug, instrument};

use super::CryptoError;

/// Iteration count used unless fast mode is enabled.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Iteration count for tests and development.
///
/// Enable by setting the `SAFEHOLD_FAST_KDF` environment variable to `1`.
/// Never use for a real vault.
pub const FAST_ITERATIONS: u32 = 1_000;

/// Length of derived keys and of stored secret hashes.
pub const KEY_LENGTH: usize = 32;

/// Length of the random salt generated by [`HashProvider::hash_secret`].
pub const SALT_LENGTH: usize = 16;

#[inline]
fn is_fast_kdf_enabled() -> bool {
    std::env::var("SAFEHOLD_FAST_KDF")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// PRF underlying PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    fn pbkdf2(self) -> pbkdf2::Algorithm {
        match self {
            Self::Sha256 => pbkdf2::PBKDF2_HMAC_SHA256,
            Self::Sha512 => pbkdf2::PBKDF2_HMAC_SHA512,
        }
    }
}

/// Cost parameters for PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    algorithm: HashAlgorithm,
    iterations: NonZeroU32,
}

impl KdfParams {
    pub fn new(algorithm: HashAlgorithm, iterations: u32) -> Result<Self, CryptoError> {
        let iterations = NonZeroU32::new(iterations)
            .ok_or_else(|| CryptoError::InvalidKdfParams("iterations must be non-zero".to_string()))?;
        Ok(Self {
            algorithm,
            iterations,
        })
    }

    /// Low-cost parameters for tests.
    pub fn fast() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha256,
            iterations: NonZeroU32::MIN.saturating_add(FAST_ITERATIONS - 1),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }
}

impl Default for KdfParams {
    /// PBKDF2-HMAC-SHA256 at [`DEFAULT_ITERATIONS`], or [`FAST_ITERATIONS`]
    /// when `SAFEHOLD_FAST_KDF=1`.
    fn default() -> Self {
        if is_fast_kdf_enabled() {
            return Self::fast();
        }
        Self {
            algorithm: HashAlgorithm::Sha256,
            iterations: NonZeroU32::MIN.saturating_add(DEFAULT_ITERATIONS - 1),
        }
    }
}

/// A salt and the PBKDF2 hash of some secret under it.
#[derive(Clone, PartialEq, Eq)]
pub struct SaltedHash {
    pub salt: [u8; SALT_LENGTH],
    pub hash: [u8; KEY_LENGTH],
}

impl fmt::Debug for SaltedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaltedHash")
            .field("salt", &hex::encode(self.salt))
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

/// Password-based key derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashProvider {
    params: KdfParams,
}

impl HashProvider {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Derive a 256-bit key from `secret` and `salt`.
    ///
    /// Deterministic: the same inputs always yield the same key.
    #[instrument(level = "debug", skip(self, secret, salt), fields(iterations = self.params.iterations()))]
    pub fn derive_key(&self, secret: &[u8], salt: &[u8]) -> SecretBox<[u8; KEY_LENGTH]> {
        let mut key = Box::new([0u8; KEY_LENGTH]);
        pbkdf2::derive(
            self.params.algorithm.pbkdf2(),
            self.params.iterations,
            salt,
            secret,
            key.as_mut(),
        );
        debug!("Derived key");
        SecretBox::new(key)
    }

    /// Hash `secret` under a fresh random salt, for later verification.
    pub fn hash_secret(&self, secret: &[u8]) -> SaltedHash {
        let mut salt = [0u8; SALT_LENGTH];
        rand::rng().fill_bytes(&mut salt);
        let mut hash = [0u8; KEY_LENGTH];
        pbkdf2::derive(
            self.params.algorithm.pbkdf2(),
            self.params.iterations,
            &salt,
            secret,
            &mut hash,
        );
        SaltedHash { salt, hash }
    }

    /// Check `secret` against a stored hash in constant time.
    pub fn verify_secret(&self, secret: &[u8], stored: &SaltedHash) -> bool {
        pbkdf2::verify(
            self.params.algorithm.pbkdf2(),
            self.params.iterations,
            &stored.salt,
            secret,
            &stored.hash,
        )
        .is_ok()
    }
}
