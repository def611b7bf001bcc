use secrecy::ExposeSecret;
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroizing;

use super::StoreError;
use crate::crypto::{CryptoError, HashProvider, KdfParams, SessionKey, encryptor};
use crate::data::DataStore;
use crate::memory::{SecureBuffer, SecureByteList};
use crate::storage::{FactoryError, StorageSite, StorageSiteFactory};
use crate::wire::{WireError, WireFormat, WireReader, WireWriter};

/// Application-wide salt for deriving the store key.
///
/// Fixed so that the same master password yields the same store key on
/// every device.
pub const STORE_KEY_SALT: &[u8] = b"safehold/store-key/v1";

struct Session {
    session_key: SessionKey,
    /// The store key, encrypted under `session_key`.
    wrapped_store_key: Zeroizing<Vec<u8>>,
}

/// Outcome of [`StoreManager::load_storage_sites`].
#[derive(Debug, Default)]
pub struct SiteLoadReport {
    /// Number of sites materialized.
    pub loaded: usize,
    /// Records that were skipped, each as an
    /// [`StoreError::UnsupportedStorageSite`].
    pub skipped: Vec<StoreError>,
}

impl SiteLoadReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Session state, store-key envelope and site list for one vault.
///
/// A manager starts **unauthenticated**. [`authenticate`](Self::authenticate)
/// derives the store key from the master password, generates a random
/// session key, and keeps only the store key encrypted under that session
/// key. The plaintext store key exists only inside
/// [`plain_store_key`](Self::plain_store_key) results and for the duration
/// of each encrypt or decrypt.
///
/// The manager performs no I/O. Callers move the ciphertext it produces to
/// and from storage; see [`crate::sync`] for the multi-site cycle.
///
/// Not internally synchronized: share it across threads only behind a lock.
pub struct StoreManager {
    hash: HashProvider,
    session: Option<Session>,
    sites: Vec<StorageSite>,
}

impl StoreManager {
    /// A manager using [`KdfParams::default`].
    pub fn new() -> Self {
        Self::with_kdf(KdfParams::default())
    }

    pub fn with_kdf(params: KdfParams) -> Self {
        Self {
            hash: HashProvider::new(params),
            session: None,
            sites: Vec::new(),
        }
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Establish a session for `master_password`.
    ///
    /// Any previous session is dropped first.
    #[instrument(level = "info", skip(self, master_password))]
    pub fn authenticate(&mut self, master_password: &[u8]) -> Result<(), StoreError> {
        if self.session.take().is_some() {
            debug!("Dropped previous session");
        }

        let store_key = self.hash.derive_key(master_password, STORE_KEY_SALT);
        let session_key = SessionKey::generate();
        let wrapped_store_key = Zeroizing::new(session_key.wrap(store_key.expose_secret())?);

        self.session = Some(Session {
            session_key,
            wrapped_store_key,
        });
        info!("Session established");
        Ok(())
    }

    /// Drop all session material.
    pub fn sign_out(&mut self) {
        if self.session.take().is_some() {
            info!("Signed out");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn ensure_authenticated(&self) -> Result<(), StoreError> {
        self.session().map(|_| ())
    }

    fn session(&self) -> Result<&Session, StoreError> {
        self.session.as_ref().ok_or(StoreError::NotAuthenticated)
    }

    /// Decrypt and return the store key.
    ///
    /// Drop the returned buffer as soon as it is no longer needed.
    pub fn plain_store_key(&self) -> Result<SecureBuffer, StoreError> {
        let session = self.session()?;
        Ok(session.session_key.unwrap_key(&session.wrapped_store_key)?)
    }

    // ========================================================================
    // Envelope
    // ========================================================================

    /// Encrypt `plaintext` under the store key.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, StoreError> {
        let store_key = self.plain_store_key()?;
        Ok(encryptor::encrypt(plaintext, store_key.as_slice())?)
    }

    /// Decrypt `ciphertext` under the store key.
    ///
    /// Padding and length failures become [`StoreError::InvalidAuthentication`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<SecureBuffer, StoreError> {
        let store_key = self.plain_store_key()?;
        encryptor::decrypt(ciphertext, store_key.as_slice()).map_err(|e| match e {
            CryptoError::DecryptionFailed | CryptoError::InvalidCiphertextLength { .. } => {
                debug!(error = %e, "Store key rejected ciphertext");
                StoreError::InvalidAuthentication
            }
            other => StoreError::Crypto(other),
        })
    }

    #[instrument(level = "debug", skip(self, store))]
    pub fn encrypt_data_store(&self, store: &DataStore) -> Result<Vec<u8>, StoreError> {
        let plaintext = store.to_wire()?;
        self.encrypt(plaintext.as_slice())
    }

    #[instrument(level = "debug", skip(self, ciphertext), fields(bytes = ciphertext.len()))]
    pub fn decrypt_data_store(&self, ciphertext: &[u8]) -> Result<DataStore, StoreError> {
        let plaintext = self.decrypt(ciphertext)?;
        DataStore::from_wire(plaintext.as_slice()).map_err(|e| {
            debug!(error = %e, "Decrypted store did not parse");
            StoreError::InvalidAuthentication
        })
    }

    // ========================================================================
    // Storage sites
    // ========================================================================

    pub fn sites(&self) -> &[StorageSite] {
        &self.sites
    }

    /// Add a site. Names must be unique.
    pub fn add_site(&mut self, site: impl Into<StorageSite>) -> Result<(), StoreError> {
        let site = site.into();
        if self.sites.iter().any(|s| s.name() == site.name()) {
            return Err(StoreError::DuplicateSite(site.name().to_string()));
        }
        self.sites.push(site);
        Ok(())
    }

    /// Remove the site called `name`, returning it if present.
    pub fn remove_site(&mut self, name: &str) -> Option<StorageSite> {
        let index = self.sites.iter().position(|s| s.name() == name)?;
        Some(self.sites.remove(index))
    }

    pub fn clear_sites(&mut self) {
        self.sites.clear();
    }

    /// Replace the held sites with those in an encrypted site list.
    ///
    /// The plaintext is a sequence of `(type name, site record)` pairs.
    /// Records naming an unsupported type are skipped and reported; any
    /// decryption or parse failure rejects the whole blob as
    /// [`StoreError::InvalidAuthentication`] and leaves the current sites
    /// untouched.
    #[instrument(level = "debug", skip(self, encrypted), fields(bytes = encrypted.len()))]
    pub fn load_storage_sites(&mut self, encrypted: &[u8]) -> Result<SiteLoadReport, StoreError> {
        self.ensure_authenticated()?;
        let plaintext = self.decrypt(encrypted)?;

        let mut reader = WireReader::new(plaintext.as_slice());
        let mut sites = Vec::new();
        let mut report = SiteLoadReport::default();

        while !reader.is_exhausted() {
            let (type_name, record) = read_site_pair(&mut reader).map_err(|e| {
                debug!(error = %e, "Site list did not parse");
                StoreError::InvalidAuthentication
            })?;
            match StorageSiteFactory::create(type_name, record) {
                Ok(site) => sites.push(site),
                Err(FactoryError::Unsupported { type_name }) => {
                    warn!(%type_name, "Skipping unsupported storage site");
                    report
                        .skipped
                        .push(StoreError::UnsupportedStorageSite { type_name });
                }
                Err(FactoryError::Malformed(e)) => {
                    debug!(error = %e, %type_name, "Site record did not parse");
                    return Err(StoreError::InvalidAuthentication);
                }
            }
        }

        report.loaded = sites.len();
        self.sites = sites;
        debug!(loaded = report.loaded, skipped = report.skipped.len(), "Loaded storage sites");
        Ok(report)
    }

    /// Serialize and encrypt the held sites. Performs no I/O.
    #[instrument(level = "debug", skip(self), fields(sites = self.sites.len()))]
    pub fn save_storage_sites(&self) -> Result<Vec<u8>, StoreError> {
        self.ensure_authenticated()?;
        let mut plaintext = SecureByteList::new();
        for site in &self.sites {
            plaintext.write_str(site.kind().type_name())?;
            let record = site.to_wire()?;
            plaintext.write_bytes(record.as_slice())?;
        }
        self.encrypt(plaintext.as_slice())
    }
}

fn read_site_pair<'a>(reader: &mut WireReader<'a>) -> Result<(&'a str, &'a [u8]), WireError> {
    let type_name = reader.read_str()?;
    let record = reader.read_bytes()?;
    Ok((type_name, record))
}

impl Default for StoreManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StoreManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreManager")
            .field("authenticated", &self.is_authenticated())
            .field("sites", &self.sites)
            .field("kdf", &self.hash.params())
            .finish()
    }
}
