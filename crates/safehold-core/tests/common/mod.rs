//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use safehold_core::crypto::{HashAlgorithm, HashProvider, KdfParams, SaltedHash};
use safehold_core::storage::{BrowserSyncStorage, RemoteApiClient, SiteError};
use safehold_core::StoreManager;

pub const PASSWORD: &[u8] = b"correct horse battery staple";

/// A manager with cheap key derivation, already authenticated.
pub fn authenticated_manager() -> StoreManager {
    let mut manager = StoreManager::with_kdf(KdfParams::fast());
    manager.authenticate(PASSWORD).expect("authenticate");
    manager
}

/// Browser sync storage backed by a map.
#[derive(Default)]
pub struct MemoryBrowserSync {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBrowserSync {
    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl BrowserSyncStorage for MemoryBrowserSync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SiteError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), SiteError> {
        self.entries.lock().unwrap().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Record service that authorizes with a salted hash per record, the way
/// the HTTP service does.
pub struct MemoryRemoteApi {
    hasher: HashProvider,
    records: Mutex<HashMap<[u8; 16], (SaltedHash, Option<Vec<u8>>)>>,
}

impl MemoryRemoteApi {
    pub fn new() -> Self {
        Self {
            hasher: HashProvider::new(KdfParams::new(HashAlgorithm::Sha512, 10).unwrap()),
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn create_record(&self, record_id: [u8; 16], secret: &[u8]) {
        let hash = self.hasher.hash_secret(secret);
        self.records.lock().unwrap().insert(record_id, (hash, None));
    }

    fn authorize(&self, record_id: &[u8; 16], secret: &[u8]) -> Result<(), SiteError> {
        let records = self.records.lock().unwrap();
        let (hash, _) = records
            .get(record_id)
            .ok_or_else(|| SiteError::Remote("no such record".to_string()))?;
        if self.hasher.verify_secret(secret, hash) {
            Ok(())
        } else {
            Err(SiteError::Remote("unauthorized".to_string()))
        }
    }
}

#[async_trait]
impl RemoteApiClient for MemoryRemoteApi {
    async fn load(&self, _location: &str, record_id: &[u8; 16], secret: &[u8]) -> Result<Option<Vec<u8>>, SiteError> {
        self.authorize(record_id, secret)?;
        Ok(self.records.lock().unwrap().get(record_id).and_then(|(_, data)| data.clone()))
    }

    async fn save(&self, _location: &str, record_id: &[u8; 16], secret: &[u8], data: &[u8]) -> Result<(), SiteError> {
        self.authorize(record_id, secret)?;
        if let Some((_, stored)) = self.records.lock().unwrap().get_mut(record_id) {
            *stored = Some(data.to_vec());
        }
        Ok(())
    }
}

/// Storage that fails every call.
pub struct BrokenBrowserSync;

#[async_trait]
impl BrowserSyncStorage for BrokenBrowserSync {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, SiteError> {
        Err(SiteError::Remote("extension disconnected".to_string()))
    }

    async fn set(&self, _key: &str, _value: &[u8]) -> Result<(), SiteError> {
        Err(SiteError::Remote("extension disconnected".to_string()))
    }
}
