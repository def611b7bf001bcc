use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::SiteError;

/// Key/value storage offered by a browser extension's sync area.
#[async_trait]
pub trait BrowserSyncStorage: Send + Sync {
    /// Fetch the blob stored under `key`, or `None` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SiteError>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), SiteError>;
}

/// Client for the HTTP service that stores one encrypted blob per record.
///
/// The service authorizes each call by checking `secret` against its own
/// salted hash for `record_id`.
#[async_trait]
pub trait RemoteApiClient: Send + Sync {
    async fn load(
        &self,
        location: &str,
        record_id: &[u8; 16],
        secret: &[u8],
    ) -> Result<Option<Vec<u8>>, SiteError>;

    async fn save(
        &self,
        location: &str,
        record_id: &[u8; 16],
        secret: &[u8],
        data: &[u8],
    ) -> Result<(), SiteError>;
}

/// Collaborators available to sites during load and save.
///
/// Anything left unset makes the corresponding site variant report
/// [`SiteError::Unavailable`].
#[derive(Clone, Default)]
pub struct SiteContext {
    browser_sync: Option<Arc<dyn BrowserSyncStorage>>,
    remote_api: Option<Arc<dyn RemoteApiClient>>,
}

impl SiteContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_browser_sync(mut self, storage: Arc<dyn BrowserSyncStorage>) -> Self {
        self.browser_sync = Some(storage);
        self
    }

    #[must_use]
    pub fn with_remote_api(mut self, client: Arc<dyn RemoteApiClient>) -> Self {
        self.remote_api = Some(client);
        self
    }

    pub(crate) fn browser_sync(&self) -> Result<&dyn BrowserSyncStorage, SiteError> {
        self.browser_sync
            .as_deref()
            .ok_or(SiteError::Unavailable("browser sync storage"))
    }

    pub(crate) fn remote_api(&self) -> Result<&dyn RemoteApiClient, SiteError> {
        self.remote_api
            .as_deref()
            .ok_or(SiteError::Unavailable("remote API client"))
    }
}

impl fmt::Debug for SiteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteContext")
            .field("browser_sync", &self.browser_sync.is_some())
            .field("remote_api", &self.remote_api.is_some())
            .finish()
    }
}
