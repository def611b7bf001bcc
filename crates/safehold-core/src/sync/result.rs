use thiserror::Error;

use crate::data::DataStore;
use crate::storage::{SiteError, StorageSiteKind};
use crate::store::StoreError;

/// Why one site failed during a multi-site operation.
#[derive(Error, Debug)]
pub enum SiteSyncError {
    /// The site itself could not be read or written.
    #[error(transparent)]
    Site(#[from] SiteError),

    /// The site's content could not be decrypted or parsed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What happened at one site.
#[derive(Debug)]
pub enum SiteStatus {
    /// Ciphertext was loaded and decrypted.
    Loaded,
    /// The site holds nothing yet.
    Empty,
    /// Ciphertext was written.
    Saved,
    /// Not written back because the site's own copy could not be loaded.
    Skipped,
    Failed(SiteSyncError),
}

#[derive(Debug)]
pub struct SiteOutcome {
    pub site_name: String,
    pub kind: StorageSiteKind,
    pub status: SiteStatus,
}

impl SiteOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, SiteStatus::Failed(_))
    }

    pub fn error(&self) -> Option<&SiteSyncError> {
        match &self.status {
            SiteStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of loading a vault from every configured site.
#[derive(Debug)]
pub struct DataStoreResult {
    /// The reconciled store, or `None` if no site produced one.
    pub store: Option<DataStore>,
    /// One entry per site, in configuration order.
    pub outcomes: Vec<SiteOutcome>,
}

impl DataStoreResult {
    /// Number of sites whose copy took part in reconciliation.
    pub fn loaded_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SiteStatus::Loaded))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &SiteOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

/// Result of writing a vault to every configured site.
#[derive(Debug)]
pub struct SaveDataStoreResult {
    /// One entry per site, in configuration order.
    pub outcomes: Vec<SiteOutcome>,
}

impl SaveDataStoreResult {
    pub fn succeeded(&self) -> impl Iterator<Item = &SiteOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SiteStatus::Saved))
    }

    pub fn failed(&self) -> impl Iterator<Item = &SiteOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    /// Whether every site was written; skipped sites count against this.
    pub fn all_succeeded(&self) -> bool {
        self.succeeded().count() == self.outcomes.len()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SiteOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SiteStatus::Skipped))
    }

    /// Whether at least `required` sites were written.
    pub fn has_quorum(&self, required: usize) -> bool {
        self.succeeded().count() >= required
    }
}

/// Result of [`synchronize`](super::synchronize).
#[derive(Debug)]
pub struct SyncResult {
    pub load: DataStoreResult,
    /// `None` when nothing was loaded and there was nothing to write back.
    pub save: Option<SaveDataStoreResult>,
}
