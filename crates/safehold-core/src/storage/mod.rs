//! Storage sites: where encrypted copies of a vault live.
//!
//! A site is one of a closed set of variants ([`StorageSiteKind`]), each
//! described by a name and a [`StorageSettings`] bag. Sites only move opaque
//! ciphertext; they never see plaintext or keys.
//!
//! The filesystem variant does its own I/O through `tokio::fs`. The
//! browser-sync and remote-API variants delegate to collaborators supplied
//! by the caller through a [`SiteContext`], since their transports live
//! outside this crate.

mod context;
mod factory;
mod settings;
mod site;

use thiserror::Error;

pub use context::{BrowserSyncStorage, RemoteApiClient, SiteContext};
pub use factory::{FactoryError, StorageSiteFactory};
pub use settings::StorageSettings;
pub use site::{BrowserSyncSite, FileSystemSite, RemoteApiSite, StorageSite, StorageSiteKind};

/// Setting holding a filesystem path or API base URL.
pub const LOCATION_SETTING: &str = "location";

/// Setting holding a browser-sync storage key.
pub const KEY_SETTING: &str = "key";

/// Errors raised while reading or writing a single site.
///
/// These never abort a multi-site operation; they are recorded per site.
#[derive(Error, Debug)]
pub enum SiteError {
    /// A required setting is absent.
    ///
    /// **[USER ERROR]** The site was configured incompletely.
    #[error("Storage site is missing the '{0}' setting")]
    MissingSetting(&'static str),

    /// A setting is present but unusable, e.g. not UTF-8.
    #[error("Storage site setting '{key}' is invalid: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    /// The collaborator this variant needs was not supplied.
    #[error("No {0} collaborator is configured")]
    Unavailable(&'static str),

    /// **[SYSTEM ERROR]** Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote side reported a failure.
    #[error("Remote storage error: {0}")]
    Remote(String),
}
