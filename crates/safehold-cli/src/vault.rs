//! The unlocked vault a command works on: an authenticated
//! [`StoreManager`] plus the site-list file it was opened from.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, warn};

use safehold_core::sync::DataStoreResult;
use safehold_core::{DataStore, SiteContext, StoreManager, load_data_store};

use crate::config::Config;

/// Failures the CLI reports with a dedicated exit code.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("No site list at {}; run `safehold init` first", .0.display())]
    NotInitialized(PathBuf),

    #[error("A site list already exists at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("No storage sites are configured; add one with `safehold site add-fs`")]
    NoSites,

    #[error("No storage site named '{0}'")]
    SiteNotFound(String),

    #[error("No item named '{0}'")]
    ItemNotFound(String),

    #[error("An item named '{0}' already exists")]
    ItemExists(String),

    #[error("{failed} of {total} storage sites failed")]
    SitesFailed { failed: usize, total: usize },

    #[error("{failed} of {total} storage sites could not be read; nothing was written")]
    SitesUnreadable { failed: usize, total: usize },
}

pub struct Vault {
    pub manager: StoreManager,
    pub ctx: SiteContext,
    sites_file: PathBuf,
    name: String,
}

impl Vault {
    /// Create a new, empty site list protected by `password`.
    pub fn create(config: &Config, sites_file: &Path, password: &str) -> Result<Self> {
        if sites_file.exists() {
            return Err(VaultError::AlreadyInitialized(sites_file.to_path_buf()).into());
        }
        let vault = Self::authenticated(config, sites_file, password)?;
        vault.persist_sites()?;
        Ok(vault)
    }

    /// Unlock the site list at `sites_file`.
    pub fn open(config: &Config, sites_file: &Path, password: &str) -> Result<Self> {
        let encrypted = match fs::read(sites_file) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(VaultError::NotInitialized(sites_file.to_path_buf()).into());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read site list: {}", sites_file.display()));
            }
        };

        let mut vault = Self::authenticated(config, sites_file, password)?;
        let report = vault
            .manager
            .load_storage_sites(&encrypted)
            .context("Failed to unlock site list")?;
        for skipped in &report.skipped {
            warn!("{skipped}");
        }
        debug!(loaded = report.loaded, "Opened site list");
        Ok(vault)
    }

    fn authenticated(config: &Config, sites_file: &Path, password: &str) -> Result<Self> {
        let mut manager = StoreManager::with_kdf(config.kdf_params()?);
        manager.authenticate(password.as_bytes())?;
        Ok(Self {
            manager,
            ctx: SiteContext::new(),
            sites_file: sites_file.to_path_buf(),
            name: config.vault_name().to_string(),
        })
    }

    pub fn sites_file(&self) -> &Path {
        &self.sites_file
    }

    /// Encrypt the current site list and replace the file atomically.
    pub fn persist_sites(&self) -> Result<()> {
        let encrypted = self.manager.save_storage_sites()?;
        safe_write(&self.sites_file, &encrypted)
            .with_context(|| format!("Failed to write site list: {}", self.sites_file.display()))
    }

    /// Load and reconcile the vault from every site.
    pub async fn load(&self) -> Result<DataStoreResult> {
        if self.manager.sites().is_empty() {
            return Err(VaultError::NoSites.into());
        }
        let result = load_data_store(&self.manager, &self.ctx).await?;
        for outcome in result.failed() {
            if let Some(e) = outcome.error() {
                warn!(site = %outcome.site_name, "Could not load vault: {e}");
            }
        }
        Ok(result)
    }

    /// Load the vault for reading.
    ///
    /// Unreadable sites are tolerated as long as some site produced the
    /// vault. A fresh, empty vault stands in only when every site is empty.
    pub async fn load_for_read(&self) -> Result<DataStore> {
        let result = self.load().await?;
        let failed = result.failed().count();
        match result.store {
            Some(store) => Ok(store),
            None if failed > 0 => Err(VaultError::SitesUnreadable {
                failed,
                total: result.outcomes.len(),
            }
            .into()),
            None => Ok(DataStore::new(self.name.as_bytes())),
        }
    }

    /// Load the vault before changing it and writing it to every site.
    ///
    /// Every site must load or be empty: writing over a site whose copy
    /// could not be read would replace records that were never seen.
    pub async fn load_for_update(&self) -> Result<DataStore> {
        let result = self.load().await?;
        let failed = result.failed().count();
        if failed > 0 {
            return Err(VaultError::SitesUnreadable {
                failed,
                total: result.outcomes.len(),
            }
            .into());
        }
        Ok(result
            .store
            .unwrap_or_else(|| DataStore::new(self.name.as_bytes())))
    }
}

/// Write via a sibling temp file and rename, so a crash never leaves a
/// truncated site list behind.
fn safe_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = dir.join(format!(".{file_name}.tmp.{}", hex::encode(rand::random::<[u8; 4]>())));

    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_safe_write_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("sites.bin");

        safe_write(&path, b"first").unwrap();
        safe_write(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
