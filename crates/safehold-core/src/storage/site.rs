use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::RngCore;
use tokio::fs;
use tracing::{debug, instrument, warn};

use super::{KEY_SETTING, LOCATION_SETTING, SiteContext, SiteError, StorageSettings};
use crate::memory::{SecureBuffer, SecureByteList};
use crate::wire::{WireError, WireFormat, WireReader, WireWriter};

/// Discriminant of the storage site variants.
///
/// The numeric id and the name are both persisted and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageSiteKind {
    FileSystem,
    BrowserSync,
    RemoteApi,
}

impl StorageSiteKind {
    pub const ALL: [Self; 3] = [Self::FileSystem, Self::BrowserSync, Self::RemoteApi];

    pub fn type_id(self) -> u32 {
        match self {
            Self::FileSystem => 1,
            Self::BrowserSync => 2,
            Self::RemoteApi => 3,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::FileSystem => "FileSystem",
            Self::BrowserSync => "BrowserSync",
            Self::RemoteApi => "RemoteApi",
        }
    }

    pub fn from_type_id(type_id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_id() == type_id)
    }

    pub fn from_type_name(type_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_name() == type_name)
    }
}

impl fmt::Display for StorageSiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

fn required_str<'a>(settings: &'a StorageSettings, key: &'static str) -> Result<&'a str, SiteError> {
    let bytes = settings.get(key).ok_or(SiteError::MissingSetting(key))?;
    std::str::from_utf8(bytes).map_err(|_| SiteError::InvalidSetting {
        key,
        reason: "not valid UTF-8".to_string(),
    })
}

// ============================================================================
// File system
// ============================================================================

/// A vault copy kept in a single local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemSite {
    name: String,
    settings: StorageSettings,
}

impl FileSystemSite {
    pub fn new(name: impl Into<String>, location: impl AsRef<Path>) -> Self {
        let mut settings = StorageSettings::new();
        settings.set_str(LOCATION_SETTING, &location.as_ref().to_string_lossy());
        Self::with_settings(name, settings)
    }

    pub fn with_settings(name: impl Into<String>, settings: StorageSettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }

    pub fn location(&self) -> Result<PathBuf, SiteError> {
        required_str(&self.settings, LOCATION_SETTING).map(PathBuf::from)
    }

    /// Read the file, or `None` if it does not exist yet.
    pub async fn load(&self) -> Result<Option<Vec<u8>>, SiteError> {
        let path = self.location()?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the file contents atomically through a sibling temp file.
    pub async fn save(&self, data: &[u8]) -> Result<(), SiteError> {
        let path = self.location()?;
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }

        let mut suffix = [0u8; 8];
        rand::rng().fill_bytes(&mut suffix);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = parent.join(format!(".{file_name}.tmp.{}", hex::encode(suffix)));

        fs::write(&temp_path, data).await?;
        if let Err(e) = fs::rename(&temp_path, &path).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                debug!(path = %temp_path.display(), error = %cleanup, "Failed to remove temp file");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

// ============================================================================
// Browser sync
// ============================================================================

/// A vault copy kept in a browser extension's synchronized storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSyncSite {
    name: String,
    settings: StorageSettings,
}

impl BrowserSyncSite {
    pub fn new(name: impl Into<String>, key: &str) -> Self {
        let mut settings = StorageSettings::new();
        settings.set_str(KEY_SETTING, key);
        Self::with_settings(name, settings)
    }

    pub fn with_settings(name: impl Into<String>, settings: StorageSettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }

    pub fn key(&self) -> Result<&str, SiteError> {
        required_str(&self.settings, KEY_SETTING)
    }
}

// ============================================================================
// Remote API
// ============================================================================

/// A vault copy held by the remote record service.
///
/// Besides its settings this variant carries the record id it was assigned
/// and the secret that authorizes access to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteApiSite {
    name: String,
    settings: StorageSettings,
    record_id: [u8; 16],
    secret: SecureBuffer,
}

impl RemoteApiSite {
    pub fn new(name: impl Into<String>, location: &str, record_id: [u8; 16], secret: &[u8]) -> Self {
        let mut settings = StorageSettings::new();
        settings.set_str(LOCATION_SETTING, location);
        Self {
            name: name.into(),
            settings,
            record_id,
            secret: SecureBuffer::from_slice(secret),
        }
    }

    pub fn location(&self) -> Result<&str, SiteError> {
        required_str(&self.settings, LOCATION_SETTING)
    }

    pub fn record_id(&self) -> &[u8; 16] {
        &self.record_id
    }

    pub fn secret(&self) -> &[u8] {
        self.secret.as_slice()
    }
}

// ============================================================================
// Tagged union
// ============================================================================

/// One configured storage site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSite {
    FileSystem(FileSystemSite),
    BrowserSync(BrowserSyncSite),
    RemoteApi(RemoteApiSite),
}

impl StorageSite {
    pub fn kind(&self) -> StorageSiteKind {
        match self {
            Self::FileSystem(_) => StorageSiteKind::FileSystem,
            Self::BrowserSync(_) => StorageSiteKind::BrowserSync,
            Self::RemoteApi(_) => StorageSiteKind::RemoteApi,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::FileSystem(site) => &site.name,
            Self::BrowserSync(site) => &site.name,
            Self::RemoteApi(site) => &site.name,
        }
    }

    pub fn settings(&self) -> &StorageSettings {
        match self {
            Self::FileSystem(site) => &site.settings,
            Self::BrowserSync(site) => &site.settings,
            Self::RemoteApi(site) => &site.settings,
        }
    }

    /// Fetch the ciphertext held by this site, or `None` if it holds nothing.
    #[instrument(level = "debug", skip(self, ctx), fields(site = %self.name(), kind = %self.kind()))]
    pub async fn load(&self, ctx: &SiteContext) -> Result<Option<Vec<u8>>, SiteError> {
        let result = match self {
            Self::FileSystem(site) => site.load().await,
            Self::BrowserSync(site) => ctx.browser_sync()?.get(site.key()?).await,
            Self::RemoteApi(site) => {
                ctx.remote_api()?
                    .load(site.location()?, &site.record_id, site.secret())
                    .await
            }
        };
        match &result {
            Ok(Some(data)) => debug!(bytes = data.len(), "Loaded ciphertext"),
            Ok(None) => debug!("Site is empty"),
            Err(e) => warn!(error = %e, "Site load failed"),
        }
        result
    }

    /// Replace the ciphertext held by this site.
    #[instrument(level = "debug", skip(self, data, ctx), fields(site = %self.name(), kind = %self.kind(), bytes = data.len()))]
    pub async fn save(&self, data: &[u8], ctx: &SiteContext) -> Result<(), SiteError> {
        let result = match self {
            Self::FileSystem(site) => site.save(data).await,
            Self::BrowserSync(site) => ctx.browser_sync()?.set(site.key()?, data).await,
            Self::RemoteApi(site) => {
                ctx.remote_api()?
                    .save(site.location()?, &site.record_id, site.secret(), data)
                    .await
            }
        };
        if let Err(e) = &result {
            warn!(error = %e, "Site save failed");
        }
        result
    }

    /// Decode a site record that must be of variant `kind`.
    pub(crate) fn read_as(kind: StorageSiteKind, reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let mut record = reader.read_record()?;
        let found = record.read_u32()?;
        if found != kind.type_id() {
            return Err(WireError::UnexpectedTypeId {
                expected: kind.type_id(),
                found,
            });
        }
        let name = record.read_str()?.to_string();
        let settings = StorageSettings::read_from(&mut record)?;

        Ok(match kind {
            StorageSiteKind::FileSystem => Self::FileSystem(FileSystemSite { name, settings }),
            StorageSiteKind::BrowserSync => Self::BrowserSync(BrowserSyncSite { name, settings }),
            StorageSiteKind::RemoteApi => {
                let record_id = record.read_fixed::<16>()?;
                let secret = SecureBuffer::from_slice(record.read_bytes()?);
                Self::RemoteApi(RemoteApiSite {
                    name,
                    settings,
                    record_id,
                    secret,
                })
            }
        })
    }
}

impl From<FileSystemSite> for StorageSite {
    fn from(site: FileSystemSite) -> Self {
        Self::FileSystem(site)
    }
}

impl From<BrowserSyncSite> for StorageSite {
    fn from(site: BrowserSyncSite) -> Self {
        Self::BrowserSync(site)
    }
}

impl From<RemoteApiSite> for StorageSite {
    fn from(site: RemoteApiSite) -> Self {
        Self::RemoteApi(site)
    }
}

/// `[len][type id: u32][name][settings]` followed, for the remote variant,
/// by `[record id][secret]`.
impl WireFormat for StorageSite {
    fn write_to(&self, out: &mut SecureByteList) -> Result<(), WireError> {
        let mark = out.begin_record()?;
        out.write_u32(self.kind().type_id())?;
        out.write_str(self.name())?;
        self.settings().write_to(out)?;
        if let Self::RemoteApi(site) = self {
            out.write_bytes(&site.record_id)?;
            out.write_bytes(site.secret.as_slice())?;
        }
        out.end_record(mark)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        // Peek at the type id without consuming the record.
        let mut peek = reader.clone();
        let type_id = peek.read_record()?.read_u32()?;
        let kind = StorageSiteKind::from_type_id(type_id).ok_or(WireError::UnknownTypeId(type_id))?;
        Self::read_as(kind, reader)
    }
}
