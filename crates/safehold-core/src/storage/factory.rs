use thiserror::Error;
use tracing::trace;

use super::{StorageSite, StorageSiteKind};
use crate::wire::{WireError, WireReader};

/// Errors raised while materializing a site from its persisted record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    /// The record names a site variant this build does not support.
    ///
    /// Fatal for that record only.
    #[error("Unsupported storage site type '{type_name}'")]
    Unsupported { type_name: String },

    /// The record is not a valid encoding of the named variant.
    ///
    /// **[INTEGRITY VIOLATION]**
    #[error("Malformed storage site record: {0}")]
    Malformed(#[from] WireError),
}

/// Builds [`StorageSite`]s from `(type name, record)` pairs.
pub struct StorageSiteFactory;

impl StorageSiteFactory {
    /// Materialize the site described by `record`.
    ///
    /// `type_name` selects the variant; the record's own type id must agree
    /// with it.
    pub fn create(type_name: &str, record: &[u8]) -> Result<StorageSite, FactoryError> {
        let kind = StorageSiteKind::from_type_name(type_name).ok_or_else(|| FactoryError::Unsupported {
            type_name: type_name.to_string(),
        })?;
        trace!(%kind, bytes = record.len(), "Creating storage site");
        Ok(StorageSite::read_as(kind, &mut WireReader::new(record))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BrowserSyncSite, FileSystemSite};
    use crate::wire::WireFormat;

    #[test]
    fn test_create_dispatches_by_name() {
        let site = StorageSite::from(BrowserSyncSite::new("ext", "vault-key"));
        let record = site.to_wire().unwrap();
        let created = StorageSiteFactory::create("BrowserSync", record.as_slice()).unwrap();
        assert_eq!(created, site);
    }

    #[test]
    fn test_unsupported_type_name() {
        assert_eq!(
            StorageSiteFactory::create("Dropbox", &[]),
            Err(FactoryError::Unsupported {
                type_name: "Dropbox".to_string()
            })
        );
    }

    #[test]
    fn test_name_and_id_must_agree() {
        let record = StorageSite::from(FileSystemSite::new("fs", "/x")).to_wire().unwrap();
        assert_eq!(
            StorageSiteFactory::create("RemoteApi", record.as_slice()),
            Err(FactoryError::Malformed(WireError::UnexpectedTypeId {
                expected: 3,
                found: 1
            }))
        );
    }

    #[test]
    fn test_truncated_record() {
        assert!(matches!(
            StorageSiteFactory::create("FileSystem", &[9, 0, 0, 0, 1]),
            Err(FactoryError::Malformed(WireError::Truncated { .. }))
        ));
    }
}
