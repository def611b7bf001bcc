use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;

use crate::memory::SecureByteList;
use crate::wire::{WireError, WireFormat, WireReader, WireWriter};

/// Size of an identity key in bytes.
pub const KEY_SIZE: usize = 16;

/// Identity of one logical record across replicas and revisions.
///
/// Equality and hashing look at the key only: two identities with the same
/// key are the same record, whatever their versions. The version is a
/// seconds-since-epoch timestamp compared as an unsigned integer.
#[derive(Clone, Copy)]
pub struct DataIdentity {
    key: [u8; KEY_SIZE],
    version: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

impl DataIdentity {
    /// A fresh identity with a random key, versioned at the current time.
    pub fn new() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut key);
        Self {
            key,
            version: now_secs(),
        }
    }

    pub fn from_parts(key: [u8; KEY_SIZE], version: u64) -> Self {
        Self { key, version }
    }

    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Advance the version to now, or by one if the clock has not moved past
    /// it. The version never goes backwards.
    pub fn update(&mut self) {
        self.version = now_secs().max(self.version.saturating_add(1));
    }

    pub(crate) fn is_newer_than(&self, other: &Self) -> bool {
        self.version > other.version
    }
}

impl Default for DataIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for DataIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DataIdentity {}

impl Hash for DataIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for DataIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataIdentity")
            .field("key", &hex::encode(self.key))
            .field("version", &self.version)
            .finish()
    }
}

impl WireFormat for DataIdentity {
    fn write_to(&self, out: &mut SecureByteList) -> Result<(), WireError> {
        let mark = out.begin_record()?;
        out.write_bytes(&self.key)?;
        out.write_bytes(&self.version.to_le_bytes())?;
        out.end_record(mark)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let mut record = reader.read_record()?;
        let key = record.read_fixed::<KEY_SIZE>()?;
        let version = u64::from_le_bytes(record.read_fixed::<8>()?);
        Ok(Self { key, version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_version() {
        let a = DataIdentity::from_parts([1; KEY_SIZE], 10);
        let b = DataIdentity::from_parts([1; KEY_SIZE], 20);
        let c = DataIdentity::from_parts([2; KEY_SIZE], 10);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_new_keys_are_unique() {
        assert_ne!(DataIdentity::new(), DataIdentity::new());
    }

    #[test]
    fn test_update_is_monotonic() {
        let far_future = u64::MAX - 5;
        let mut identity = DataIdentity::from_parts([0; KEY_SIZE], far_future);
        identity.update();
        assert_eq!(identity.version(), far_future + 1);

        let mut stale = DataIdentity::from_parts([0; KEY_SIZE], 1);
        stale.update();
        assert!(stale.version() >= now_secs() - 1);
    }

    #[test]
    fn test_version_compares_numerically() {
        // 0x0100 is newer than 0xFF even though its first LE byte is smaller
        let older = DataIdentity::from_parts([0; KEY_SIZE], 0xFF);
        let newer = DataIdentity::from_parts([0; KEY_SIZE], 0x0100);
        assert!(newer.is_newer_than(&older));
        assert!(!older.is_newer_than(&newer));
    }

    #[test]
    fn test_wire_layout() {
        let identity = DataIdentity::from_parts([0xAB; KEY_SIZE], 0x0102);
        let wire = identity.to_wire().unwrap();
        let bytes = wire.as_slice();

        assert_eq!(bytes.len(), 4 + (4 + KEY_SIZE) + (4 + 8));
        assert_eq!(&bytes[..4], &[32, 0, 0, 0]);
        assert_eq!(&bytes[24..28], &[8, 0, 0, 0]);
        assert_eq!(&bytes[28..], &[2, 1, 0, 0, 0, 0, 0, 0]);

        let decoded = DataIdentity::from_wire(bytes).unwrap();
        assert_eq!(decoded.key(), identity.key());
        assert_eq!(decoded.version(), identity.version());
    }

    #[test]
    fn test_debug_shows_hex_key() {
        let identity = DataIdentity::from_parts([0xAB; KEY_SIZE], 7);
        let output = format!("{identity:?}");
        assert!(output.contains(&"ab".repeat(KEY_SIZE)));
    }
}
