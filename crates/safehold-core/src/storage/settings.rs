use std::collections::BTreeMap;
use std::fmt;

use crate::memory::{SecureBuffer, SecureByteList};
use crate::wire::{WireError, WireFormat, WireReader, WireWriter};

/// Key to secret-bytes map describing one storage site.
///
/// Values are held in [`SecureBuffer`]s since they may carry credentials.
/// Keys are iterated in sorted order, which keeps the wire encoding stable.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StorageSettings {
    entries: BTreeMap<String, SecureBuffer>,
}

impl StorageSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, dropping (and wiping) any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: &[u8]) {
        self.entries.insert(key.into(), SecureBuffer::from_slice(value));
    }

    pub fn set_str(&mut self, key: impl Into<String>, value: &str) {
        self.set(key, value.as_bytes());
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(SecureBuffer::as_slice)
    }

    /// The value under `key` if it is present and valid UTF-8.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.keys().map(|key| (key, "[REDACTED]")))
            .finish()
    }
}

impl WireFormat for StorageSettings {
    fn write_to(&self, out: &mut SecureByteList) -> Result<(), WireError> {
        let mark = out.begin_record()?;
        for (key, value) in &self.entries {
            out.write_str(key)?;
            out.write_bytes(value.as_slice())?;
        }
        out.end_record(mark)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let mut record = reader.read_record()?;
        let mut settings = Self::new();
        while !record.is_exhausted() {
            let key = record.read_str()?;
            let value = record.read_bytes()?;
            settings.set(key, value);
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_replaces_value() {
        let mut settings = StorageSettings::new();
        settings.set_str("location", "/old");
        settings.set_str("location", "/new");
        assert_eq!(settings.len(), 1);
        assert_eq!(settings.get_str("location"), Some("/new"));
    }

    #[test]
    fn test_get_str_rejects_invalid_utf8() {
        let mut settings = StorageSettings::new();
        settings.set("token", &[0xFF, 0xFE]);
        assert_eq!(settings.get("token"), Some(&[0xFF, 0xFE][..]));
        assert_eq!(settings.get_str("token"), None);
    }

    #[test]
    fn test_remove() {
        let mut settings = StorageSettings::new();
        settings.set_str("a", "1");
        assert!(settings.remove("a"));
        assert!(!settings.remove("a"));
        assert!(settings.is_empty());
    }

    #[test]
    fn test_wire_round_trip_is_sorted() {
        let mut settings = StorageSettings::new();
        settings.set_str("z", "last");
        settings.set("a", &[1, 2, 3]);

        let wire = settings.to_wire().unwrap();
        let decoded = StorageSettings::from_wire(wire.as_slice()).unwrap();
        assert_eq!(decoded, settings);
        assert_eq!(decoded.keys().collect::<Vec<_>>(), vec!["a", "z"]);
        // first key written is "a"
        assert_eq!(&wire.as_slice()[4..9], &[1, 0, 0, 0, b'a']);
    }

    #[test]
    fn test_debug_hides_values() {
        let mut settings = StorageSettings::new();
        settings.set_str("secret", "hunter2");
        let output = format!("{settings:?}");
        assert!(output.contains("secret"));
        assert!(!output.contains("hunter2"));
    }
}
