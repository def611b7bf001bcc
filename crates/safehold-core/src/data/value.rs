use super::{DataIdentity, Identifiable};
use crate::memory::{SecureBuffer, SecureByteList};
use crate::wire::{WireError, WireFormat, WireReader, WireWriter};

/// An identity-bearing secret byte string.
///
/// Used for labels, locations and field selectors. Equality follows the
/// identity, so two revisions of the same value compare equal.
#[derive(Debug, Clone)]
pub struct DataValue {
    identity: DataIdentity,
    value: SecureBuffer,
}

impl DataValue {
    /// A new record with a fresh identity.
    pub fn new(value: &[u8]) -> Self {
        Self::from_parts(DataIdentity::new(), value)
    }

    pub fn from_parts(identity: DataIdentity, value: &[u8]) -> Self {
        Self {
            identity,
            value: SecureBuffer::from_slice(value),
        }
    }

    pub fn value(&self) -> &[u8] {
        self.value.as_slice()
    }

    /// Replace the content and advance the version.
    pub fn set_value(&mut self, value: &[u8]) {
        self.value = SecureBuffer::from_slice(value);
        self.identity.update();
    }
}

impl Identifiable for DataValue {
    fn identity(&self) -> &DataIdentity {
        &self.identity
    }
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for DataValue {}

impl WireFormat for DataValue {
    fn write_to(&self, out: &mut SecureByteList) -> Result<(), WireError> {
        let mark = out.begin_record()?;
        self.identity.write_to(out)?;
        out.write_bytes(self.value.as_slice())?;
        out.end_record(mark)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let mut record = reader.read_record()?;
        let identity = DataIdentity::read_from(&mut record)?;
        let value = record.read_bytes()?;
        Ok(Self::from_parts(identity, value))
    }
}
