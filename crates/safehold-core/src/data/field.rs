use super::{DataCollection, DataIdentity, DataValue, Identifiable, merge_by_identity, select_newest};
use crate::memory::{SecureBuffer, SecureByteList};
use crate::wire::{WireError, WireFormat, WireReader, WireWriter};

/// A named secret inside an item, such as a username or password.
///
/// Selectors are values that tell a client where the field applies, for
/// example a form input id.
#[derive(Debug, Clone)]
pub struct DataField {
    identity: DataIdentity,
    name: SecureBuffer,
    value: SecureBuffer,
    selectors: DataCollection<DataValue>,
}

impl DataField {
    pub fn new(name: &[u8], value: &[u8]) -> Self {
        Self::from_parts(DataIdentity::new(), name, value, DataCollection::new())
    }

    pub fn from_parts(
        identity: DataIdentity,
        name: &[u8],
        value: &[u8],
        selectors: DataCollection<DataValue>,
    ) -> Self {
        Self {
            identity,
            name: SecureBuffer::from_slice(name),
            value: SecureBuffer::from_slice(value),
            selectors,
        }
    }

    pub fn name(&self) -> &[u8] {
        self.name.as_slice()
    }

    pub fn value(&self) -> &[u8] {
        self.value.as_slice()
    }

    pub fn set_name(&mut self, name: &[u8]) {
        self.name = SecureBuffer::from_slice(name);
        self.identity.update();
    }

    pub fn set_value(&mut self, value: &[u8]) {
        self.value = SecureBuffer::from_slice(value);
        self.identity.update();
    }

    pub fn selectors(&self) -> &DataCollection<DataValue> {
        &self.selectors
    }

    pub fn selectors_mut(&mut self) -> &mut DataCollection<DataValue> {
        &mut self.selectors
    }
}

impl Identifiable for DataField {
    fn identity(&self) -> &DataIdentity {
        &self.identity
    }

    /// Keep the newest field, with selectors merged from every candidate.
    fn merge(mut candidates: Vec<Self>) -> Option<Self> {
        let selectors: Vec<_> = candidates
            .iter_mut()
            .map(|field| std::mem::take(&mut field.selectors))
            .collect();
        let mut survivor = select_newest(candidates)?;
        survivor.selectors = merge_by_identity(selectors);
        Some(survivor)
    }
}

impl PartialEq for DataField {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for DataField {}

impl WireFormat for DataField {
    fn write_to(&self, out: &mut SecureByteList) -> Result<(), WireError> {
        let mark = out.begin_record()?;
        self.identity.write_to(out)?;
        out.write_bytes(self.name.as_slice())?;
        out.write_bytes(self.value.as_slice())?;
        self.selectors.write_to(out)?;
        out.end_record(mark)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let mut record = reader.read_record()?;
        let identity = DataIdentity::read_from(&mut record)?;
        let name = record.read_bytes()?;
        let value = record.read_bytes()?;
        let selectors = DataCollection::read_from(&mut record)?;
        Ok(Self::from_parts(identity, name, value, selectors))
    }
}
