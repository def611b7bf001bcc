use super::{DataCollection, DataField, DataValue, merge_by_identity};
use crate::memory::{SecureBuffer, SecureByteList};
use crate::wire::{WireError, WireFormat, WireReader, WireWriter};

/// One entry in the vault, such as a login for a website.
///
/// Items have no identity of their own; only their three collections are
/// reconciled.
#[derive(Debug, Clone, Default)]
pub struct DataItem {
    name: SecureBuffer,
    fields: DataCollection<DataField>,
    labels: DataCollection<DataValue>,
    locations: DataCollection<DataValue>,
}

impl DataItem {
    pub fn new(name: &[u8]) -> Self {
        Self {
            name: SecureBuffer::from_slice(name),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &[u8] {
        self.name.as_slice()
    }

    pub fn set_name(&mut self, name: &[u8]) {
        self.name = SecureBuffer::from_slice(name);
    }

    pub fn fields(&self) -> &DataCollection<DataField> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut DataCollection<DataField> {
        &mut self.fields
    }

    pub fn labels(&self) -> &DataCollection<DataValue> {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut DataCollection<DataValue> {
        &mut self.labels
    }

    pub fn locations(&self) -> &DataCollection<DataValue> {
        &self.locations
    }

    pub fn locations_mut(&mut self) -> &mut DataCollection<DataValue> {
        &mut self.locations
    }

    /// Merge the leaf collections of `items` into one item.
    ///
    /// The name is taken from the first item. Callers are expected to pass
    /// items they have already decided are the same entry.
    pub fn merge_leaves(items: Vec<Self>) -> Option<Self> {
        let name = items.first()?.name.clone();
        let mut fields = Vec::with_capacity(items.len());
        let mut labels = Vec::with_capacity(items.len());
        let mut locations = Vec::with_capacity(items.len());
        for item in items {
            fields.push(item.fields);
            labels.push(item.labels);
            locations.push(item.locations);
        }
        Some(Self {
            name,
            fields: merge_by_identity(fields),
            labels: merge_by_identity(labels),
            locations: merge_by_identity(locations),
        })
    }
}

impl WireFormat for DataItem {
    fn write_to(&self, out: &mut SecureByteList) -> Result<(), WireError> {
        let mark = out.begin_record()?;
        out.write_bytes(self.name.as_slice())?;
        self.fields.write_to(out)?;
        self.labels.write_to(out)?;
        self.locations.write_to(out)?;
        out.end_record(mark)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let mut record = reader.read_record()?;
        let name = SecureBuffer::from_slice(record.read_bytes()?);
        let fields = DataCollection::read_from(&mut record)?;
        let labels = DataCollection::read_from(&mut record)?;
        let locations = DataCollection::read_from(&mut record)?;
        Ok(Self {
            name,
            fields,
            labels,
            locations,
        })
    }
}
