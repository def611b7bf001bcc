use tracing::{debug, instrument};

use super::{DataCollection, DataItem};
use crate::memory::{SecureBuffer, SecureByteList};
use crate::wire::{WireError, WireFormat, WireReader, WireWriter};

/// Root of one vault's plaintext content.
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    name: SecureBuffer,
    items: DataCollection<DataItem>,
}

impl DataStore {
    pub fn new(name: &[u8]) -> Self {
        Self {
            name: SecureBuffer::from_slice(name),
            items: DataCollection::new(),
        }
    }

    pub fn name(&self) -> &[u8] {
        self.name.as_slice()
    }

    pub fn items(&self) -> &DataCollection<DataItem> {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut DataCollection<DataItem> {
        &mut self.items
    }

    /// Combine replicas of one vault loaded from different sites.
    ///
    /// Items are aligned across replicas only, never within one: the k-th
    /// item named `n` in one replica pairs with the k-th item named `n` in
    /// each other replica. Each aligned group is combined with
    /// [`DataItem::merge_leaves`]. Unpaired items are kept, in first-seen
    /// order. A single replica is returned unchanged. The store name is
    /// taken from the first replica.
    #[instrument(level = "debug", skip(replicas), fields(replicas = replicas.len()))]
    pub fn reconcile_by_item_name(mut replicas: Vec<Self>) -> Option<Self> {
        if replicas.len() <= 1 {
            return replicas.pop();
        }
        let name = replicas.first()?.name.clone();
        // (last replica that contributed, aligned items)
        let mut groups: Vec<(usize, Vec<DataItem>)> = Vec::new();

        for (replica_index, replica) in replicas.into_iter().enumerate() {
            for item in replica.items {
                let slot = groups.iter_mut().find(|(last, group)| {
                    *last < replica_index && group[0].name() == item.name()
                });
                match slot {
                    Some((last, group)) => {
                        *last = replica_index;
                        group.push(item);
                    }
                    None => groups.push((replica_index, vec![item])),
                }
            }
        }

        let items: DataCollection<_> = groups
            .into_iter()
            .filter_map(|(_, group)| DataItem::merge_leaves(group))
            .collect();
        debug!(items = items.len(), "Reconciled store");
        Some(Self { name, items })
    }
}

impl WireFormat for DataStore {
    fn write_to(&self, out: &mut SecureByteList) -> Result<(), WireError> {
        let mark = out.begin_record()?;
        out.write_bytes(self.name.as_slice())?;
        self.items.write_to(out)?;
        out.end_record(mark)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let mut record = reader.read_record()?;
        let name = SecureBuffer::from_slice(record.read_bytes()?);
        let items = DataCollection::read_from(&mut record)?;
        Ok(Self { name, items })
    }
}
