use std::collections::HashMap;

use super::{DataIdentity, Identifiable, KEY_SIZE};
use crate::memory::SecureByteList;
use crate::wire::{WireError, WireFormat, WireReader, WireWriter};

/// Owning, insertion-ordered sequence of records.
///
/// Removing a record drops it, which wipes any secret bytes it holds.
#[derive(Debug, Clone)]
pub struct DataCollection<T> {
    items: Vec<T>,
}

impl<T> DataCollection<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    /// Remove and drop the item at `index`. Returns `false` if out of range.
    pub fn remove(&mut self, index: usize) -> bool {
        self.take(index).is_some()
    }

    /// Remove the item at `index` and hand it back to the caller.
    pub fn take(&mut self, index: usize) -> Option<T> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: PartialEq> DataCollection<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }
}

impl<T: Identifiable> DataCollection<T> {
    pub fn find_by_identity(&self, identity: &DataIdentity) -> Option<&T> {
        self.items.iter().find(|item| item.identity() == identity)
    }
}

impl<T> Default for DataCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for DataCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for DataCollection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a DataCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: WireFormat> WireFormat for DataCollection<T> {
    fn write_to(&self, out: &mut SecureByteList) -> Result<(), WireError> {
        let mark = out.begin_record()?;
        for item in &self.items {
            item.write_to(out)?;
        }
        out.end_record(mark)
    }

    fn read_from(reader: &mut WireReader<'_>) -> Result<Self, WireError> {
        let mut record = reader.read_record()?;
        let mut items = Vec::new();
        while !record.is_exhausted() {
            items.push(T::read_from(&mut record)?);
        }
        Ok(Self { items })
    }
}

/// Reconcile the same collection from several replicas.
///
/// Records are grouped by identity key across every replica and each group
/// is reduced with [`Identifiable::merge`]. Output order follows the first
/// appearance of each key, scanning replicas in the order given.
pub fn merge_by_identity<T, I>(replicas: I) -> DataCollection<T>
where
    T: Identifiable,
    I: IntoIterator<Item = DataCollection<T>>,
{
    let mut groups: Vec<Vec<T>> = Vec::new();
    let mut index: HashMap<[u8; KEY_SIZE], usize> = HashMap::new();

    for replica in replicas {
        for item in replica {
            let key = *item.identity().key();
            match index.get(&key) {
                Some(&slot) => groups[slot].push(item),
                None => {
                    index.insert(key, groups.len());
                    groups.push(vec![item]);
                }
            }
        }
    }

    groups.into_iter().filter_map(T::merge).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataValue;

    fn value(key: u8, version: u64, content: &[u8]) -> DataValue {
        DataValue::from_parts(DataIdentity::from_parts([key; KEY_SIZE], version), content)
    }

    #[test]
    fn test_add_remove_take() {
        let mut collection = DataCollection::new();
        collection.add(value(1, 1, b"a"));
        collection.add(value(2, 1, b"b"));
        collection.add(value(3, 1, b"c"));

        assert!(collection.remove(0));
        assert!(!collection.remove(7));
        let taken = collection.take(1).unwrap();
        assert_eq!(taken.value(), b"c");
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(0).unwrap().value(), b"b");

        collection.clear();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_contains_and_find() {
        let mut collection = DataCollection::new();
        collection.add(value(1, 1, b"a"));

        assert!(collection.contains(&value(1, 9, b"other revision")));
        assert!(!collection.contains(&value(2, 1, b"a")));

        let lookup = DataIdentity::from_parts([1; KEY_SIZE], 0);
        assert_eq!(collection.find_by_identity(&lookup).unwrap().value(), b"a");
    }

    #[test]
    fn test_empty_collection_wire() {
        let collection = DataCollection::<DataValue>::new();
        assert_eq!(collection.to_wire().unwrap().as_slice(), &[0, 0, 0, 0]);
        assert!(DataCollection::<DataValue>::from_wire(&[0, 0, 0, 0]).unwrap().is_empty());
    }

    #[test]
    fn test_merge_keeps_newest_and_unmatched() {
        let left: DataCollection<_> = [value(1, 10, b"left-1"), value(2, 5, b"left-2")].into_iter().collect();
        let right: DataCollection<_> = [value(2, 7, b"right-2"), value(3, 1, b"right-3")].into_iter().collect();

        let merged = merge_by_identity([left, right]);
        let contents: Vec<&[u8]> = merged.iter().map(DataValue::value).collect();
        assert_eq!(contents, vec![&b"left-1"[..], b"right-2", b"right-3"]);
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        let merged = merge_by_identity(Vec::<DataCollection<DataValue>>::new());
        assert!(merged.is_empty());
    }
}
