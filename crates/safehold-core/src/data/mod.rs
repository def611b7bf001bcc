//! Record identities, reconciliation and the vault's record hierarchy.
//!
//! The hierarchy is `DataStore -> DataItem -> {fields, labels, locations}`,
//! with `DataField` owning a further collection of selector values. Every
//! level owns its children outright; dropping a store wipes the whole tree.
//!
//! # Reconciliation
//!
//! Only identity-bearing records ([`DataValue`] and [`DataField`]) are
//! reconciled. Given the same collection from several replicas,
//! [`merge_by_identity`] groups records by [`DataIdentity`] key and keeps the
//! newest of each group. Records present in a single replica survive as-is;
//! there are no tombstones.
//!
//! Candidates with exactly equal versions resolve to the first one seen, so
//! the outcome depends on the order replicas are supplied in.
//!
//! Items and stores carry no identity. [`DataStore::reconcile_by_item_name`]
//! aligns items of different replicas by byte-identical name and occurrence
//! and merges only their leaf collections; it never picks one item over
//! another, and never combines two items of the same replica.
//!
//! # Concurrency
//!
//! None of these types synchronize internally. Mutating a collection from
//! several threads requires external locking.

mod collection;
mod field;
mod identity;
mod item;
mod store;
mod value;

pub use collection::{DataCollection, merge_by_identity};
pub use field::DataField;
pub use identity::{DataIdentity, KEY_SIZE};
pub use item::DataItem;
pub use store::DataStore;
pub use value::DataValue;

/// A record that can be reconciled across replicas.
pub trait Identifiable: Sized {
    fn identity(&self) -> &DataIdentity;

    /// Reduce same-identity candidates to one survivor.
    ///
    /// The default keeps the newest candidate. Types owning nested
    /// identifiable collections override this to merge those as well.
    /// Returns `None` only for an empty candidate list.
    fn merge(candidates: Vec<Self>) -> Option<Self> {
        select_newest(candidates)
    }
}

/// Keep the candidate with the greatest version and drop the rest.
///
/// Ties go to the earliest candidate.
pub fn select_newest<T: Identifiable>(candidates: Vec<T>) -> Option<T> {
    let mut survivor: Option<T> = None;
    for candidate in candidates {
        match &survivor {
            Some(current) => {
                debug_assert_eq!(
                    current.identity(),
                    candidate.identity(),
                    "select_newest requires candidates sharing one key"
                );
                if candidate.identity().is_newer_than(current.identity()) {
                    survivor = Some(candidate);
                }
            }
            None => survivor = Some(candidate),
        }
    }
    survivor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(version: u64, content: &[u8]) -> DataValue {
        DataValue::from_parts(DataIdentity::from_parts([3; KEY_SIZE], version), content)
    }

    #[test]
    fn test_select_newest_picks_greatest_version() {
        let winner = select_newest(vec![value(1, b"old"), value(5, b"new"), value(3, b"mid")]).unwrap();
        assert_eq!(winner.identity().version(), 5);
        assert_eq!(winner.value(), b"new");
    }

    #[test]
    fn test_select_newest_tie_keeps_first_seen() {
        let winner = select_newest(vec![value(4, b"first"), value(4, b"second")]).unwrap();
        assert_eq!(winner.value(), b"first");

        let winner = select_newest(vec![value(4, b"second"), value(4, b"first")]).unwrap();
        assert_eq!(winner.value(), b"second");
    }

    #[test]
    fn test_select_newest_empty() {
        assert!(select_newest::<DataValue>(Vec::new()).is_none());
    }
}
