//! Byte-exact compatibility of the wire format.

use proptest::prelude::*;
use safehold_core::data::KEY_SIZE;
use safehold_core::wire::WireError;
use safehold_core::{DataField, DataIdentity, DataItem, DataStore, DataValue, WireFormat};

#[rustfmt::skip]
const BAR_STORE: [u8; 63] = [
    59, 0, 0, 0,
    3, 0, 0, 0, 98, 97, 114,
    48, 0, 0, 0,
    19, 0, 0, 0, 3, 0, 0, 0, 102, 111, 111, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    21, 0, 0, 0, 5, 0, 0, 0, 5, 6, 7, 8, 9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

fn bar_store() -> DataStore {
    let mut store = DataStore::new(b"bar");
    store.items_mut().add(DataItem::new(b"foo"));
    store.items_mut().add(DataItem::new(&[5, 6, 7, 8, 9]));
    store
}

#[test]
fn test_store_serializes_to_known_bytes() {
    let wire = bar_store().to_wire().unwrap();
    assert_eq!(wire.as_slice(), &BAR_STORE[..]);
}

#[test]
fn test_store_deserializes_known_bytes() {
    let store = DataStore::from_wire(&BAR_STORE).unwrap();
    assert_eq!(store.name(), b"bar");
    assert_eq!(store.items().len(), 2);
    assert_eq!(store.items().get(0).unwrap().name(), b"foo");
    assert_eq!(store.items().get(1).unwrap().name(), &[5u8, 6, 7, 8, 9]);
}

#[test]
fn test_every_truncation_is_rejected() {
    for cut in 0..BAR_STORE.len() {
        let result = DataStore::from_wire(&BAR_STORE[..cut]);
        assert!(
            matches!(result, Err(WireError::Truncated { .. })),
            "cut at {cut} gave {result:?}"
        );
    }
}

#[test]
fn test_record_length_matches_field_sum() {
    let value = DataValue::from_parts(DataIdentity::from_parts([1; KEY_SIZE], 2), b"label");
    let identity_len = 4 + (4 + KEY_SIZE) + (4 + 8);
    assert_eq!(value.to_wire().unwrap().len(), 4 + identity_len + (4 + 5));
}

#[test]
fn test_nested_field_round_trip() {
    let mut field = DataField::new(b"otp", b"123456");
    field.selectors_mut().add(DataValue::new(b"#code"));
    let mut item = DataItem::new(b"bank");
    item.fields_mut().add(field);
    let mut store = DataStore::new(b"vault");
    store.items_mut().add(item);

    let decoded = DataStore::from_wire(store.to_wire().unwrap().as_slice()).unwrap();
    let field = decoded.items().get(0).unwrap().fields().get(0).unwrap();
    assert_eq!(field.name(), b"otp");
    assert_eq!(field.value(), b"123456");
    assert_eq!(field.selectors().get(0).unwrap().value(), b"#code");
}

proptest! {
    #[test]
    fn prop_item_round_trip(
        name in proptest::collection::vec(any::<u8>(), 0..64),
        labels in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..32), 0..8),
    ) {
        let mut item = DataItem::new(&name);
        for label in &labels {
            item.labels_mut().add(DataValue::new(label));
        }
        let decoded = DataItem::from_wire(item.to_wire().unwrap().as_slice()).unwrap();
        prop_assert_eq!(decoded.name(), name.as_slice());
        let decoded_labels: Vec<Vec<u8>> = decoded.labels().iter().map(|v| v.value().to_vec()).collect();
        prop_assert_eq!(decoded_labels, labels);
    }
}
