//! Serialization round trips and validation of corrupted input.
#![cfg(all(feature = "serde", feature = "build"))]

use chd::low_level::{ConstVec, Mixer, UntypedPhf};
use chd::{Map, OrderedMap, Set};
use serde_json::{json, Value};

fn sample_map() -> Map<String, u32> {
    Map::from_entries(
        ["red", "green", "blue", "cyan", "magenta", "yellow"]
            .into_iter()
            .map(String::from)
            .zip(1..)
            .collect(),
    )
}

/// Indices of the occupied slots in a serialized table.
fn occupied(table: &Value) -> Vec<usize> {
    table["slots"]
        .as_array()
        .unwrap()
        .iter()
        .enumerate()
        .filter(|(_, slot)| !slot.is_null())
        .map(|(index, _)| index)
        .collect()
}

#[test]
fn map_round_trip() {
    let map = sample_map();
    let text = serde_json::to_string(&map).unwrap();
    let restored: Map<String, u32> = serde_json::from_str(&text).unwrap();

    assert_eq!(restored.len(), map.len());
    for (key, value) in &map {
        assert_eq!(restored.get(key.as_str()), Some(value));
    }
    assert_eq!(restored.get("black"), None);
    assert_eq!(restored.table().seed(), map.table().seed());
}

#[test]
fn set_round_trip() {
    let set = Set::from_elements((0..100u32).collect());
    let restored: Set<u32> = serde_json::from_value(serde_json::to_value(&set).unwrap()).unwrap();
    assert!((0..100).all(|i| restored.contains(&i)));
    assert!(!restored.contains(&100));
}

#[test]
fn ordered_round_trip() {
    let map = OrderedMap::from_entries(vec![(30u8, 'c'), (10, 'a'), (20, 'b')]);
    let restored: OrderedMap<u8, char> =
        serde_json::from_value(serde_json::to_value(&map).unwrap()).unwrap();
    assert!(restored.iter().eq(map.iter()));
    assert_eq!(restored.get_index(0), Some((&30, &'c')));
}

#[test]
fn wrong_len() {
    let mut value = serde_json::to_value(sample_map()).unwrap();
    value["len"] = json!(99);
    let error = serde_json::from_value::<Map<String, u32>>(value).unwrap_err();
    assert!(
        error.to_string().contains("does not match the number of entries"),
        "{error}",
    );
}

#[test]
fn wrong_slot_count() {
    let mut value = serde_json::to_value(sample_map()).unwrap();
    value["slots"].as_array_mut().unwrap().push(Value::Null);
    let error = serde_json::from_value::<Map<String, u32>>(value).unwrap_err();
    assert!(error.to_string().contains("slot count"), "{error}");
}

#[test]
fn misplaced_entry() {
    let mut value = serde_json::to_value(sample_map()).unwrap();
    let slots = occupied(&value);
    value["slots"].as_array_mut().unwrap().swap(slots[0], slots[1]);
    let error = serde_json::from_value::<Map<String, u32>>(value).unwrap_err();
    assert!(error.to_string().contains("belongs elsewhere"), "{error}");
}

#[test]
fn displacement_out_of_range() {
    let mut value = serde_json::to_value(sample_map()).unwrap();
    let table_size = value["phf"]["untyped_phf"]["table_size"].as_u64().unwrap();
    value["phf"]["untyped_phf"]["displacements"][0] = json!(table_size * 4);
    let error = serde_json::from_value::<Map<String, u32>>(value).unwrap_err();
    assert!(error.to_string().contains("out of range"), "{error}");
}

#[test]
fn empty_table() {
    let mut value = serde_json::to_value(sample_map()).unwrap();
    value["phf"]["untyped_phf"]["table_size"] = json!(0);
    let error = serde_json::from_value::<Map<String, u32>>(value).unwrap_err();
    assert!(error.to_string().contains("zero table size"), "{error}");
}

#[test]
fn bad_order() {
    let map = OrderedMap::from_entries(vec![("first", 1), ("second", 2), ("third", 3)]);
    let mut value = serde_json::to_value(&map).unwrap();
    value["order"].as_array_mut().unwrap().reverse();
    let error = serde_json::from_value::<OrderedMap<String, i32>>(value).unwrap_err();
    assert!(error.to_string().contains("own entry"), "{error}");

    let mut value = serde_json::to_value(&map).unwrap();
    value["order"].as_array_mut().unwrap().pop();
    let error = serde_json::from_value::<OrderedMap<String, i32>>(value).unwrap_err();
    assert!(error.to_string().contains("order length"), "{error}");
}

#[test]
fn xor_round_trip() {
    let phf = UntypedPhf::__from_raw_parts(5, ConstVec::from_static_ref(&[0, 6]), Mixer::Xor);
    let value = serde_json::to_value(&phf).unwrap();
    assert_eq!(value["mixer"], "Xor");

    let restored: UntypedPhf = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(restored.mixer(), Mixer::Xor);
    assert_eq!(restored.displacements(), &[0, 6]);
    for pair in [(0, 2), (1, 2), (1, 4), (3, 6)] {
        assert_eq!(restored.index(pair), phf.index(pair));
    }

    // 6 is past what `Add` can use on 5 slots, but within the power-of-two span of `Xor`.
    let mut add = value.clone();
    add["mixer"] = json!("Add");
    let error = serde_json::from_value::<UntypedPhf>(add).unwrap_err();
    assert!(error.to_string().contains("out of range"), "{error}");

    let mut too_far = value;
    too_far["displacements"][1] = json!(8);
    let error = serde_json::from_value::<UntypedPhf>(too_far).unwrap_err();
    assert!(error.to_string().contains("out of range"), "{error}");
}
