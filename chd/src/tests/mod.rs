#![cfg(feature = "build")]

use super::{BuildError, BuildOptions, Map, OrderedMap, Set};
use alloc::string::{String, ToString};
use alloc::{vec, vec::Vec};
use rapidhash::RapidRng;

/// Random distinct keys.
fn random_keys(rng: &mut RapidRng, count: usize) -> Vec<u64> {
    let mut keys: Vec<u64> = (0..count).map(|_| rng.next()).collect();
    keys.sort_unstable();
    keys.dedup();
    keys
}

#[test]
fn cat_dog_bird() {
    let map = Map::from_entries(vec![("cat", 1), ("dog", 2), ("bird", 3)]);
    assert_eq!(map.len(), 3);
    assert_eq!(map.get("cat"), Some(&1));
    assert_eq!(map.get("dog"), Some(&2));
    assert_eq!(map.get("bird"), Some(&3));
    assert_eq!(map.get("cow"), None);
}

#[test]
fn duplicate_pair() {
    assert_eq!(
        Set::try_from_elements(vec!["x", "x"]).unwrap_err(),
        BuildError::DuplicateKey {
            first: 0,
            second: 1
        },
    );
}

#[test]
fn empty_set() {
    let set: Set<String> = Set::from_elements(Vec::new());
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert!(!set.contains("anything"));
    assert_eq!(set.iter().count(), 0);
    assert_eq!(set.table().capacity(), 1);
}

#[test]
fn single_key() {
    let map = Map::from_entries(vec![(42u64, "answer")]);
    assert_eq!(map.table().capacity(), 1);
    assert_eq!(map.table().displacements().len(), 1);
    assert_eq!(map.get(&42), Some(&"answer"));
    assert_eq!(map.get(&43), None);
}

#[test]
fn borrow() {
    let map: Map<&u64, usize> = Map::from_entries(vec![(&123, 0), (&456, 1)]);
    assert_eq!(map.get(&&123), Some(&0));
    assert_eq!(map.get(&&456), Some(&1));
    assert_eq!(map.get(&&789), None);
}

#[test]
fn random_maps() {
    let mut rng = RapidRng::new(0x243f_6a88_85a3_08d3);
    for count in [1, 2, 3, 10, 100, 1000, 20_000] {
        let keys = random_keys(&mut rng, count);
        let entries: Vec<(u64, usize)> = keys.iter().copied().zip(0..).collect();
        let map = Map::from_entries(entries.clone());

        assert_eq!(map.len(), keys.len());
        assert!(map.table().capacity() >= keys.len(), "fewer slots than keys");
        for (key, value) in &entries {
            assert_eq!(map.get(key), Some(value));
        }
        for _ in 0..1000 {
            let outsider = rng.next();
            if keys.binary_search(&outsider).is_err() {
                assert_eq!(map.get(&outsider), None);
            }
        }
    }
}

#[test]
fn string_keys() {
    let words: Vec<String> = (0..5000).map(|i| alloc::format!("word{i}")).collect();
    let map = Map::from_entries(words.iter().cloned().zip(0..).collect());
    for (i, word) in words.iter().enumerate() {
        assert_eq!(map.get(word.as_str()), Some(&i));
    }
    assert_eq!(map.get("word5000"), None);
    assert_eq!(map.get(""), None);
}

#[test]
fn deterministic_rebuild() {
    let entries: Vec<(String, u32)> = ["north", "east", "south", "west", "up", "down"]
        .iter()
        .map(ToString::to_string)
        .zip(0..)
        .collect();
    let a = Map::from_entries(entries.clone());
    let b = Map::from_entries(entries);
    assert_eq!(a.table().seed(), b.table().seed());
    assert_eq!(a.table().displacements(), b.table().displacements());
    assert_eq!(a.table().slots(), b.table().slots());
}

#[test]
fn options_change_the_table() {
    let keys: Vec<u32> = (0..500).collect();
    let default = Set::from_elements(keys.clone());
    let reseeded =
        Set::try_from_elements_with(keys.clone(), &BuildOptions::new().with_seed(1)).unwrap();
    assert_ne!(default.table().seed(), reseeded.table().seed());
    for key in &keys {
        assert!(reseeded.contains(key));
    }
}

#[test]
fn bucket_sizes() {
    let mut rng = RapidRng::new(0x1319_8a2e_0370_7344);
    let keys = random_keys(&mut rng, 3000);
    for bucket_size in [1, 2, 4, 5] {
        let options = BuildOptions::new()
            .with_bucket_size(bucket_size)
            .with_slack_percent(10);
        let set = Set::try_from_elements_with(keys.clone(), &options).unwrap();
        assert_eq!(
            set.table().displacements().len(),
            keys.len().div_ceil(bucket_size),
        );
        assert!(keys.iter().all(|key| set.contains(key)), "key lost");
    }
}

#[test]
fn displacement_cap() {
    let keys: Vec<u32> = (0..1000).collect();
    let options = BuildOptions::new()
        .with_max_displacement(0)
        .with_max_attempts(5);
    assert_eq!(
        Set::try_from_elements_with(keys, &options).unwrap_err(),
        BuildError::ConstructionExhausted { attempts: 5 },
    );
}

#[test]
fn ordered_matches_insertion() {
    let mut rng = RapidRng::new(0xa409_3822_299f_31d0);
    let keys = random_keys(&mut rng, 2000);
    let mut shuffled = keys.clone();
    // Any order unrelated to the sorted one will do.
    shuffled.sort_unstable_by_key(|key| key.rotate_left(17));
    let map = OrderedMap::from_entries(shuffled.iter().map(|&key| (key, key / 2)).collect());
    assert!(map.keys().eq(shuffled.iter()), "insertion order lost");
    for (position, key) in shuffled.iter().enumerate() {
        assert_eq!(map.get_full(key), Some((position, key, &(key / 2))));
    }
}

#[test]
#[ignore = "slow without optimizations"]
fn build_1m_integers() {
    let mut rng = RapidRng::new(0x082e_fa98_ec4e_6c89);
    let keys = random_keys(&mut rng, 1_000_000);
    let entries: Vec<(u64, usize)> = keys.iter().copied().zip(0..).collect();
    let map = Map::from_entries(entries.clone());
    for (k, v) in &entries {
        assert_eq!(map.get(k), Some(v));
    }
}
