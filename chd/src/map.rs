//! Perfect hash maps.

use super::{
    hash::PortableHash,
    table::{Entries, PerfectHashTable},
};
use core::borrow::Borrow;
use core::fmt;
use core::ops::Index;
#[cfg(feature = "build")]
use {
    super::{BuildError, BuildOptions},
    alloc::vec::Vec,
};

/// A perfect hash map.
///
/// An immutable map over a key set fixed at construction. Lookups take one hash computation and
/// one key comparison, with no probing.
///
/// ```rust
/// use chd::Map;
///
/// let map = Map::from_entries(vec![(String::from("one"), 1), (String::from("two"), 2)]);
/// // `String` keys can be queried with `&str`.
/// assert_eq!(map["two"], 2);
/// assert_eq!(map.get_key_value("one"), Some((&String::from("one"), &1)));
/// assert!(!map.contains_key("three"));
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(all(feature = "alloc", feature = "serde"), derive(serde::Deserialize))]
#[cfg_attr(
    all(feature = "alloc", feature = "serde"),
    serde(bound(
        deserialize = "K: serde::Deserialize<'de> + PortableHash, V: serde::Deserialize<'de>"
    ))
)]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Map<K, V> {
    /// Values are stored as payloads.
    table: PerfectHashTable<K, V>,
}

#[cfg(feature = "build")]
impl<K: PortableHash + Eq, V> Map<K, V> {
    /// Try to build a map with the default options.
    ///
    /// # Errors
    ///
    /// Fails if two keys are equal or if construction runs out of attempts.
    #[inline]
    pub fn try_from_entries(entries: Vec<(K, V)>) -> Result<Self, BuildError> {
        Self::try_from_entries_with(entries, &BuildOptions::new())
    }

    /// Try to build a map with custom options.
    ///
    /// # Errors
    ///
    /// Fails if two keys are equal or if construction runs out of attempts.
    #[inline]
    pub fn try_from_entries_with(
        entries: Vec<(K, V)>,
        options: &BuildOptions,
    ) -> Result<Self, BuildError> {
        PerfectHashTable::try_from_entries(entries, options).map(Self::from_table)
    }

    /// Build a map with the default options.
    ///
    /// # Panics
    ///
    /// Panics if two keys are equal or if construction runs out of attempts.
    #[inline]
    #[must_use]
    pub fn from_entries(entries: Vec<(K, V)>) -> Self {
        Self::from_table(PerfectHashTable::from_entries(entries))
    }
}

impl<K, V> Map<K, V> {
    /// Initialize from saved data.
    ///
    /// Meant for codegen, not for public use.
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn __from_raw_parts(table: PerfectHashTable<K, V>) -> Self {
        Self { table }
    }

    /// Wrap a table.
    #[inline]
    #[must_use]
    pub const fn from_table(table: PerfectHashTable<K, V>) -> Self {
        Self { table }
    }

    /// The underlying table.
    #[inline]
    #[must_use]
    pub const fn table(&self) -> &PerfectHashTable<K, V> {
        &self.table
    }

    /// Get a key-value pair by key.
    ///
    /// The returned key is the one stored in the map, which makes this method useful for
    /// interning.
    #[inline]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.table.lookup(key)
    }

    /// Get a value by key.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Check if the map contains a key.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.get_key_value(key).is_some()
    }

    /// Get number of entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if the map is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterate through entries.
    ///
    /// The iteration order is unspecified, but is constant for a given map.
    #[inline]
    pub fn iter(&self) -> Entries<'_, K, V> {
        self.table.iter()
    }

    /// Iterate through keys.
    ///
    /// The iteration order is unspecified, but is constant for a given map.
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { iter: self.iter() }
    }

    /// Iterate through values.
    ///
    /// The iteration order is unspecified, but is constant for a given map.
    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { iter: self.iter() }
    }
}

impl<K, V, Q> Index<&Q> for Map<K, V>
where
    K: Borrow<Q>,
    Q: ?Sized + PortableHash + Eq,
{
    type Output = V;

    /// Get a value by key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present.
    #[inline]
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found")
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Map<K, V> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a Map<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Entries<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

projection!(
    /// Iterator over the keys of a [`Map`].
    Keys over Entries => K, |k, _| k
);

projection!(
    /// Iterator over the values of a [`Map`].
    Values over Entries => V, |_, v| v
);

#[cfg(feature = "codegen")]
impl<K: super::codegen::Codegen, V: super::codegen::Codegen> super::codegen::Codegen
    for Map<K, V>
{
    #[inline]
    fn generate_piece(&self, gen: &mut super::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let map = gen.path("chd::Map");
        let table = gen.piece(&self.table);
        quote::quote!(#map::__from_raw_parts(#table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{format, string::String, vec};

    #[test]
    fn lookups() {
        let map = Map::from_entries(vec![("cat", 1), ("dog", 2), ("bird", 3)]);
        assert_eq!(map.len(), 3);
        assert!(!map.is_empty());
        assert_eq!(map.get("cat"), Some(&1));
        assert_eq!(map.get("dog"), Some(&2));
        assert_eq!(map.get("bird"), Some(&3));
        assert_eq!(map.get("cow"), None);
        assert!(map.contains_key("bird"));
        assert!(!map.contains_key(""));
        assert_eq!(map["dog"], 2);
    }

    #[test]
    #[should_panic = "key not found"]
    fn index_missing() {
        let map = Map::from_entries(vec![(1u32, ())]);
        let () = map[&2];
    }

    #[test]
    fn borrowed_queries() {
        let map = Map::from_entries(vec![(String::from("hello"), 5), (String::from("world"), 6)]);
        let (key, value) = map.get_key_value("world").unwrap();
        assert_eq!(key, "world");
        assert_eq!(*value, 6);
        assert_eq!(map.get(&String::from("hello")), Some(&5));
    }

    #[test]
    fn iteration() {
        let map = Map::from_entries((0..50u32).map(|i| (i, i * 2)).collect());
        let mut keys: Vec<u32> = map.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..50).collect::<Vec<_>>());
        assert_eq!(map.values().len(), 50);
        assert_eq!(map.values().sum::<u32>(), 2 * (0..50).sum::<u32>());
        for (k, v) in &map {
            assert_eq!(*v, k * 2);
        }
        assert!(map.iter().eq(map.iter()), "iteration order changed");
    }

    #[test]
    fn keys_and_values() {
        let map = Map::from_entries(vec![("north", 0u8), ("east", 1), ("south", 2), ("west", 3)]);
        assert!(
            map.keys().zip(map.values()).eq(map.iter()),
            "keys and values disagree with entries",
        );

        let mut keys = map.keys();
        let first = keys.next();
        let restarted = keys.clone();
        let last = keys.next_back();
        assert_eq!(keys.len(), 2);
        assert_eq!(restarted.len(), 3);
        assert_eq!(restarted.last(), last);
        assert_eq!(map.keys().next(), first);

        let mut values = map.values();
        assert_eq!(values.by_ref().count(), 4);
        assert_eq!(values.next(), None);
        assert_eq!(values.next_back(), None);
    }

    #[test]
    fn errors() {
        assert_eq!(
            Map::try_from_entries(vec![("x", 1), ("x", 2)]).unwrap_err(),
            BuildError::DuplicateKey {
                first: 0,
                second: 1
            },
        );
        let options = BuildOptions::new().with_max_attempts(0);
        assert_eq!(
            Map::try_from_entries_with(vec![("x", 1)], &options).unwrap_err(),
            BuildError::ConstructionExhausted { attempts: 0 },
        );
    }

    #[test]
    fn debug() {
        let map = Map::from_entries(vec![('a', 1u8)]);
        assert_eq!(format!("{map:?}"), "{'a': 1}");
        let empty: Map<u8, u8> = Map::from_entries(Vec::new());
        assert_eq!(format!("{empty:?}"), "{}");
    }
}
