//! Perfect hash maps that remember insertion order.

use super::{const_vec::ConstVec, hash::PortableHash, table::PerfectHashTable};
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::Index;
#[cfg(feature = "build")]
use {
    super::{BuildError, BuildOptions},
    alloc::vec::Vec,
};

/// A perfect hash map that iterates in insertion order.
///
/// Lookups behave like [`Map`](crate::Map). On top of that, entries can be iterated and indexed in
/// the order they were passed to the constructor.
///
/// ```rust
/// use chd::OrderedMap;
///
/// let map = OrderedMap::from_entries(vec![("z", 26), ("a", 1), ("m", 13)]);
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["z", "a", "m"]);
/// assert_eq!(map.get_index(1), Some((&"a", &1)));
/// assert_eq!(map.get_full("m"), Some((2, &"m", &13)));
/// ```
#[derive(Clone)]
#[cfg_attr(all(feature = "alloc", feature = "serde"), derive(serde::Deserialize))]
#[cfg_attr(
    all(feature = "alloc", feature = "serde"),
    serde(
        bound(
            deserialize = "K: serde::Deserialize<'de> + PortableHash, V: serde::Deserialize<'de>"
        ),
        try_from = "OrderedMapInner<K, V>"
    )
)]
pub struct OrderedMap<K, V> {
    /// The actual map.
    inner: OrderedMapInner<K, V>,
}

/// The actual map.
///
/// This needs to be a separate type so that `serde` can convert from this type to [`OrderedMap`]
/// with [`TryFrom`] during deserialization, so that we can validate the order.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(all(feature = "alloc", feature = "serde"), derive(serde::Deserialize))]
#[cfg_attr(
    all(feature = "alloc", feature = "serde"),
    serde(bound(
        deserialize = "K: serde::Deserialize<'de> + PortableHash, V: serde::Deserialize<'de>"
    ))
)]
struct OrderedMapInner<K, V> {
    /// Entries, each tagged with its insertion position.
    table: PerfectHashTable<K, (usize, V)>,

    /// Slot index of each entry, by insertion position.
    order: ConstVec<usize>,
}

#[cfg(feature = "build")]
impl<K: PortableHash + Eq, V> OrderedMap<K, V> {
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
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(position, (key, value))| (key, (position, value)))
            .collect();
        let (table, order) = PerfectHashTable::try_from_entries_with_slots(entries, options)?;
        Ok(Self::__from_raw_parts(table, ConstVec::from_vec(order)))
    }

    /// Build a map with the default options.
    ///
    /// # Panics
    ///
    /// Panics if two keys are equal or if construction runs out of attempts.
    #[inline]
    #[must_use]
    pub fn from_entries(entries: Vec<(K, V)>) -> Self {
        Self::try_from_entries(entries).unwrap_or_else(|error| panic!("{error}"))
    }
}

impl<K, V> OrderedMap<K, V> {
    /// Initialize from saved data.
    ///
    /// Meant for codegen, not for public use.
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn __from_raw_parts(
        table: PerfectHashTable<K, (usize, V)>,
        order: ConstVec<usize>,
    ) -> Self {
        Self {
            inner: OrderedMapInner { table, order },
        }
    }

    /// The underlying table. Payloads carry insertion positions.
    #[inline]
    #[must_use]
    pub const fn table(&self) -> &PerfectHashTable<K, (usize, V)> {
        &self.inner.table
    }

    /// Get the insertion position and the entry by key.
    #[inline]
    pub fn get_full<Q>(&self, key: &Q) -> Option<(usize, &K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.inner
            .table
            .lookup(key)
            .map(|(k, (position, v))| (*position, k, v))
    }

    /// Get a key-value pair by key.
    #[inline]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.get_full(key).map(|(_, k, v)| (k, v))
    }

    /// Get a value by key.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.get_full(key).map(|(_, _, v)| v)
    }

    /// Get the insertion position of a key.
    #[inline]
    pub fn get_index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.get_full(key).map(|(position, _, _)| position)
    }

    /// Check if the map contains a key.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.get_full(key).is_some()
    }

    /// Get the entry inserted at `index`.
    #[inline]
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        let slot = *self.inner.order.get(index)?;
        entry(self.inner.table.slots(), slot)
    }

    /// Get number of entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.table.len()
    }

    /// Check if the map is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.inner.table.is_empty()
    }

    /// Iterate through entries in insertion order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            order: self.inner.order.iter(),
            slots: self.inner.table.slots(),
        }
    }

    /// Iterate through keys in insertion order.
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { iter: self.iter() }
    }

    /// Iterate through values in insertion order.
    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { iter: self.iter() }
    }
}

/// Look up an occupied slot.
#[inline]
fn entry<K, V>(slots: &[Option<(K, (usize, V))>], slot: usize) -> Option<(&K, &V)> {
    slots.get(slot)?.as_ref().map(|(k, (_, v))| (k, v))
}

impl<K, V, Q> Index<&Q> for OrderedMap<K, V>
where
    K: Borrow<Q>,
    Q: ?Sized + PortableHash + Eq,
{
    type Output = V;

    #[inline]
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found")
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of an [`OrderedMap`], in insertion order.
pub struct Iter<'a, K, V> {
    /// Slot indices not visited yet.
    order: core::slice::Iter<'a, usize>,
    /// All slots of the table.
    slots: &'a [Option<(K, (usize, V))>],
}

impl<K, V> Clone for Iter<'_, K, V> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            order: self.order.clone(),
            slots: self.slots,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        entry(self.slots, *self.order.next()?)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        entry(self.slots, *self.order.next_back()?)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

projection!(
    /// Iterator over the keys of an [`OrderedMap`], in insertion order.
    Keys over Iter => K, |k, _| k
);

projection!(
    /// Iterator over the values of an [`OrderedMap`], in insertion order.
    Values over Iter => V, |_, v| v
);

/// Serializes the inner type, which is what `try_from` expects on the way back.
#[cfg(feature = "serde")]
impl<K: serde::Serialize, V: serde::Serialize> serde::Serialize for OrderedMap<K, V> {
    #[inline]
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.inner, serializer)
    }
}

/// Scope for `serde`-related code.
#[cfg(all(feature = "alloc", feature = "serde"))]
mod serde_support {
    use super::{OrderedMap, OrderedMapInner};
    use displaydoc::Display;
    use thiserror::Error;

    /// Deserialization validation failures.
    #[derive(Debug, Display, Error)]
    pub enum Error {
        /// order length does not match the number of entries
        WrongOrderLength,

        /// position {0} does not point at its own entry
        BadOrder(usize),
    }

    impl<K, V> TryFrom<OrderedMapInner<K, V>> for OrderedMap<K, V> {
        type Error = Error;

        #[inline]
        fn try_from(inner: OrderedMapInner<K, V>) -> Result<Self, Error> {
            if inner.order.len() != inner.table.len() {
                return Err(Error::WrongOrderLength);
            }

            // Every occupied slot stores one position, so this also rules out repeated slots.
            for (position, &slot) in inner.order.iter().enumerate() {
                match inner.table.slots().get(slot) {
                    Some(Some((_, (stored, _)))) if *stored == position => {}
                    _ => return Err(Error::BadOrder(position)),
                }
            }

            Ok(Self { inner })
        }
    }
}

#[cfg(feature = "codegen")]
impl<K: super::codegen::Codegen, V: super::codegen::Codegen> super::codegen::Codegen
    for OrderedMap<K, V>
{
    #[inline]
    fn generate_piece(&self, gen: &mut super::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let ordered_map = gen.path("chd::OrderedMap");
        let table = gen.piece(&self.inner.table);
        let order = gen.piece(&self.inner.order);
        quote::quote!(#ordered_map::__from_raw_parts(#table, #order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{format, vec};

    fn sample() -> OrderedMap<&'static str, u32> {
        OrderedMap::from_entries(vec![("one", 1), ("two", 2), ("three", 3), ("four", 4)])
    }

    #[test]
    fn insertion_order() {
        let map = sample();
        assert_eq!(
            map.iter().collect::<Vec<_>>(),
            [(&"one", &1), (&"two", &2), (&"three", &3), (&"four", &4)],
        );
        assert_eq!(
            map.keys().rev().copied().collect::<Vec<_>>(),
            ["four", "three", "two", "one"],
        );
        assert_eq!(map.values().copied().collect::<Vec<_>>(), [1, 2, 3, 4]);
    }

    #[test]
    fn lookups() {
        let map = sample();
        assert_eq!(map.len(), 4);
        assert_eq!(map.get("three"), Some(&3));
        assert_eq!(map.get("five"), None);
        assert_eq!(map.get_full("two"), Some((1, &"two", &2)));
        assert_eq!(map.get_index_of("four"), Some(3));
        assert_eq!(map.get_index(0), Some((&"one", &1)));
        assert_eq!(map.get_index(4), None);
        assert!(map.contains_key("one"));
        assert_eq!(map["four"], 4);
    }

    #[test]
    fn iterators_restart_and_meet() {
        let map = sample();
        let mut iter = map.iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next(), Some((&"one", &1)));
        let snapshot = iter.clone();
        assert_eq!(iter.next_back(), Some((&"four", &4)));
        assert_eq!(iter.next(), Some((&"two", &2)));
        assert_eq!(iter.next_back(), Some((&"three", &3)));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.count(), 3);

        let mut keys = map.keys();
        assert_eq!(keys.next(), Some(&"one"));
        assert_eq!(keys.clone().count(), 3);
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn large_order() {
        let entries: Vec<(u32, u32)> = (0..1000)
            .map(|i: u32| (i.wrapping_mul(2_654_435_761), i))
            .collect();
        let map = OrderedMap::from_entries(entries.clone());
        assert!(map.iter().map(|(k, v)| (*k, *v)).eq(entries.iter().copied()), "order broken");
        for (position, (key, value)) in entries.iter().enumerate() {
            assert_eq!(map.get_full(key), Some((position, key, value)));
        }
    }

    #[test]
    fn empty() {
        let map: OrderedMap<u8, u8> = OrderedMap::from_entries(Vec::new());
        assert!(map.is_empty());
        assert_eq!(map.iter().next(), None);
        assert_eq!(map.get_index(0), None);
        assert_eq!(format!("{map:?}"), "{}");
    }

    #[test]
    fn duplicates() {
        assert_eq!(
            OrderedMap::try_from_entries(vec![(1u8, 'a'), (2, 'b'), (1, 'c')]).unwrap_err(),
            BuildError::DuplicateKey {
                first: 0,
                second: 2
            },
        );
    }

    #[test]
    fn debug() {
        let map = OrderedMap::from_entries(vec![("b", 2u8), ("a", 1)]);
        assert_eq!(format!("{map:?}"), r#"{"b": 2, "a": 1}"#);
    }
}
