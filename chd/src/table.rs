//! The slot table behind every map and set.

use super::{
    const_vec::ConstVec,
    hash::{PortableHash, Seed},
    Phf,
};
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
#[cfg(feature = "build")]
use {
    super::{algorithms::scatter, BuildError, BuildOptions},
    alloc::vec::Vec,
};

/// A perfect hash table.
///
/// Stores `(key, payload)` pairs in slots addressed by a [`Phf`] over the keys. Each key has a slot
/// of its own; the remaining slots are `None`. A lookup computes the key's slot and checks that the
/// stored key is equal to the probe, so keys outside the table are reported as absent even when
/// they hash onto an occupied slot.
///
/// The seed, the displacements and the slots fully describe the table, and are exposed for
/// emission. [`Map`](crate::Map), [`Set`](crate::Set) and the ordered variants are thin wrappers
/// around one table each.
#[derive(Clone)]
#[cfg_attr(all(feature = "alloc", feature = "serde"), derive(serde::Deserialize))]
#[cfg_attr(
    all(feature = "alloc", feature = "serde"),
    serde(
        bound(
            deserialize = "K: serde::Deserialize<'de> + PortableHash, P: serde::Deserialize<'de>"
        ),
        try_from = "TableInner<K, P>"
    )
)]
pub struct PerfectHashTable<K, P> {
    /// The actual table.
    inner: TableInner<K, P>,
}

/// The actual table.
///
/// This needs to be a separate type so that `serde` can convert from this type to
/// [`PerfectHashTable`] with [`TryFrom`] during deserialization, so that we can validate the table.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(all(feature = "alloc", feature = "serde"), derive(serde::Deserialize))]
struct TableInner<K, P> {
    /// A PHF mapping keys to indices in [`slots`](Self::slots).
    phf: Phf<K>,

    /// The entries, indexed by the perfect hashes of their keys. `None` marks a free slot.
    slots: ConstVec<Option<(K, P)>>,

    /// The number of entries.
    ///
    /// This is equal to the number of `Some` values in [`slots`](Self::slots) and is used purely
    /// for optimization of [`len`](PerfectHashTable::len).
    len: usize,
}

#[cfg(feature = "build")]
impl<K: PortableHash + Eq, P> PerfectHashTable<K, P> {
    /// Try to build a table.
    ///
    /// # Errors
    ///
    /// Fails if two keys are equal or if construction runs out of attempts.
    #[inline] // heavy, but monomorphized anyway
    pub fn try_from_entries(
        entries: Vec<(K, P)>,
        options: &BuildOptions,
    ) -> Result<Self, BuildError> {
        let phf = Phf::try_from_keys(entries.iter().map(|(key, _)| key), options)?;
        let positions: Vec<usize> = entries.iter().map(|(key, _)| phf.hash(key)).collect();
        Ok(Self::assemble(phf, entries, &positions))
    }

    /// Build a table and also return the slot of each entry, in input order.
    pub(crate) fn try_from_entries_with_slots(
        entries: Vec<(K, P)>,
        options: &BuildOptions,
    ) -> Result<(Self, Vec<usize>), BuildError> {
        let phf = Phf::try_from_keys(entries.iter().map(|(key, _)| key), options)?;
        let positions: Vec<usize> = entries.iter().map(|(key, _)| phf.hash(key)).collect();
        let table = Self::assemble(phf, entries, &positions);
        Ok((table, positions))
    }

    /// Build a table with the default options.
    ///
    /// # Panics
    ///
    /// Panics if two keys are equal or if construction runs out of attempts.
    #[inline]
    #[must_use]
    pub fn from_entries(entries: Vec<(K, P)>) -> Self {
        Self::try_from_entries(entries, &BuildOptions::new()).unwrap_or_else(|error| panic!("{error}"))
    }

    /// Move entries into their slots.
    fn assemble(phf: Phf<K>, entries: Vec<(K, P)>, positions: &[usize]) -> Self {
        let len = entries.len();
        let mut slots: Vec<Option<(K, P)>> = (0..phf.capacity()).map(|_| None).collect();
        scatter(positions.iter().copied().zip(entries), &mut slots);
        Self {
            inner: TableInner {
                phf,
                slots: ConstVec::from_vec(slots),
                len,
            },
        }
    }
}

impl<K, P> PerfectHashTable<K, P> {
    /// Initialize from saved data.
    ///
    /// Meant for codegen, not for public use.
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn __from_raw_parts(
        phf: Phf<K>,
        slots: ConstVec<Option<(K, P)>>,
        len: usize,
    ) -> Self {
        Self {
            inner: TableInner { phf, slots, len },
        }
    }

    /// Find the entry stored under `key`.
    ///
    /// One hash computation, one slot access and one key comparison.
    #[inline]
    pub fn lookup<Q>(&self, key: &Q) -> Option<(&K, &P)>
    where
        K: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.inner
            .slots
            .get(self.inner.phf.hash(key))?
            .as_ref()
            .filter(|(k, _)| Borrow::<Q>::borrow(k) == key)
            .map(|(k, p)| (k, p))
    }

    /// The slot `key` hashes to, whether or not it is stored there.
    ///
    /// Always below [`capacity`](Self::capacity). Useful for diagnostics only.
    #[inline]
    pub fn slot_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + PortableHash,
    {
        self.inner.phf.hash(key)
    }

    /// Get the number of entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.inner.len
    }

    /// Check if the table has no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.inner.phf.capacity()
    }

    /// The seed keys are hashed with.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> &Seed {
        self.inner.phf.seed()
    }

    /// Per-bucket displacements.
    #[inline]
    #[must_use]
    pub fn displacements(&self) -> &[u32] {
        self.inner.phf.displacements()
    }

    /// All slots, including the free ones.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[Option<(K, P)>] {
        &self.inner.slots
    }

    /// The perfect hash function addressing the slots.
    #[inline]
    #[must_use]
    pub const fn phf(&self) -> &Phf<K> {
        &self.inner.phf
    }

    /// Iterate through entries in slot order.
    ///
    /// The order is unspecified, but is constant for a given table.
    #[inline]
    pub fn iter(&self) -> Entries<'_, K, P> {
        Entries {
            slots: self.inner.slots.iter(),
            remaining: self.inner.len,
        }
    }
}

impl<K: fmt::Debug, P: fmt::Debug> fmt::Debug for PerfectHashTable<K, P> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, P> IntoIterator for &'a PerfectHashTable<K, P> {
    type Item = (&'a K, &'a P);
    type IntoIter = Entries<'a, K, P>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`PerfectHashTable`], in slot order.
pub struct Entries<'a, K, P> {
    /// Slots not visited yet.
    slots: core::slice::Iter<'a, Option<(K, P)>>,
    /// Entries not yielded yet.
    remaining: usize,
}

impl<K, P> Clone for Entries<'_, K, P> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, P> Iterator for Entries<'a, K, P> {
    type Item = (&'a K, &'a P);

    #[inline]
    #[allow(clippy::arithmetic_side_effects, reason = "counts the occupied slots left in `slots`")]
    fn next(&mut self) -> Option<Self::Item> {
        let (k, p) = self.slots.find_map(Option::as_ref)?;
        self.remaining -= 1;
        Some((k, p))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, P> DoubleEndedIterator for Entries<'_, K, P> {
    #[inline]
    #[allow(clippy::arithmetic_side_effects, reason = "counts the occupied slots left in `slots`")]
    fn next_back(&mut self) -> Option<Self::Item> {
        let (k, p) = self.slots.rfind(|slot| slot.is_some())?.as_ref()?;
        self.remaining -= 1;
        Some((k, p))
    }
}

impl<K, P> ExactSizeIterator for Entries<'_, K, P> {}

impl<K, P> FusedIterator for Entries<'_, K, P> {}

/// Collects entries for a [`PerfectHashTable`].
///
/// The builder is the only mutable stage of a table's life: [`build`](Self::build) consumes it, so
/// a half-built table can't be observed.
///
/// ```rust
/// use chd::Builder;
///
/// let mut builder = Builder::new();
/// builder.push("cat", 1).push("dog", 2);
/// builder.extend([("bird", 3)]);
/// let table = builder.build().unwrap();
/// assert_eq!(table.lookup("bird"), Some((&"bird", &3)));
/// ```
#[cfg(feature = "build")]
#[derive(Clone, Debug)]
pub struct Builder<K, P> {
    /// Entries in insertion order.
    entries: Vec<(K, P)>,
    /// Options the table will be built with.
    options: BuildOptions,
}

#[cfg(feature = "build")]
impl<K, P> Builder<K, P> {
    /// Create an empty builder with default options.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_options(BuildOptions::new())
    }

    /// Create an empty builder with custom options.
    #[inline]
    #[must_use]
    pub const fn with_options(options: BuildOptions) -> Self {
        Self {
            entries: Vec::new(),
            options,
        }
    }

    /// Add an entry.
    ///
    /// Duplicate keys are only detected by [`build`](Self::build).
    #[inline]
    pub fn push(&mut self, key: K, payload: P) -> &mut Self {
        self.entries.push((key, payload));
        self
    }

    /// Get the number of entries added so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries were added.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The options the table will be built with.
    #[inline]
    #[must_use]
    pub const fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build the table.
    ///
    /// # Errors
    ///
    /// Fails if two keys are equal or if construction runs out of attempts.
    #[inline]
    pub fn build(self) -> Result<PerfectHashTable<K, P>, BuildError>
    where
        K: PortableHash + Eq,
    {
        PerfectHashTable::try_from_entries(self.entries, &self.options)
    }
}

#[cfg(feature = "build")]
impl<K, P> Default for Builder<K, P> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "build")]
impl<K, P> Extend<(K, P)> for Builder<K, P> {
    #[inline]
    fn extend<I: IntoIterator<Item = (K, P)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(feature = "build")]
impl<K, P> FromIterator<(K, P)> for Builder<K, P> {
    #[inline]
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        let mut builder = Self::new();
        builder.extend(iter);
        builder
    }
}

/// Serializes the inner type, which is what `try_from` expects on the way back.
#[cfg(feature = "serde")]
impl<K: serde::Serialize, P: serde::Serialize> serde::Serialize for PerfectHashTable<K, P> {
    #[inline]
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.inner, serializer)
    }
}

/// Scope for `serde`-related code.
#[cfg(all(feature = "alloc", feature = "serde"))]
mod serde_support {
    use super::{PerfectHashTable, PortableHash, TableInner};
    use displaydoc::Display;
    use thiserror::Error;

    /// Deserialization validation failures.
    #[derive(Debug, Display, Error)]
    pub enum Error {
        /// slot count does not match the capacity
        WrongSlotCount,

        /// `len` does not match the number of entries
        WrongLen,

        /// entry in slot {0} belongs elsewhere
        MisplacedEntry(usize),
    }

    impl<K: PortableHash, P> TryFrom<TableInner<K, P>> for PerfectHashTable<K, P> {
        type Error = Error;

        #[inline]
        fn try_from(inner: TableInner<K, P>) -> Result<Self, Error> {
            if inner.slots.len() != inner.phf.capacity() {
                return Err(Error::WrongSlotCount);
            }

            if inner.len != inner.slots.iter().filter(|slot| slot.is_some()).count() {
                return Err(Error::WrongLen);
            }

            for (index, slot) in inner.slots.iter().enumerate() {
                if let Some((key, _)) = slot {
                    if inner.phf.hash(key) != index {
                        return Err(Error::MisplacedEntry(index));
                    }
                }
            }

            Ok(Self { inner })
        }
    }
}

#[cfg(feature = "codegen")]
impl<K: super::codegen::Codegen, P: super::codegen::Codegen> super::codegen::Codegen
    for PerfectHashTable<K, P>
{
    #[inline]
    fn generate_piece(&self, gen: &mut super::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let table = gen.path("chd::PerfectHashTable");
        let phf = gen.piece(&self.inner.phf);
        let slots = gen.piece(&self.inner.slots);
        let len = gen.piece(&self.inner.len);
        quote::quote!(#table::__from_raw_parts(#phf, #slots, #len))
    }
}
