//! Perfect hash sets that remember insertion order.

use super::{
    hash::PortableHash,
    ordered_map::{Keys, OrderedMap},
};
use core::borrow::Borrow;
use core::fmt;
#[cfg(feature = "build")]
use {
    super::{BuildError, BuildOptions},
    alloc::vec::Vec,
};

/// A perfect hash set that iterates in insertion order.
///
/// ```rust
/// use chd::OrderedSet;
///
/// let set = OrderedSet::from_elements(vec![30, 10, 20]);
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [30, 10, 20]);
/// assert_eq!(set.get_index(2), Some(&20));
/// assert_eq!(set.get_index_of(&10), Some(1));
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(all(feature = "alloc", feature = "serde"), derive(serde::Deserialize))]
#[cfg_attr(
    all(feature = "alloc", feature = "serde"),
    serde(bound(deserialize = "T: serde::Deserialize<'de> + PortableHash"))
)]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct OrderedSet<T> {
    /// Elements are stored as keys with no value.
    map: OrderedMap<T, ()>,
}

#[cfg(feature = "build")]
impl<T: PortableHash + Eq> OrderedSet<T> {
    /// Try to build a set with the default options.
    ///
    /// # Errors
    ///
    /// Fails if two elements are equal or if construction runs out of attempts.
    #[inline]
    pub fn try_from_elements(elements: Vec<T>) -> Result<Self, BuildError> {
        Self::try_from_elements_with(elements, &BuildOptions::new())
    }

    /// Try to build a set with custom options.
    ///
    /// # Errors
    ///
    /// Fails if two elements are equal or if construction runs out of attempts.
    #[inline]
    pub fn try_from_elements_with(
        elements: Vec<T>,
        options: &BuildOptions,
    ) -> Result<Self, BuildError> {
        let entries = elements.into_iter().map(|element| (element, ())).collect();
        OrderedMap::try_from_entries_with(entries, options).map(|map| Self { map })
    }

    /// Build a set with the default options.
    ///
    /// # Panics
    ///
    /// Panics if two elements are equal or if construction runs out of attempts.
    #[inline]
    #[must_use]
    pub fn from_elements(elements: Vec<T>) -> Self {
        Self::try_from_elements(elements).unwrap_or_else(|error| panic!("{error}"))
    }
}

impl<T> OrderedSet<T> {
    /// Initialize from saved data.
    ///
    /// Meant for codegen, not for public use.
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn __from_raw_parts(map: OrderedMap<T, ()>) -> Self {
        Self { map }
    }

    /// Get a reference to the stored element equal to `value`, if present.
    #[inline]
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.map.get_key_value(value).map(|(element, ())| element)
    }

    /// Get the insertion position of an element.
    #[inline]
    pub fn get_index_of<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.map.get_index_of(value)
    }

    /// Check if an element is present in the set.
    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.map.contains_key(value)
    }

    /// Get the element inserted at `index`.
    #[inline]
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&T> {
        self.map.get_index(index).map(|(element, ())| element)
    }

    /// Get number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate through elements in insertion order.
    #[inline]
    pub fn iter(&self) -> Keys<'_, T, ()> {
        self.map.keys()
    }
}

impl<T: PortableHash + Eq> OrderedSet<T> {
    /// Check if the sets have no elements in common.
    #[inline]
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        !small.iter().any(|element| large.contains(element))
    }

    /// Check if every element of `self` is in `other`.
    #[inline]
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|element| other.contains(element))
    }

    /// Check if every element of `other` is in `self`.
    #[inline]
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
}

impl<T: fmt::Debug> fmt::Debug for OrderedSet<T> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = Keys<'a, T, ()>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(feature = "codegen")]
impl<T: super::codegen::Codegen> super::codegen::Codegen for OrderedSet<T> {
    #[inline]
    fn generate_piece(&self, gen: &mut super::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let ordered_set = gen.path("chd::OrderedSet");
        let map = gen.piece(&self.map);
        quote::quote!(#ordered_set::__from_raw_parts(#map))
    }
}
