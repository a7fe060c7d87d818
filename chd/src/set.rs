//! Perfect hash sets.

use super::{
    hash::PortableHash,
    table::{Entries, PerfectHashTable},
};
use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
#[cfg(feature = "build")]
use {
    super::{BuildError, BuildOptions},
    alloc::vec::Vec,
};

/// A perfect hash set.
///
/// ```rust
/// use chd::Set;
///
/// let vowels = Set::from_elements(vec!['a', 'e', 'i', 'o', 'u']);
/// assert!(vowels.contains(&'e'));
/// assert!(!vowels.contains(&'z'));
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(all(feature = "alloc", feature = "serde"), derive(serde::Deserialize))]
#[cfg_attr(
    all(feature = "alloc", feature = "serde"),
    serde(bound(deserialize = "T: serde::Deserialize<'de> + PortableHash"))
)]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Set<T> {
    /// Elements are stored as keys with no payload.
    table: PerfectHashTable<T, ()>,
}

#[cfg(feature = "build")]
impl<T: PortableHash + Eq> Set<T> {
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
        PerfectHashTable::try_from_entries(entries, options).map(|table| Self { table })
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

impl<T> Set<T> {
    /// Initialize from saved data.
    ///
    /// Meant for codegen, not for public use.
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn __from_raw_parts(table: PerfectHashTable<T, ()>) -> Self {
        Self { table }
    }

    /// The underlying table.
    #[inline]
    #[must_use]
    pub const fn table(&self) -> &PerfectHashTable<T, ()> {
        &self.table
    }

    /// Get a reference to the stored element equal to `value`, if present.
    #[inline]
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.table.lookup(value).map(|(element, ())| element)
    }

    /// Check if an element is present in the set.
    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + PortableHash + Eq,
    {
        self.get(value).is_some()
    }

    /// Get number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterate through elements.
    ///
    /// The iteration order is unspecified, but is constant for a given set.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            entries: self.table.iter(),
        }
    }
}

impl<T: PortableHash + Eq> Set<T> {
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

impl<T: fmt::Debug> fmt::Debug for Set<T> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a Set<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the elements of a [`Set`].
pub struct Iter<'a, T> {
    /// Entries of the underlying table.
    entries: Entries<'a, T, ()>,
}

impl<T> Clone for Iter<'_, T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.entries.next().map(|(element, ())| element)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back().map(|(element, ())| element)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

#[cfg(feature = "codegen")]
impl<T: super::codegen::Codegen> super::codegen::Codegen for Set<T> {
    #[inline]
    fn generate_piece(&self, gen: &mut super::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let set = gen.path("chd::Set");
        let table = gen.piece(&self.table);
        quote::quote!(#set::__from_raw_parts(#table))
    }
}
