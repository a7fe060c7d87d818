//! Immutable perfect hash tables.
//!
//! Given a set of keys known up front, this crate builds a table in which every key has a slot of
//! its own, so that a lookup is one hash computation, one displacement load and one equality
//! check, with no probing. Construction follows the hash-and-displace (CHD) scheme:
//!
//! 1. Every key is hashed into a pair `(h1, h2)` under a [`hash::Seed`].
//! 2. Keys are split into buckets of about three keys by `h1`.
//! 3. Buckets are placed largest first. For each bucket, the smallest displacement `d` is found
//!    such that `mix(h2, d)` lands on free slots for all of its keys.
//! 4. If some bucket can't be placed, the next seed from a deterministic sequence is tried with a
//!    slightly larger table.
//!
//! The resulting tables are read-only. [`Map`], [`Set`], [`OrderedMap`] and [`OrderedSet`] wrap a
//! single [`PerfectHashTable`] each.
//!
//! ```rust
//! use chd::Map;
//!
//! let map: Map<&str, u32> = Map::from_entries(vec![("cat", 1), ("dog", 2), ("bird", 3)]);
//! assert_eq!(map.get("dog"), Some(&2));
//! assert_eq!(map.get("cow"), None);
//! assert_eq!(map.len(), 3);
//! ```
//!
//! Tables can also be built in a build script and embedded as `static`s, see [`codegen`].
//!
//!
//! # Features
//!
//! - `std` (default): implies `alloc`.
//! - `alloc`: heap-allocated tables.
//! - `build` (default): construct tables at runtime.
//! - `codegen`: emit built tables as Rust code.
//! - `serde`: (de)serialize tables, validating them on the way in.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

/// Implement an iterator that projects entries of `$iter` to keys or values.
macro_rules! projection {
    (
        $(#[$meta:meta])*
        $name:ident over $iter:ident => $item:ident, |$k:pat_param, $v:pat_param| $project:expr
    ) => {
        $(#[$meta])*
        pub struct $name<'a, K, V> {
            /// The underlying entry iterator.
            iter: $iter<'a, K, V>,
        }

        impl<K, V> Clone for $name<'_, K, V> {
            #[inline]
            fn clone(&self) -> Self {
                Self {
                    iter: self.iter.clone(),
                }
            }
        }

        impl<'a, K, V> Iterator for $name<'a, K, V> {
            type Item = &'a $item;

            #[inline]
            fn next(&mut self) -> Option<Self::Item> {
                self.iter.next().map(|($k, $v)| $project)
            }

            #[inline]
            fn size_hint(&self) -> (usize, Option<usize>) {
                self.iter.size_hint()
            }
        }

        impl<K, V> DoubleEndedIterator for $name<'_, K, V> {
            #[inline]
            fn next_back(&mut self) -> Option<Self::Item> {
                self.iter.next_back().map(|($k, $v)| $project)
            }
        }

        impl<K, V> ExactSizeIterator for $name<'_, K, V> {}

        impl<K, V> core::iter::FusedIterator for $name<'_, K, V> {}
    };
}

mod algorithms;
mod bitmap;
pub mod codegen;
mod const_vec;
#[cfg(feature = "build")]
mod error;
pub mod hash;
pub mod map;
#[cfg(feature = "build")]
mod options;
pub mod ordered_map;
pub mod ordered_set;
mod phf;
mod planner;
pub mod set;
mod solver;
pub mod table;
mod untyped_phf;

#[cfg(feature = "build")]
pub use error::BuildError;
pub use map::Map;
#[cfg(feature = "build")]
pub use options::BuildOptions;
pub use ordered_map::OrderedMap;
pub use ordered_set::OrderedSet;
pub use phf::Phf;
pub use set::Set;
#[cfg(feature = "build")]
pub use table::Builder;
pub use table::PerfectHashTable;

/// Public (but hidden) reexports for codegen to access.
#[doc(hidden)]
pub mod low_level {
    pub use super::const_vec::ConstVec;
    pub use super::untyped_phf::{Mixer, UntypedPhf};
}

#[cfg(test)]
mod tests;
