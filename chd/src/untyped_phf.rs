//! Perfect hash functions over pre-hashed keys.

#![allow(clippy::arithmetic_side_effects, reason = "many false positives")]

use super::const_vec::ConstVec;
pub use super::solver::Mixer;
#[cfg(feature = "build")]
use {
    super::{options::BuildOptions, planner::Buckets, solver::solve},
    alloc::vec::Vec,
    displaydoc::Display,
};

/// Hashes are reduced to `usize` through `u64` in many places.
const _: () = assert!(
    size_of::<usize>() <= size_of::<u64>(),
    "targets with a usize wider than 64 bits are not supported",
);

/// A perfect hash function.
///
/// This PHF does not hash keys for you: it maps `(h1, h2)` pairs, as produced by
/// [`hash_pair`](crate::hash::hash_pair), to slots.
#[derive(Clone, Debug)]
#[cfg_attr(all(feature = "alloc", feature = "serde"), derive(serde::Deserialize))]
#[cfg_attr(
    all(feature = "alloc", feature = "serde"),
    serde(try_from = "UntypedPhfInner")
)]
pub struct UntypedPhf {
    /// The actual PHF.
    inner: UntypedPhfInner,
}

/// The actual PHF.
///
/// This needs to be a separate type so that `serde` can convert from this type to [`UntypedPhf`]
/// with [`TryFrom`] during deserialization, so that we can validate the PHF.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(all(feature = "alloc", feature = "serde"), derive(serde::Deserialize))]
struct UntypedPhfInner {
    /// Number of slots. Never zero.
    table_size: usize,

    /// Per-bucket displacements. Never empty.
    displacements: ConstVec<u32>,

    /// How displacements are mixed into slot hints.
    mixer: Mixer,
}

/// Why a single construction attempt failed.
#[cfg(feature = "build")]
#[derive(Debug, Display)]
pub enum AttemptFailure {
    /// keys share a slot hint within a bucket
    HintCollisions(Vec<(usize, usize)>),

    /// some bucket has no valid displacement
    Unplaceable,
}

impl UntypedPhf {
    /// Initialize from saved data.
    ///
    /// Meant for codegen, not for public use.
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn __from_raw_parts(
        table_size: usize,
        displacements: ConstVec<u32>,
        mixer: Mixer,
    ) -> Self {
        Self {
            inner: UntypedPhfInner {
                table_size,
                displacements,
                mixer,
            },
        }
    }

    /// Try to generate a perfect hash function for a table of `table_size` slots.
    ///
    /// `hashes[i]` is the `(h1, h2)` pair of key `i`. The `Add` mixer is tried first, as it
    /// tends to find displacements faster; `Xor` gets a chance if it fails.
    ///
    /// # Errors
    ///
    /// Fails if two keys share both their bucket and their slot hint, which includes duplicate
    /// keys, or if some bucket can't be placed under either mixer.
    ///
    /// # Panics
    ///
    /// Panics if `table_size` is zero, smaller than the number of keys, or above
    /// `isize::MAX / 2`.
    #[cfg(feature = "build")]
    pub fn try_from_hashes(
        hashes: &[(u64, u64)],
        table_size: usize,
        options: &BuildOptions,
    ) -> Result<Self, AttemptFailure> {
        assert!(table_size >= hashes.len(), "table too small");
        // Keeps the mirrored free-slot bitmap and the `Add` mixer's sums in range.
        assert!(table_size <= isize::MAX as usize / 2, "table too large");

        let buckets = Buckets::plan(hashes, table_size, options.bucket_size())
            .map_err(AttemptFailure::HintCollisions)?;

        for mixer in [Mixer::Add, Mixer::Xor] {
            if let Some(displacements) = solve(&buckets, mixer, options.max_displacement()) {
                return Ok(Self::__from_raw_parts(
                    table_size,
                    ConstVec::from_vec(displacements),
                    mixer,
                ));
            }
        }

        Err(AttemptFailure::Unplaceable)
    }

    /// Map a hash pair to a slot.
    ///
    /// Guaranteed to return different slots for different keys from the construction set. Keys
    /// outside the set land on arbitrary slots, but always within [`capacity`](Self::capacity).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, reason = "reduced modulo a usize")]
    pub fn index(&self, (h1, h2): (u64, u64)) -> usize {
        let displacements = &self.inner.displacements;
        let bucket = (h1 % displacements.len() as u64) as usize;
        let hint = (h2 % self.inner.table_size as u64) as usize;
        self.inner
            .mixer
            .mix(hint, displacements[bucket], self.inner.table_size)
    }

    /// The number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.inner.table_size
    }

    /// Per-bucket displacements.
    #[inline]
    #[must_use]
    pub fn displacements(&self) -> &[u32] {
        &self.inner.displacements
    }

    /// The mixer the displacements were found for.
    #[inline]
    #[must_use]
    pub const fn mixer(&self) -> Mixer {
        self.inner.mixer
    }
}

/// Serializes the inner type, which is what `try_from` expects on the way back.
#[cfg(feature = "serde")]
impl serde::Serialize for UntypedPhf {
    #[inline]
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.inner, serializer)
    }
}

/// Scope for `serde`-related code.
#[cfg(all(feature = "alloc", feature = "serde"))]
mod serde_support {
    use super::{UntypedPhf, UntypedPhfInner};
    use displaydoc::Display;
    use thiserror::Error;

    /// Deserialization validation failures.
    #[derive(Debug, Display, Error)]
    pub enum Error {
        /// zero table size
        EmptyTable,

        /// no displacements
        NoBuckets,

        /// displacement {0} is out of range
        DisplacementOutOfRange(u32),
    }

    impl TryFrom<UntypedPhfInner> for UntypedPhf {
        type Error = Error;

        #[inline]
        fn try_from(inner: UntypedPhfInner) -> Result<Self, Error> {
            if inner.table_size == 0 {
                return Err(Error::EmptyTable);
            }

            if inner.displacements.is_empty() {
                return Err(Error::NoBuckets);
            }

            let limit = inner.mixer.search_limit(inner.table_size, u32::MAX);
            if let Some(&displacement) = inner
                .displacements
                .iter()
                .find(|&&displacement| u64::from(displacement) >= limit)
            {
                return Err(Error::DisplacementOutOfRange(displacement));
            }

            Ok(Self { inner })
        }
    }
}

#[cfg(feature = "codegen")]
impl super::codegen::Codegen for UntypedPhf {
    #[inline]
    fn generate_piece(&self, gen: &mut super::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let untyped_phf = gen.path("chd::low_level::UntypedPhf");
        let table_size = gen.piece(&self.inner.table_size);
        let displacements = gen.piece(&self.inner.displacements);
        let mixer = gen.piece(&self.inner.mixer);
        quote::quote!(#untyped_phf::__from_raw_parts(#table_size, #displacements, #mixer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn raw_parts() {
        let phf = UntypedPhf::__from_raw_parts(
            7,
            ConstVec::from_static_ref(&[0, 3]),
            Mixer::Add,
        );
        assert_eq!(phf.capacity(), 7);
        assert_eq!(phf.displacements(), &[0, 3]);
        // Bucket 1, hint 5, slot (5 + 3) mod 7
        assert_eq!(phf.index((3, 12)), 1);
        // Bucket 0, hint 2
        assert_eq!(phf.index((4, 2)), 2);
    }

    #[test]
    fn xor_raw_parts() {
        let phf = UntypedPhf::__from_raw_parts(
            5,
            ConstVec::from_static_ref(&[0, 3]),
            Mixer::Xor,
        );
        assert_eq!(phf.mixer(), Mixer::Xor);
        // Bucket 0, hint 2, no displacement
        assert_eq!(phf.index((0, 2)), 2);
        // Bucket 1, hint 2, slot 2 ^ 3
        assert_eq!(phf.index((1, 2)), 1);
        // Bucket 1, hint 4, slot (4 ^ 3) mod 5
        assert_eq!(phf.index((1, 4)), 2);
        // Bucket 1, hint 1, slot 1 ^ 3
        assert_eq!(phf.index((3, 6)), 2);
    }

    #[test]
    fn empty() {
        let phf = UntypedPhf::try_from_hashes(&[], 1, &BuildOptions::new()).unwrap();
        assert_eq!(phf.capacity(), 1);
        assert_eq!(phf.displacements(), &[0]);
        assert_eq!(phf.index((12345, 67890)), 0);
    }

    #[test]
    fn single() {
        let phf = UntypedPhf::try_from_hashes(&[(17, 42)], 1, &BuildOptions::new()).unwrap();
        assert_eq!(phf.displacements(), &[0]);
        assert_eq!(phf.index((17, 42)), 0);
    }

    #[test]
    fn duplicate_hashes() {
        let failure = UntypedPhf::try_from_hashes(&[(1, 2), (3, 4), (1, 2)], 3, &BuildOptions::new())
            .unwrap_err();
        assert!(
            matches!(failure, AttemptFailure::HintCollisions(ref pairs) if pairs == &vec![(0, 2)]),
            "{failure:?}",
        );
    }

    #[test]
    fn injective() {
        let mut rng = rapidhash::RapidRng::new(0x1319_8a2e_0370_7344);
        let hashes: Vec<(u64, u64)> = (0..500).map(|_| (rng.next(), rng.next())).collect();
        let phf = (550..700)
            .find_map(|table_size| {
                UntypedPhf::try_from_hashes(&hashes, table_size, &BuildOptions::new()).ok()
            })
            .unwrap();

        let mut used = vec![false; phf.capacity()];
        for &pair in &hashes {
            let slot = phf.index(pair);
            assert!(!used[slot], "slot {slot} used twice");
            used[slot] = true;
        }
    }

    #[test]
    fn xor_injective() {
        let mut rng = rapidhash::RapidRng::new(0xa409_3822_299f_31d0);
        let hashes: Vec<(u64, u64)> = (0..500).map(|_| (rng.next(), rng.next())).collect();
        let phf = (550..750)
            .find_map(|table_size| {
                let buckets = Buckets::plan(&hashes, table_size, 3).ok()?;
                let displacements = solve(&buckets, Mixer::Xor, u32::MAX)?;
                Some(UntypedPhf::__from_raw_parts(
                    table_size,
                    ConstVec::from_vec(displacements),
                    Mixer::Xor,
                ))
            })
            .unwrap();

        let mut used = vec![false; phf.capacity()];
        for &pair in &hashes {
            let slot = phf.index(pair);
            assert!(slot < phf.capacity(), "slot {slot} out of range");
            assert!(!used[slot], "slot {slot} used twice");
            used[slot] = true;
        }
    }

    #[test]
    #[should_panic = "table too large"]
    fn oversized_table() {
        let _ = UntypedPhf::try_from_hashes(&[], usize::MAX / 2 + 1, &BuildOptions::new());
    }
}
