//! Perfect hash functions with typed inputs.

use super::{
    hash::{hash_pair, PortableHash, Seed},
    untyped_phf::UntypedPhf,
};
use core::borrow::Borrow;
use core::marker::PhantomData;
#[cfg(feature = "build")]
use {
    super::{untyped_phf::AttemptFailure, BuildError, BuildOptions},
    alloc::vec::Vec,
};

/// A perfect hash function.
///
/// A mapping from `T` to numbers from `0` to `N - 1`, injective over the construction key set.
/// `N` might be larger than the size of the key set.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(all(feature = "alloc", feature = "serde"), derive(serde::Deserialize))]
pub struct Phf<T> {
    /// The seed the key set was hashed with.
    seed: Seed,

    /// The underlying untyped PHF.
    untyped_phf: UntypedPhf,

    /// Mark [`Phf`] as contravariant in `T`.
    _marker: PhantomData<fn(T)>,
}

#[cfg(feature = "build")]
impl<T: PortableHash + Eq> Phf<T> {
    /// Try to generate a perfect hash function.
    ///
    /// Walks the seed sequence starting at [`BuildOptions::seed`]. Each attempt hashes all keys
    /// under a fresh seed and tries to place them; a failed attempt grows the table by 0.5% (at
    /// least one slot) before the next one. An empty key set yields a function over a single slot.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicateKey`] if two keys are equal, and
    /// [`BuildError::ConstructionExhausted`] if no attempt succeeded within
    /// [`BuildOptions::max_attempts`].
    #[allow(
        clippy::missing_inline_in_public_items,
        reason = "very heavy, we'd rather not copy it to every crate"
    )]
    pub fn try_from_keys<B: Borrow<T>>(
        keys: impl IntoIterator<Item = B>,
        options: &BuildOptions,
    ) -> Result<Self, BuildError> {
        let keys: Vec<B> = keys.into_iter().collect();
        let mut table_size = options.initial_table_size(keys.len());
        let mut hashes = Vec::with_capacity(keys.len());

        for (attempt, seed) in (1..=options.max_attempts()).zip(Seed::iter_from(options.seed())) {
            hashes.clear();
            hashes.extend(keys.iter().map(|key| hash_pair::<T>(key.borrow(), &seed)));

            let failure = match UntypedPhf::try_from_hashes(&hashes, table_size, options) {
                Ok(untyped_phf) => {
                    tracing::debug!(
                        attempts = attempt,
                        keys = keys.len(),
                        buckets = untyped_phf.displacements().len(),
                        table_size,
                        mixer = ?untyped_phf.mixer(),
                        "perfect hash function built"
                    );
                    return Ok(Self {
                        seed,
                        untyped_phf,
                        _marker: PhantomData,
                    });
                }
                Err(failure) => failure,
            };

            // Equal keys always collide, whatever the seed. Tell them apart from unlucky hashes.
            if let AttemptFailure::HintCollisions(ref pairs) = failure {
                if let Some(&(first, second)) = pairs
                    .iter()
                    .filter(|&&(i, j)| {
                        Borrow::<T>::borrow(&keys[i]) == Borrow::<T>::borrow(&keys[j])
                    })
                    .min()
                {
                    tracing::warn!(first, second, "duplicate key");
                    return Err(BuildError::DuplicateKey { first, second });
                }
            }

            let next_table_size = table_size.saturating_add((table_size / 200).max(1));
            tracing::trace!(
                attempt,
                reason = %failure,
                table_size,
                next_table_size,
                "construction attempt failed"
            );
            table_size = next_table_size;
        }

        tracing::warn!(
            attempts = options.max_attempts(),
            keys = keys.len(),
            "ran out of construction attempts"
        );
        Err(BuildError::ConstructionExhausted {
            attempts: options.max_attempts(),
        })
    }
}

impl<T> Phf<T> {
    /// Initialize from saved data.
    ///
    /// Meant for codegen, not for public use.
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn __from_raw_parts(seed: Seed, untyped_phf: UntypedPhf) -> Self {
        Self {
            seed,
            untyped_phf,
            _marker: PhantomData,
        }
    }

    /// Hash a key.
    ///
    /// The whole point. Guaranteed to return different indices for different keys from the
    /// construction set.
    ///
    /// May return arbitrary indices for keys outside the set, but always below
    /// [`capacity`](Self::capacity).
    #[inline]
    pub fn hash<U: ?Sized + PortableHash>(&self, key: &U) -> usize
    where
        T: Borrow<U>,
    {
        self.untyped_phf.index(hash_pair(key, &self.seed))
    }

    /// Get the boundary on indices.
    ///
    /// The index returned by `hash` is guaranteed to *always* be less than `capacity()`, even for
    /// keys outside the construction set.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.untyped_phf.capacity()
    }

    /// The seed keys are hashed with.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> &Seed {
        &self.seed
    }

    /// Per-bucket displacements.
    #[inline]
    #[must_use]
    pub fn displacements(&self) -> &[u32] {
        self.untyped_phf.displacements()
    }
}

#[cfg(feature = "codegen")]
impl<T> super::codegen::Codegen for Phf<T> {
    #[inline]
    fn generate_piece(&self, gen: &mut super::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let phf = gen.path("chd::Phf");
        let seed = gen.piece(&self.seed);
        let untyped_phf = gen.piece(&self.untyped_phf);
        quote::quote!(#phf::__from_raw_parts(#seed, #untyped_phf))
    }
}
