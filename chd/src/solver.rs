//! Displacement search.

#![allow(clippy::arithmetic_side_effects, reason = "many false positives")]

#[cfg(feature = "build")]
use {
    super::{
        bitmap::FreeSlots,
        planner::{Buckets, Member},
    },
    alloc::{vec, vec::Vec},
    const_dispatch::prelude::*,
};

/// How a bucket's displacement is combined with a key's slot hint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "build", derive(ConstDispatch))]
#[non_exhaustive]
#[doc(hidden)]
pub enum Mixer {
    /// `(hint + d) mod n`.
    Add,
    /// `(hint ^ d) mod n`.
    Xor,
}

impl Mixer {
    /// Mix a slot hint with a displacement to get the final slot.
    #[allow(clippy::cast_possible_truncation, reason = "reduced modulo a usize")]
    pub(crate) const fn mix(self, hint: usize, displacement: u32, table_size: usize) -> usize {
        let hint = hint as u64;
        let displacement = displacement as u64;
        let mixed = match self {
            Self::Add => hint + displacement,
            Self::Xor => hint ^ displacement,
        };
        (mixed % table_size as u64) as usize
    }

    /// The exclusive bound on displacements the solver considers.
    ///
    /// Past this bound, `Add` repeats itself and `Xor` produces values larger than `2 * table_size`.
    #[cfg(any(feature = "build", all(feature = "alloc", feature = "serde")))]
    pub(crate) const fn search_limit(self, table_size: usize, max_displacement: u32) -> u64 {
        let span = match self {
            Self::Add => table_size as u64,
            Self::Xor => table_size.next_power_of_two() as u64,
        };
        let cap = max_displacement as u64 + 1;
        if span < cap {
            span
        } else {
            cap
        }
    }

    /// Find the smallest valid displacement for a bucket.
    ///
    /// A displacement is valid if it is below `limit`, every member lands on a free slot, and no
    /// two members land on the same slot. Returns `None` if there is no such displacement.
    ///
    /// `members` must have pairwise distinct hints below `table_size`, and `free` must have been
    /// created for `table_size`.
    #[cfg(feature = "build")]
    fn find_valid_displacement(
        self,
        members: &[Member],
        free: &FreeSlots,
        table_size: usize,
        limit: u64,
    ) -> Option<u32> {
        const_dispatch!(self, |const MIXER: Mixer| {
            // Displacements tested per iteration. Bits past 57 may be shifted-in garbage.
            let step: u64 = match MIXER {
                Self::Add => 57,
                Self::Xor => 8,
            };

            let mut base = 0;
            while base < limit {
                let mut candidates: u64 = (1 << step.min(limit - base)) - 1;

                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "base < limit <= 2 * table_size"
                )]
                let base_index = base as usize;
                for &(_, hint) in members {
                    // Bit `i` tells whether `hint` mixed with `base + i` lands on a free slot.
                    // Positions up to `2 * table_size` are mirrored, so no reduction is needed.
                    let local = match MIXER {
                        Self::Add => free.window(hint + base_index),
                        Self::Xor => {
                            let start = hint ^ base_index;
                            let byte = free.byte(start / 8);
                            u64::from(BIT_INDEX_XOR_LUT[start % 8][usize::from(byte)])
                        }
                    };
                    candidates &= local;
                }

                while candidates != 0 {
                    #[allow(clippy::cast_possible_truncation, reason = "below limit <= 2^32")]
                    let displacement = (base + u64::from(candidates.trailing_zeros())) as u32;
                    if MIXER.distinct_slots(members, displacement, table_size) {
                        return Some(displacement);
                    }
                    candidates &= candidates - 1;
                }

                base += step;
            }

            None
        })
    }

    /// Check that no two members share a slot under `displacement`.
    #[cfg(feature = "build")]
    fn distinct_slots(self, members: &[Member], displacement: u32, table_size: usize) -> bool {
        match self {
            // Distinct hints below the table size stay distinct when shifted modulo it.
            Self::Add => true,
            // `hint ^ d` can exceed the table size and wrap onto another member.
            Self::Xor => members.iter().enumerate().all(|(i, &(_, hint))| {
                let slot = self.mix(hint, displacement, table_size);
                members[..i]
                    .iter()
                    .all(|&(_, other)| self.mix(other, displacement, table_size) != slot)
            }),
        }
    }
}

/// Assign displacements to all buckets with the given mixer.
///
/// Buckets are placed in the planner's order, each at its smallest valid displacement. Returns
/// `None` if some bucket can't be placed.
#[cfg(feature = "build")]
pub fn solve(buckets: &Buckets, mixer: Mixer, max_displacement: u32) -> Option<Vec<u32>> {
    let table_size = buckets.table_size();
    let limit = mixer.search_limit(table_size, max_displacement);
    let mut free = FreeSlots::new(table_size);
    let mut displacements = vec![0; buckets.bucket_count()];

    for (bucket, members) in buckets.iter() {
        let displacement = mixer.find_valid_displacement(members, &free, table_size, limit)?;
        displacements[bucket] = displacement;
        for &(_, hint) in members {
            free.claim(mixer.mix(hint, displacement, table_size));
        }
    }

    Some(displacements)
}

/// Bit permutation LUT.
///
/// `lut[control][byte]` moves each bit of `byte` from position `i` to `i ^ control`. `lut[0]` is
/// the identity and `lut[7]` reverses the bits.
///
/// With a byte of the free-slot bitmap starting at `hint ^ base`, bit `i` of
/// `lut[hint % 8][byte]` tells whether `hint ^ (base + i)` is free.
#[cfg(feature = "build")]
const BIT_INDEX_XOR_LUT: [[u8; 256]; 8] = {
    let mut lut = [[0; 256]; 8];
    let mut control = 0;
    while control < 8 {
        let mut byte = 0;
        while byte < 256 {
            let mut bit = 0;
            #[allow(clippy::cast_possible_truncation, reason = "byte < 256")]
            while bit < 8 {
                lut[control][byte] |= ((byte as u8 >> bit) & 1) << (bit ^ control);
                bit += 1;
            }
            byte += 1;
        }
        control += 1;
    }
    lut
};

#[cfg(feature = "codegen")]
impl super::codegen::Codegen for Mixer {
    #[inline]
    fn generate_piece(&self, gen: &mut super::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let mixer = gen.path("chd::low_level::Mixer");
        match self {
            Self::Add => quote::quote!(#mixer::Add),
            Self::Xor => quote::quote!(#mixer::Xor),
        }
    }
}
