//! Free-slot bitmap.

#![cfg(feature = "build")]

use alloc::{vec, vec::Vec};

/// A set of free table slots, stored as a bitmap with mirrored copies.
///
/// Slot `s` is stored at every position `s + k * period` below the bitmap length. The mixers can
/// produce positions in `[0; 2 * period)` before reducing them modulo the table size, so with the
/// mirror a run of consecutive positions can be tested with a single load even if it wraps around
/// the end of the table.
pub struct FreeSlots {
    /// Bit `p` is stored in byte `p / 8` at bit `p % 8`, counting from LSB.
    data: Vec<u8>,

    /// Number of valid bit positions.
    bits: usize,

    /// The table size.
    period: usize,
}

#[allow(
    clippy::arithmetic_side_effects,
    reason = "positions stay below `3 * period + 64`, and `period` is at most `isize::MAX / 2`"
)]
impl FreeSlots {
    /// Mark every slot of a table of size `period` as free.
    ///
    /// Positions up to `2 * period + 64` are valid, enough for a 64-bit window at any position
    /// below `2 * period`.
    ///
    /// # Panics
    ///
    /// Panics if `period` exceeds `isize::MAX / 2`.
    pub fn new(period: usize) -> Self {
        assert!(period <= isize::MAX as usize / 2, "table too large");
        let bits = 2 * period + 64;
        Self {
            data: vec![u8::MAX; bits.div_ceil(8)],
            bits,
            period,
        }
    }

    /// Mark `slot` as occupied in all its mirrors.
    pub fn claim(&mut self, slot: usize) {
        debug_assert!(slot < self.period, "slot out of range");
        let mut position = slot;
        while position < self.bits {
            self.data[position / 8] &= !(1 << (position % 8));
            position += self.period;
        }
    }

    /// Check if `slot` is free.
    #[cfg(test)]
    pub fn is_free(&self, slot: usize) -> bool {
        (self.data[slot / 8] >> (slot % 8)) & 1 == 1
    }

    /// Load the bits at positions `[start; start + 57)` into the low bits of a word.
    ///
    /// Bits above 57 may be garbage.
    pub fn window(&self, start: usize) -> u64 {
        let byte = start / 8;
        let mut bytes = [0; 8];
        bytes.copy_from_slice(&self.data[byte..byte + 8]);
        u64::from_le_bytes(bytes) >> (start % 8)
    }

    /// Load the byte holding positions `[8 * index; 8 * index + 8)`.
    pub fn byte(&self, index: usize) -> u8 {
        self.data[index]
    }
}
