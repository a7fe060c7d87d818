//! Key hashing.
//!
//! A table never hashes a key just once. Every key is reduced to a pair `(h1, h2)` under a
//! [`Seed`]: `h1` chooses the bucket, and `h2`, shifted by the bucket's displacement, chooses the
//! slot. The pair is computed by [`hash_pair`] in two steps:
//!
//! 1. [`PortableHash::hash_one`] turns the key into a 64-bit hash. This is the type-specific part.
//! 2. [`Seed::split`] folds that hash through two independent mixers, one per component.
//!
//! As tables can be built in one place (say, a build script on the host) and queried in another
//! (the target), [`core::hash::Hash`] is unsuitable: it is allowed to differ between platforms.
//! [`PortableHash`] is the portable replacement. Implement it for your own key types to use them
//! in tables.

use core::hash::Hasher;
use rapidhash::RapidRng;

/// Multiplier of the bucket component mixer. Borrowed from splitmix64.
const BUCKET_MIX: u64 = 0xbf58_476d_1ce4_e5b9;

/// Multiplier of the slot component mixer. Borrowed from splitmix64.
const SLOT_MIX: u64 = 0x94d0_49bb_1331_11eb;

/// The base of the default seed sequence. Hexadecimal digits of e - 2.
pub(crate) const DEFAULT_SEED_BASE: u64 = 0xb7e1_5162_8aed_2a6a;

/// A hash seed.
///
/// Consists of two 64-bit words. Seeds are never drawn from an entropy source: construction walks
/// a deterministic sequence produced by [`Seed::iter_from`], so rebuilding a table from the same
/// keys and options reproduces it exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub struct Seed {
    /// Multiplier for integer keys and the rapidhash seed for everything else.
    low: u64,
    /// Keys the bucket component mixer.
    high: u64,
}

impl Seed {
    /// Initialize from saved data.
    ///
    /// Meant for codegen, not for public use.
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub const fn __from_raw_parts(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    /// The low word, used to key per-type hashing.
    #[inline]
    #[must_use]
    pub const fn low(&self) -> u64 {
        self.low
    }

    /// The high word, used to key the bucket component.
    #[inline]
    #[must_use]
    pub const fn high(&self) -> u64 {
        self.high
    }

    /// Iterate through the default seed sequence.
    ///
    /// Equivalent to `Seed::iter_from` with the default base.
    #[inline]
    pub fn iter() -> impl Iterator<Item = Self> {
        Self::iter_from(DEFAULT_SEED_BASE)
    }

    /// Iterate through the seed sequence starting at `base`.
    ///
    /// The iterator is infinite and deterministic: equal bases yield equal sequences.
    #[inline]
    pub fn iter_from(base: u64) -> impl Iterator<Item = Self> {
        let mut rng = RapidRng::new(base);
        core::iter::repeat_with(move || Self {
            low: rng.next(),
            high: rng.next(),
        })
    }

    /// Split a 64-bit key hash into the `(h1, h2)` pair.
    ///
    /// Both halves go through their own multiply-fold mixer, keyed by different seed words, so
    /// knowing `h1` says next to nothing about `h2`. Keys whose 64-bit hashes collide still get
    /// equal pairs; construction detects that and moves on to the next seed.
    #[inline]
    #[must_use]
    pub const fn split(&self, hash: u64) -> (u64, u64) {
        (
            fold_multiply(hash ^ self.high, BUCKET_MIX),
            fold_multiply(hash ^ self.low.rotate_left(32), SLOT_MIX),
        )
    }
}

/// Multiply into 128 bits and xor the halves together.
const fn fold_multiply(a: u64, b: u64) -> u64 {
    // A 64x64-bit product always fits in 128 bits.
    let full = (a as u128).wrapping_mul(b as u128);
    #[allow(clippy::cast_possible_truncation, reason = "intentional")]
    let (low, high) = (full as u64, (full >> 64i32) as u64);
    low ^ high
}

/// Compute the `(h1, h2)` pair of a key.
///
/// `h1` selects the bucket, `h2` selects the slot within the displaced range.
#[inline]
pub fn hash_pair<T: ?Sized + PortableHash>(key: &T, seed: &Seed) -> (u64, u64) {
    seed.split(key.hash_one(seed))
}

/// Portable alternative to [`Hash`](core::hash::Hash).
///
/// # Requirements
///
/// - `Eq`-equal values must write equal data into the hasher. If `T: Borrow<U>` and both
///   implement [`PortableHash`], a value and its borrowed form must write equal data too: `String`
///   forwards to `str`, `Vec<T>` and `[T; N]` forward to `[T]`.
///
/// - The written data must not depend on the platform. Don't write `usize` directly; widen it to
///   `u64` first.
///
/// - Unequal values must write different sequences, and no value's byte stream may be a prefix of
///   another's. Strings are terminated with `0xff`, which never occurs in UTF-8; slices write
///   their length first.
pub trait PortableHash {
    /// Write a value into the hasher.
    fn hash<H: Hasher>(&self, state: &mut H);

    /// Write a slice of values into the hasher.
    ///
    /// Semantically the same as hashing the elements one by one, but implementations may write
    /// the data differently (e.g. as a single byte string). The length is not written.
    #[inline]
    fn hash_slice<H: Hasher>(data: &[Self], state: &mut H)
    where
        Self: Sized,
    {
        for piece in data {
            piece.hash(state);
        }
    }

    /// Compute the 64-bit hash of a single value.
    ///
    /// The default feeds [`hash`](Self::hash) into rapidhash seeded with [`Seed::low`]. Scalars
    /// override it with a single multiplication.
    ///
    /// Overrides must keep the guarantees of [`hash`](Self::hash): equal (and borrowed) values hash
    /// equally, results are portable, and distinct values collide only for a vanishing share of
    /// seeds. A seed-independent collision would make every construction attempt fail.
    #[inline]
    fn hash_one(&self, seed: &Seed) -> u64 {
        let mut state = rapidhash::RapidHasher::new(seed.low);
        self.hash(&mut state);
        state.finish()
    }
}

impl<T: ?Sized + PortableHash> PortableHash for &T {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }

    #[inline]
    fn hash_one(&self, seed: &Seed) -> u64 {
        (**self).hash_one(seed)
    }
}

impl<T: ?Sized + PortableHash> PortableHash for &mut T {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }

    #[inline]
    fn hash_one(&self, seed: &Seed) -> u64 {
        (**self).hash_one(seed)
    }
}

/// Implement [`PortableHash`] for integers up to 64 bits wide.
///
/// `hash_one` is `key * seed.low`, so widening an integer (e.g. `5u8` to `5u64`) keeps its hash.
macro_rules! impl_integer {
    ($($ty:ty => $method:ident,)*) => {
        $(
            impl PortableHash for $ty {
                #[inline]
                fn hash<H: Hasher>(&self, state: &mut H) {
                    state.$method(*self);
                }

                #[inline]
                #[allow(clippy::cast_lossless, reason = "generic code")]
                #[allow(clippy::cast_sign_loss, reason = "intentional")]
                fn hash_one(&self, seed: &Seed) -> u64 {
                    (*self as u64).wrapping_mul(seed.low)
                }
            }
        )*
    };
}
impl_integer! {
    u16 => write_u16,
    u32 => write_u32,
    u64 => write_u64,
    i8 => write_i8,
    i16 => write_i16,
    i32 => write_i32,
    i64 => write_i64,
}

impl PortableHash for u8 {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(*self);
    }

    #[inline]
    fn hash_slice<H: Hasher>(data: &[Self], state: &mut H) {
        state.write(data);
    }

    #[inline]
    fn hash_one(&self, seed: &Seed) -> u64 {
        u64::from(*self).wrapping_mul(seed.low)
    }
}

/// Implement [`PortableHash`] for 128-bit integers.
///
/// The halves are multiplied by different seed words and xored.
macro_rules! impl_integer_128 {
    ($($ty:ty => $method:ident,)*) => {
        $(
            impl PortableHash for $ty {
                #[inline]
                fn hash<H: Hasher>(&self, state: &mut H) {
                    state.$method(*self);
                }

                #[inline]
                #[allow(clippy::cast_possible_truncation, reason = "intentional")]
                #[allow(clippy::cast_sign_loss, reason = "intentional")]
                fn hash_one(&self, seed: &Seed) -> u64 {
                    let low = *self as u64;
                    let high = (*self >> 64i32) as u64;
                    low.wrapping_mul(seed.low) ^ high.wrapping_mul(seed.high)
                }
            }
        )*
    };
}
impl_integer_128! {
    u128 => write_u128,
    i128 => write_i128,
}

impl PortableHash for usize {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(*self as u64);
    }

    #[inline]
    fn hash_one(&self, seed: &Seed) -> u64 {
        (*self as u64).wrapping_mul(seed.low)
    }
}

impl PortableHash for isize {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i64(*self as i64);
    }

    #[inline]
    #[allow(clippy::cast_sign_loss, reason = "intentional")]
    fn hash_one(&self, seed: &Seed) -> u64 {
        (*self as i64 as u64).wrapping_mul(seed.low)
    }
}

impl PortableHash for bool {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(u8::from(*self));
    }

    #[inline]
    fn hash_one(&self, seed: &Seed) -> u64 {
        u64::from(*self).wrapping_mul(seed.low)
    }
}

impl PortableHash for char {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(u32::from(*self));
    }

    #[inline]
    fn hash_one(&self, seed: &Seed) -> u64 {
        u64::from(*self).wrapping_mul(seed.low)
    }
}

/// Implement [`PortableHash`] for UTF-8 string types.
macro_rules! impl_str {
    ($ty:ty) => {
        impl PortableHash for $ty {
            #[inline]
            fn hash<H: Hasher>(&self, state: &mut H) {
                state.write(self.as_bytes());
                state.write_u8(0xff);
            }
        }
    };
}
impl_str!(str);
#[cfg(feature = "alloc")]
impl_str!(alloc::string::String);

impl<T: PortableHash> PortableHash for [T] {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.len() as u64);
        T::hash_slice(self, state);
    }
}

impl<T: PortableHash, const N: usize> PortableHash for [T; N] {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self[..].hash(state);
    }
}

#[cfg(feature = "alloc")]
impl<T: PortableHash> PortableHash for alloc::vec::Vec<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self[..].hash(state);
    }
}

/// Implement [`PortableHash`] for tuples by hashing the fields in order.
macro_rules! impl_tuple {
    ($(($($name:ident $index:tt),*))*) => {
        $(
            impl<$($name: PortableHash),*> PortableHash for ($($name,)*) {
                #[inline]
                fn hash<H: Hasher>(&self, state: &mut H) {
                    $(self.$index.hash(state);)*
                }
            }
        )*
    };
}
impl_tuple! {
    (A 0)
    (A 0, B 1)
    (A 0, B 1, C 2)
    (A 0, B 1, C 2, D 3)
}

#[cfg(feature = "codegen")]
impl super::codegen::Codegen for Seed {
    #[inline]
    fn generate_piece(&self, gen: &mut super::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let seed = gen.path("chd::hash::Seed");
        let low = gen.piece(&self.low);
        let high = gen.piece(&self.high);
        quote::quote!(#seed::__from_raw_parts(#low, #high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::String, vec};

    fn seed() -> Seed {
        Seed::__from_raw_parts(0x0123_4567_89ab_cdef, 0xfedc_ba98_7654_3210)
    }

    #[test]
    fn seed_sequence_is_deterministic() {
        let a: vec::Vec<Seed> = Seed::iter().take(8).collect();
        let b: vec::Vec<Seed> = Seed::iter().take(8).collect();
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] != w[1]), "seeds repeat");

        let other = Seed::iter_from(1).next();
        assert_ne!(other, Seed::iter().next());
    }

    #[test]
    fn split_depends_on_both_words() {
        let s = seed();
        let (h1, h2) = s.split(42);
        assert_ne!(h1, h2);
        assert_eq!(s.split(42), (h1, h2));

        let flipped_high = Seed::__from_raw_parts(s.low, s.high ^ 1);
        assert_ne!(flipped_high.split(42).0, h1);
        assert_eq!(flipped_high.split(42).1, h2);

        let flipped_low = Seed::__from_raw_parts(s.low ^ (1 << 40i32), s.high);
        assert_eq!(flipped_low.split(42).0, h1);
        assert_ne!(flipped_low.split(42).1, h2);
    }

    #[test]
    fn borrowed_forms_agree() {
        let s = seed();
        let owned = String::from("hello");
        assert_eq!(owned.hash_one(&s), "hello".hash_one(&s));
        assert_eq!(hash_pair(&owned, &s), hash_pair("hello", &s));

        let v = vec![1u32, 2, 3];
        let arr = [1u32, 2, 3];
        assert_eq!(v.hash_one(&s), v[..].hash_one(&s));
        assert_eq!(arr.hash_one(&s), v[..].hash_one(&s));

        let bytes = vec![1u8, 2, 3];
        assert_eq!(bytes.hash_one(&s), b"\x01\x02\x03"[..].hash_one(&s));
    }

    #[test]
    fn integers_widen_consistently() {
        let s = seed();
        assert_eq!(5u8.hash_one(&s), 5u64.hash_one(&s));
        assert_eq!(5usize.hash_one(&s), 5u32.hash_one(&s));
        assert_eq!((-1i8).hash_one(&s), (-1i64).hash_one(&s));
        assert_eq!('a'.hash_one(&s), u64::from(b'a').hash_one(&s));
    }

    #[test]
    fn strings_are_prefix_free() {
        let s = seed();
        assert_ne!(("ab", "c").hash_one(&s), ("a", "bc").hash_one(&s));
        assert_ne!(vec![1u16, 2].hash_one(&s), vec![1u16].hash_one(&s));
    }
}
