//! Read-only arrays that can live in `static`s.

use core::fmt;
use core::ops::Deref;

/// A read-only slice that is either borrowed from a `static` or owned.
///
/// Tables built at runtime own their arrays. Tables emitted by [`codegen`](crate::codegen) point
/// at `static` data, which lets them be created in a `const` context. This type covers both
/// without making `T: 'static` a requirement for the runtime case.
///
/// There is no mutable access: compile-time data can't be written to, and tables are immutable
/// anyway.
///
/// The representation is private, so the only way to borrow data is
/// [`from_static_ref`](Self::from_static_ref):
///
/// ```compile_fail
/// use chd::low_level::ConstVec;
///
/// let dangling = ConstVec::<u8>::Static(core::ptr::slice_from_raw_parts(8 as *const u8, 4));
/// ```
#[derive(Clone)]
pub struct ConstVec<T> {
    /// Where the data lives.
    repr: Repr<T>,
}

/// Storage of a [`ConstVec`].
#[derive(Clone)]
enum Repr<T> {
    /// Semantically `&'static [T]`. That doesn't compile without `T: 'static`, and bounds cannot be
    /// placed on individual variants, so we store a pointer.
    Static(*const [T]),

    /// Heap-allocated data.
    #[cfg(feature = "alloc")]
    Owned(alloc::vec::Vec<T>),
}

// SAFETY: `Owned` is `Send` iff `Vec<T>` is, i.e. iff `T: Send`. `Static` can only be created with
// `T: Sync`, in which case `&'static [T]: Send`.
unsafe impl<T: Send> Send for ConstVec<T> {}
// SAFETY: `T: Sync` implies both `Vec<T>: Sync` and `&'static [T]: Sync`.
unsafe impl<T: Sync> Sync for ConstVec<T> {}

impl<T> ConstVec<T> {
    /// Borrow static data.
    ///
    /// `T: Sync` is required because `ConstVec<T>: Send` only needs `T: Send`: two vectors created
    /// from one slice and sent to different threads would otherwise share `!Sync` data.
    #[inline]
    #[must_use]
    pub const fn from_static_ref(data: &'static [T]) -> Self
    where
        T: Sync,
    {
        Self {
            repr: Repr::Static(data),
        }
    }

    /// Take ownership of runtime data.
    #[cfg(feature = "alloc")]
    #[inline]
    #[must_use]
    pub const fn from_vec(data: alloc::vec::Vec<T>) -> Self {
        Self {
            repr: Repr::Owned(data),
        }
    }
}

impl<T> Deref for ConstVec<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        match &self.repr {
            // SAFETY: `data` originates from a `&'static [T]`, and only
            // `from_static_ref` builds this variant.
            Repr::Static(data) => unsafe { &**data },
            #[cfg(feature = "alloc")]
            Repr::Owned(data) => data,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ConstVec<T> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(feature = "codegen")]
impl<T: super::codegen::Codegen> super::codegen::Codegen for ConstVec<T> {
    #[inline]
    fn generate_piece(&self, gen: &mut super::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let const_vec = gen.path("chd::low_level::ConstVec");
        let data = gen.array(self.iter());
        quote::quote!(#const_vec::from_static_ref(&#data))
    }
}

/// Scope for `serde`-related code.
#[cfg(feature = "serde")]
mod serde_support {
    use super::ConstVec;
    use serde::ser::{Serialize, Serializer};

    impl<T: Serialize> Serialize for ConstVec<T> {
        #[inline]
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(self.iter())
        }
    }

    #[cfg(feature = "alloc")]
    impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for ConstVec<T> {
        #[inline]
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            alloc::vec::Vec::<T>::deserialize(deserializer).map(Self::from_vec)
        }
    }
}
