#![cfg(feature = "codegen")]

//! Code generation.
//!
//! Tables are usually built in `build.rs` and embedded into the binary. [`CodeGenerator`] turns a
//! built table into an expression that can be `include!`d as the initializer of a `static`: no
//! allocation and no construction happen at runtime.
//!
//! Integers, `char`, `bool`, string and byte slices, options, tuples and the tables themselves can
//! be codegen-ed. For your own keys, implement the [`Codegen`] trait manually.
//!
//! # Example
//!
//! ```rust
//! use chd::{codegen::CodeGenerator, Map};
//!
//! let map: Map<&str, u32> = Map::from_entries(vec![("cat", 1), ("dog", 2)]);
//! let code = CodeGenerator::new().generate(&map);
//!
//! // `code` can now be saved to an `.rs` file and loaded with
//! // `static MAP: Map<&str, u32> = include!(concat!(env!("OUT_DIR"), "/map.rs"));`
//! assert!(code.to_string().contains("__from_raw_parts"));
//! ```

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use proc_macro2::{Ident, Literal, TokenStream, TokenTree};
use quote::{format_ident, quote};

/// Code generator.
///
/// Output is deterministic: generating the same value twice produces identical token streams.
pub struct CodeGenerator {
    /// How to refer to crates, by name.
    crate_paths: BTreeMap<String, TokenStream>,
    /// Short aliases of all resolved paths.
    path_to_alias: BTreeMap<String, Ident>,
    /// Aliases already taken.
    aliases: BTreeSet<String>,
}

impl CodeGenerator {
    /// Create a code generator with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            crate_paths: BTreeMap::from([("chd".into(), quote!(::chd))]),
            path_to_alias: BTreeMap::new(),
            aliases: BTreeSet::new(),
        }
    }

    /// Configure how a crate is referred to.
    ///
    /// By default, `chd` is mapped to `::chd` and every other crate `name` to `::name`. Set `chd`
    /// to `crate` to embed tables into `chd` itself, or to a reexport path when generating code
    /// from a proc-macro.
    #[inline]
    pub fn set_crate(&mut self, name: &str, path: TokenStream) -> &mut Self {
        self.crate_paths.insert(name.into(), path);
        self
    }

    /// Turn a value into code.
    #[inline]
    pub fn generate<T: ?Sized + Codegen>(mut self, value: &T) -> TokenStream {
        let value = self.piece(value);

        let uses = self.path_to_alias.iter().map(|(path, alias)| {
            let mut components = path.split("::");
            let crate_name = components.next().unwrap_or_default();
            let crate_path = self.crate_paths.get(crate_name).cloned().unwrap_or_else(|| {
                let ident = format_ident!("{crate_name}");
                quote!(:: #ident)
            });
            let components = components.map(|component| format_ident!("{component}"));
            quote!(use #crate_path #(:: #components)* as #alias;)
        });

        quote!(
            {
                #(#uses)*
                #value
            }
        )
    }

    /// Turn a value into a recursively useable piece of code.
    #[inline]
    pub fn piece<T: ?Sized + Codegen>(&mut self, piece: &T) -> TokenStream {
        piece.generate_piece(self)
    }

    /// Turn a sequence into an array expression.
    ///
    /// Byte sequences are emitted as dereferenced byte string literals.
    #[inline]
    pub fn array<'a, T: 'a + Codegen>(
        &mut self,
        elements: impl IntoIterator<Item = &'a T>,
    ) -> TokenStream {
        let elements: Vec<&T> = elements.into_iter().collect();
        if typeid::of::<T>() == typeid::of::<u8>() {
            // SAFETY: `T` is `u8`.
            let bytes: Vec<u8> = elements
                .iter()
                .map(|&element| unsafe { *core::ptr::from_ref(element).cast::<u8>() })
                .collect();
            let bytes = Literal::byte_string(&bytes);
            return quote!(*#bytes);
        }
        let elements = elements.into_iter().map(|element| self.piece(element));
        quote!([#(#elements),*])
    }

    /// Resolve a path.
    ///
    /// The input string must look like `crate::path::inside::it` and be `use`able. The crate is
    /// resolved according to [`set_crate`](Self::set_crate), and the path is replaced with a short
    /// alias imported once per generated expression.
    #[inline]
    #[allow(clippy::arithmetic_side_effects, reason = "bounded by the number of aliases")]
    pub fn path(&mut self, path: &str) -> TokenStream {
        if let Some(alias) = self.path_to_alias.get(path) {
            return quote!(#alias);
        }

        let base = format!("__{}", path.rsplit_once("::").map_or(path, |(_, name)| name));
        let mut alias = base.clone();
        let mut n = 2usize;
        while self.aliases.contains(&alias) {
            alias = format!("{base}{n}");
            n += 1;
        }

        let ident = format_ident!("{alias}");
        self.aliases.insert(alias);
        self.path_to_alias.insert(path.into(), ident.clone());
        quote!(#ident)
    }
}

impl Default for CodeGenerator {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Values that can be turned into code.
pub trait Codegen {
    /// Emit a piece of code corresponding to this value.
    ///
    /// This method is only supposed to be called recursively from [`Codegen`] implementations. Call
    /// [`CodeGenerator::generate`] to produce the complete code output for a single value.
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream;
}

/// Implement [`Codegen`] for types with suffixed literals.
macro_rules! literal {
    ($($ty:ty => $method:ident,)*) => {
        $(
            impl Codegen for $ty {
                #[inline]
                fn generate_piece(&self, _gen: &mut CodeGenerator) -> TokenStream {
                    TokenTree::Literal(Literal::$method(*self)).into()
                }
            }
        )*
    };
}

literal! {
    u8 => u8_suffixed,
    u16 => u16_suffixed,
    u32 => u32_suffixed,
    u64 => u64_suffixed,
    u128 => u128_suffixed,
    usize => usize_suffixed,
    i8 => i8_suffixed,
    i16 => i16_suffixed,
    i32 => i32_suffixed,
    i64 => i64_suffixed,
    i128 => i128_suffixed,
    isize => isize_suffixed,
    f32 => f32_suffixed,
    f64 => f64_suffixed,
}

impl Codegen for bool {
    #[inline]
    fn generate_piece(&self, _gen: &mut CodeGenerator) -> TokenStream {
        TokenTree::Ident(format_ident!("{self}")).into()
    }
}

impl Codegen for char {
    #[inline]
    fn generate_piece(&self, _gen: &mut CodeGenerator) -> TokenStream {
        TokenTree::Literal(Literal::character(*self)).into()
    }
}

/// Emitted as a place, so that `&str` becomes `&*"..."`.
impl Codegen for str {
    #[inline]
    fn generate_piece(&self, _gen: &mut CodeGenerator) -> TokenStream {
        let literal = Literal::string(self);
        quote!(*#literal)
    }
}

impl<T: Codegen> Codegen for [T] {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        gen.array(self)
    }
}

impl<T: Codegen, const N: usize> Codegen for [T; N] {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        gen.array(self)
    }
}

impl<T: ?Sized + Codegen> Codegen for &T {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        if let Some(string) = downcast_ref::<T, str>(self) {
            return TokenTree::Literal(Literal::string(string)).into();
        }
        if let Some(bytes) = downcast_ref::<T, [u8]>(self) {
            let bytes = Literal::byte_string(bytes);
            return quote!(#bytes as &[u8]);
        }
        let target = gen.piece(*self);
        quote!(&#target)
    }
}

/// Reinterpret `&T` as `&U` if they are the same type.
fn downcast_ref<'a, T: ?Sized, U: ?Sized>(object: &&'a T) -> Option<&'a U> {
    if typeid::of::<T>() == typeid::of::<U>() {
        // SAFETY: `T` and `U` are the same type, so the references have the same layout.
        Some(unsafe { core::mem::transmute_copy::<&T, &U>(object) })
    } else {
        None
    }
}

impl<T: ?Sized> Codegen for core::marker::PhantomData<T> {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        gen.path("core::marker::PhantomData")
    }
}

impl<T: Codegen> Codegen for Option<T> {
    #[inline]
    fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
        match self {
            None => gen.path("core::option::Option::None"),
            Some(value) => {
                let some = gen.path("core::option::Option::Some");
                let value = gen.piece(value);
                quote!(#some(#value))
            }
        }
    }
}

impl Codegen for () {
    #[inline]
    fn generate_piece(&self, _gen: &mut CodeGenerator) -> TokenStream {
        quote!(())
    }
}

/// Implement [`Codegen`] for tuples.
macro_rules! tuple {
    ($(($($name:ident $index:tt),*))*) => {
        $(
            impl<$($name: Codegen),*> Codegen for ($($name,)*) {
                #[inline]
                fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
                    let elements = [$(gen.piece(&self.$index)),*];
                    quote!((#(#elements,)*))
                }
            }
        )*
    };
}

tuple! {
    (A 0)
    (A 0, B 1)
    (A 0, B 1, C 2)
    (A 0, B 1, C 2, D 3)
}
