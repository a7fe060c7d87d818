//! Tables embedded at compile time by the build script.

use chd::{Map, OrderedMap, Set};

/// Three-syllable words, mapped to their position in the generated list.
pub static WORDS: Map<&str, usize> = include!(concat!(env!("OUT_DIR"), "/words.rs"));

/// Planets in order from the Sun.
pub static PLANETS: OrderedMap<&str, u8> = include!(concat!(env!("OUT_DIR"), "/planets.rs"));

/// Primes below 1000.
pub static PRIMES: Set<u64> = include!(concat!(env!("OUT_DIR"), "/primes.rs"));

/// Byte-string keys.
pub static BYTES: Map<&[u8], char> = include!(concat!(env!("OUT_DIR"), "/bytes.rs"));
