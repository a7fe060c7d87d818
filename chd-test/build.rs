//! Builds tables on the host and emits them as code.

use chd::codegen::CodeGenerator;
use chd::{Map, OrderedMap, Set};
use std::path::PathBuf;

/// A deterministic word list, large enough to exercise the retry loop.
fn words() -> Vec<String> {
    const SYLLABLES: [&str; 16] = [
        "ka", "lo", "mi", "nu", "pe", "ra", "si", "to", "va", "ze", "bo", "di", "fu", "ga", "hi",
        "jo",
    ];
    let mut words = Vec::new();
    for a in SYLLABLES {
        for b in SYLLABLES {
            for c in SYLLABLES {
                words.push(format!("{a}{b}{c}"));
            }
        }
    }
    words
}

#[allow(clippy::arithmetic_side_effects, reason = "trial division below 1000")]
fn main() {
    println!("cargo::rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let words = words();

    let map: Map<&str, usize> =
        Map::from_entries(words.iter().map(String::as_str).zip(0..).collect());
    let code = CodeGenerator::new().generate(&map);
    std::fs::write(out_dir.join("words.rs"), code.to_string()).expect("failed to write words.rs");

    let planets = OrderedMap::from_entries(vec![
        ("mercury", 1u8),
        ("venus", 2),
        ("earth", 3),
        ("mars", 4),
        ("jupiter", 5),
        ("saturn", 6),
        ("uranus", 7),
        ("neptune", 8),
    ]);
    let code = CodeGenerator::new().generate(&planets);
    std::fs::write(out_dir.join("planets.rs"), code.to_string())
        .expect("failed to write planets.rs");

    let primes: Set<u64> = Set::from_elements(
        (2..1000u64)
            .filter(|&n| (2..n).take_while(|d| d * d <= n).all(|d| n % d != 0))
            .collect(),
    );
    let code = CodeGenerator::new().generate(&primes);
    std::fs::write(out_dir.join("primes.rs"), code.to_string()).expect("failed to write primes.rs");

    let bytes: Map<&[u8], char> =
        Map::from_entries(vec![(&b"\x00\xff"[..], 'a'), (&b""[..], 'b')]);
    let code = CodeGenerator::new().generate(&bytes);
    std::fs::write(out_dir.join("bytes.rs"), code.to_string()).expect("failed to write bytes.rs");
}
