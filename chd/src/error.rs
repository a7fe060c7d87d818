//! Construction errors.

use displaydoc::Display;
use thiserror::Error;

/// Table construction failures.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// keys at input positions {first} and {second} are equal
    DuplicateKey {
        /// Position of the earlier occurrence.
        first: usize,
        /// Position of the later occurrence.
        second: usize,
    },

    /// no perfect hash function found in {attempts} attempts
    ConstructionExhausted {
        /// Number of seeds tried.
        attempts: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages() {
        assert_eq!(
            BuildError::DuplicateKey {
                first: 0,
                second: 1
            }
            .to_string(),
            "keys at input positions 0 and 1 are equal",
        );
        assert_eq!(
            BuildError::ConstructionExhausted { attempts: 3 }.to_string(),
            "no perfect hash function found in 3 attempts",
        );
    }
}
