//! Construction options.

use super::hash::DEFAULT_SEED_BASE;

/// Parameters of table construction.
///
/// The defaults work for any key set; tweak them only to trade construction time for table size
/// or to get a different (but still deterministic) table.
///
/// ```rust
/// use chd::{BuildOptions, Map};
///
/// let options = BuildOptions::new().with_slack_percent(10).with_seed(42);
/// let map: Map<u32, &str> = Map::try_from_entries_with(vec![(1, "one"), (2, "two")], &options)
///     .unwrap();
/// assert_eq!(map.get(&2), Some(&"two"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BuildOptions {
    /// Average number of keys per bucket.
    bucket_size: usize,
    /// Extra slots on top of the key count, in percent.
    slack_percent: usize,
    /// Number of seeds to try before giving up.
    max_attempts: usize,
    /// Largest displacement the solver may assign.
    max_displacement: u32,
    /// Base of the seed sequence.
    seed: u64,
}

impl BuildOptions {
    /// The default options.
    ///
    /// - bucket size 3,
    /// - 1% slack,
    /// - 256 attempts,
    /// - unbounded displacements,
    /// - the built-in seed sequence.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bucket_size: 3,
            slack_percent: 1,
            max_attempts: 256,
            max_displacement: u32::MAX,
            seed: DEFAULT_SEED_BASE,
        }
    }

    /// Set the average bucket size (CHD's λ).
    ///
    /// Larger buckets mean fewer displacements to store, but harder placement: two keys of one
    /// bucket sharing a slot hint fail the whole attempt, and that happens about `λ / 2` times per
    /// attempt on average. Zero is treated as one.
    #[inline]
    #[must_use]
    pub const fn with_bucket_size(mut self, bucket_size: usize) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    /// Set the initial slack.
    ///
    /// The first attempt uses a table of `n + n * slack_percent / 100` slots for `n` keys. Every
    /// failed attempt grows the table by 0.5%.
    #[inline]
    #[must_use]
    pub const fn with_slack_percent(mut self, slack_percent: usize) -> Self {
        self.slack_percent = slack_percent;
        self
    }

    /// Set the number of seeds to try before failing with
    /// [`ConstructionExhausted`](super::BuildError::ConstructionExhausted).
    #[inline]
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Cap the displacements the solver may assign.
    ///
    /// Displacements are limited by the table size anyway, so this only matters if you want to
    /// store them in a narrower type elsewhere.
    #[inline]
    #[must_use]
    pub const fn with_max_displacement(mut self, max_displacement: u32) -> Self {
        self.max_displacement = max_displacement;
        self
    }

    /// Start the seed sequence from another base.
    #[inline]
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Average number of keys per bucket, at least one.
    #[inline]
    #[must_use]
    pub const fn bucket_size(&self) -> usize {
        if self.bucket_size == 0 {
            1
        } else {
            self.bucket_size
        }
    }

    /// Initial slack, in percent.
    #[inline]
    #[must_use]
    pub const fn slack_percent(&self) -> usize {
        self.slack_percent
    }

    /// Number of seeds to try.
    #[inline]
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Largest displacement the solver may assign.
    #[inline]
    #[must_use]
    pub const fn max_displacement(&self) -> u32 {
        self.max_displacement
    }

    /// Base of the seed sequence.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Table size of the first attempt for `n` keys. Never zero.
    pub(crate) const fn initial_table_size(&self, n: usize) -> usize {
        let slack = n.saturating_mul(self.slack_percent) / 100;
        let size = n.saturating_add(slack);
        if size == 0 {
            1
        } else {
            size
        }
    }
}

impl Default for BuildOptions {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
