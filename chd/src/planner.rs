//! Splitting keys into buckets.

#![cfg(feature = "build")]

use super::algorithms::group_by_key;
use alloc::vec::Vec;

/// A key as seen by the solver: `(input position, slot hint)`.
pub type Member = (usize, usize);

/// Keys, split into buckets.
pub struct Buckets {
    /// Members of all buckets, each bucket stored contiguously.
    members: Vec<Member>,

    /// Non-empty buckets, grouped by size. `by_size[s]` lists `(bucket, start)` for buckets of
    /// size `s` in ascending bucket order, where `start` indexes into `members`.
    by_size: Vec<Vec<(usize, usize)>>,

    /// The number of buckets, including empty ones.
    bucket_count: usize,

    /// The table size hints were reduced by.
    table_size: usize,
}

impl Buckets {
    /// Split hashed keys into buckets.
    ///
    /// `hashes[i]` is the `(h1, h2)` pair of key `i`. With `n` keys, there are
    /// `max(1, ceil(n / bucket_size))` buckets; key `i` goes to bucket `h1 mod bucket_count` and gets
    /// the hint `h2 mod table_size`.
    ///
    /// # Errors
    ///
    /// Two keys with equal hints in one bucket can't be separated by any displacement. If any such
    /// pairs exist, all of them are returned as `(i, j)` with `i < j`.
    ///
    /// # Panics
    ///
    /// Panics if `table_size` or `bucket_size` is zero.
    #[allow(clippy::cast_possible_truncation, reason = "reduced modulo a usize")]
    #[allow(
        clippy::arithmetic_side_effects,
        reason = "divisors are non-zero and sizes are bounded by `hashes.len()`"
    )]
    pub fn plan(
        hashes: &[(u64, u64)],
        table_size: usize,
        bucket_size: usize,
    ) -> Result<Self, Vec<(usize, usize)>> {
        assert!(table_size > 0, "empty table");
        assert!(bucket_size > 0, "empty buckets");
        let bucket_count = hashes.len().div_ceil(bucket_size).max(1);

        let mut members = Vec::with_capacity(hashes.len());
        let mut by_size: Vec<Vec<(usize, usize)>> = Vec::new();
        let mut collisions = Vec::new();

        group_by_key(
            hashes.iter().copied().enumerate(),
            hashes.len(),
            &mut |(_, (h1, _))| (h1 % bucket_count as u64) as usize,
            0..bucket_count,
            &mut |bucket, keys| {
                let start = members.len();
                for (index, (_, h2)) in keys {
                    let hint = (h2 % table_size as u64) as usize;
                    // Buckets hold about three keys, a quadratic scan beats anything smarter.
                    for &(other, other_hint) in &members[start..] {
                        if other_hint == hint {
                            collisions.push((other, index));
                        }
                    }
                    members.push((index, hint));
                }

                let size = members.len() - start;
                if by_size.len() <= size {
                    by_size.resize_with(size + 1, Vec::new);
                }
                by_size[size].push((bucket, start));
            },
        );

        if !collisions.is_empty() {
            return Err(collisions);
        }

        Ok(Self {
            members,
            by_size,
            bucket_count,
            table_size,
        })
    }

    /// Iterate over non-empty buckets, largest first, ties in ascending bucket order.
    ///
    /// Yields `(bucket, members)`.
    #[allow(clippy::arithmetic_side_effects, reason = "`start + size <= members.len()`")]
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Member])> {
        self.by_size
            .iter()
            .enumerate()
            .rev()
            .flat_map(move |(size, buckets)| {
                buckets
                    .iter()
                    .map(move |&(bucket, start)| (bucket, &self.members[start..start + size]))
            })
    }

    /// The number of buckets, including empty ones.
    pub const fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// The table size hints were reduced by.
    pub const fn table_size(&self) -> usize {
        self.table_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn bucket_count() {
        let hashes = vec![(0, 0); 0];
        assert_eq!(Buckets::plan(&hashes, 1, 5).ok().map(|b| b.bucket_count()), Some(1));

        let hashes: Vec<(u64, u64)> = (0..11).map(|i| (i, i)).collect();
        let buckets = Buckets::plan(&hashes, 11, 5).ok().unwrap();
        assert_eq!(buckets.bucket_count(), 3);
        assert_eq!(buckets.table_size(), 11);
    }

    #[test]
    fn order() {
        // Three buckets: 0 gets keys 0 and 3, 1 gets keys 1, 4 and 5, 2 gets key 2.
        let hashes = vec![(0, 0), (1, 1), (2, 2), (3, 3), (4, 4), (7, 5)];
        let buckets = Buckets::plan(&hashes, 7, 2).ok().unwrap();
        let order: Vec<(usize, Vec<Member>)> = buckets
            .iter()
            .map(|(bucket, members)| (bucket, members.to_vec()))
            .collect();
        assert_eq!(
            order,
            vec![
                (1, vec![(1, 1), (4, 4), (5, 5)]),
                (0, vec![(0, 0), (3, 3)]),
                (2, vec![(2, 2)]),
            ],
        );
    }

    #[test]
    fn ties_in_bucket_order() {
        let hashes = vec![(2, 0), (0, 1), (1, 2)];
        let buckets = Buckets::plan(&hashes, 3, 1).ok().unwrap();
        let order: Vec<usize> = buckets.iter().map(|(bucket, _)| bucket).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn hint_collisions() {
        // All keys in one bucket; keys 0, 2 and 3 share hint 1 under table size 4.
        let hashes = vec![(0, 1), (0, 2), (0, 5), (0, 9)];
        let collisions = Buckets::plan(&hashes, 4, 5).err().unwrap();
        assert_eq!(collisions, vec![(0, 2), (0, 3), (2, 3)]);
    }

    #[test]
    fn equal_hints_in_different_buckets() {
        let hashes = vec![(0, 1), (1, 1)];
        assert!(Buckets::plan(&hashes, 2, 1).is_ok(), "hints only matter within a bucket");
    }

    #[test]
    #[should_panic = "empty buckets"]
    fn zero_bucket_size() {
        let _ = Buckets::plan(&[(1, 2)], 1, 0);
    }
}
