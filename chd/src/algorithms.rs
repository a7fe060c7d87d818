//! Grouping and scattering used during construction.

#![cfg(feature = "build")]

use alloc::{vec, vec::Vec};
use core::mem::MaybeUninit;
use core::ops::Range;
use fixed_slice_vec::FixedSliceVec;

/// Move each `(index, element)` pair into `destination[index]`.
pub fn scatter<T>(source: impl IntoIterator<Item = (usize, T)>, destination: &mut [Option<T>]) {
    for (index, element) in source {
        destination[index] = Some(element);
    }
}

/// One of the partitions of the first radix pass.
///
/// Elements go to `reserved` while it has room and to `overflow` afterwards. Reservations are
/// carved from one allocation sized for an even split, so only the excess of skewed partitions
/// ever reallocates.
struct Partition<'buffer, T> {
    /// Preallocated space.
    reserved: FixedSliceVec<'buffer, T>,
    /// Elements that didn't fit.
    overflow: Vec<T>,
}

impl<'buffer, T> Partition<'buffer, T> {
    /// Wrap a reservation.
    const fn new(reserved: FixedSliceVec<'buffer, T>) -> Self {
        Self {
            reserved,
            overflow: Vec::new(),
        }
    }

    /// Append an element.
    fn push(&mut self, element: T) {
        if let Err(error) = self.reserved.try_push(element) {
            self.overflow.push(error.0);
        }
    }

    /// Number of elements.
    ///
    /// # Panics
    ///
    /// Panics if there are more than `usize::MAX` elements, which can only happen with ZSTs.
    fn len(&self) -> usize {
        self.reserved
            .len()
            .checked_add(self.overflow.len())
            .expect("more than `usize::MAX` elements in a partition")
    }

    /// Iterate in insertion order.
    fn iter(&self) -> core::iter::Chain<core::slice::Iter<'_, T>, core::slice::Iter<'_, T>> {
        self.reserved.iter().chain(self.overflow.iter())
    }
}

/// Group elements by key with a single counting sort.
///
/// # Panics
///
/// Panics if a key falls outside `groups` or if `elements` yields different sequences when cloned.
#[allow(clippy::arithmetic_side_effects, reason = "bounded by the element count")]
fn counting_sort<T: Copy>(
    elements: impl Iterator<Item = T> + Clone,
    key: &mut impl FnMut(T) -> usize,
    groups: Range<usize>,
    callback: &mut impl FnMut(usize, &mut dyn Iterator<Item = T>),
) {
    let mut counts = vec![0usize; groups.len()];
    for element in elements.clone() {
        counts[key(element) - groups.start] += 1;
    }

    let mut cursors = Vec::with_capacity(counts.len());
    let mut total = 0;
    for count in &counts {
        cursors.push(total);
        total += count;
    }

    let mut buffer = vec![MaybeUninit::uninit(); total];
    for element in elements {
        let cursor = &mut cursors[key(element) - groups.start];
        buffer[*cursor].write(element);
        *cursor += 1;
    }

    let mut start = 0;
    for (offset, count) in counts.into_iter().enumerate() {
        let end = start + count;
        if count > 0 {
            // Every group's cursor only moves up from `start`, so reaching `end` means the whole
            // range was written.
            assert_eq!(
                cursors[offset], end,
                "`elements` iterator is non-deterministic",
            );
            let group = &buffer[start..end];
            // SAFETY: `group` is initialized, see above. `MaybeUninit<T>` has the layout of `T`.
            let group = unsafe { &*(core::ptr::from_ref(group) as *const [T]) };
            callback(groups.start + offset, &mut group.iter().copied());
        }
        start = end;
    }
}

/// Split elements into groups by key.
///
/// `key` must map every element into `groups`. `callback` is invoked once per non-empty group, in
/// ascending key order, with the key and the group's elements. Elements within a group keep their
/// relative order from `elements`.
///
/// Large inputs are first partitioned by the top of the key range so that each counting sort
/// touches a cache-sized array of counters.
///
/// `elements_len` should be the length of `elements`; it is only used for sizing buffers.
///
/// # Panics
///
/// Panics if a key falls outside `groups` or if `elements` yields different sequences when cloned.
#[allow(clippy::arithmetic_side_effects, reason = "false positives")]
#[allow(clippy::cast_possible_truncation, reason = "results are below `groups.end`")]
pub fn group_by_key<T: Copy>(
    elements: impl Iterator<Item = T> + Clone,
    elements_len: usize,
    key: &mut impl FnMut(T) -> usize,
    groups: Range<usize>,
    callback: &mut impl FnMut(usize, &mut dyn Iterator<Item = T>),
) {
    /// Number of partitions per radix pass.
    const PARTITIONS: usize = 256;

    /// The element count at which partitioning starts paying off.
    const CUTOFF: usize = 200_000;

    let width = groups.len();
    if elements_len < CUTOFF || width <= PARTITIONS {
        counting_sort(elements, key, groups, callback);
        return;
    }

    // Partition `p` holds keys in `[boundary(p); boundary(p + 1))`.
    let start = groups.start;
    let partition_of =
        |group: usize| (((group - start) as u128 * PARTITIONS as u128) / width as u128) as usize;
    let boundary = |partition: usize| {
        start + (partition as u128 * width as u128).div_ceil(PARTITIONS as u128) as usize
    };

    let reserved_capacity = (elements_len / PARTITIONS).max(1);
    let mut buffer = vec![MaybeUninit::uninit(); reserved_capacity * PARTITIONS];
    let mut partitions: Vec<Partition<'_, T>> = buffer
        .chunks_mut(reserved_capacity)
        .map(|chunk| Partition::new(FixedSliceVec::new(chunk)))
        .collect();

    for element in elements {
        partitions[partition_of(key(element))].push(element);
    }

    for (index, partition) in partitions.iter().enumerate() {
        let len = partition.len();
        if len > 0 {
            group_by_key(
                partition.iter().copied(),
                len,
                key,
                boundary(index)..boundary(index + 1),
                callback,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapidhash::RapidRng;

    fn check_grouping(elements: &[(usize, u64)], groups: Range<usize>) {
        let mut grouped = Vec::new();
        let mut previous = None;
        group_by_key(
            elements.iter().copied(),
            elements.len(),
            &mut |(group, _)| group,
            groups,
            &mut |group, members| {
                assert!(previous < Some(group), "groups out of order");
                previous = Some(group);
                for member in members {
                    assert_eq!(member.0, group, "element in a foreign group");
                    grouped.push(member);
                }
            },
        );

        // A stable sort by group is exactly what grouping should produce.
        let mut expected = elements.to_vec();
        expected.sort_by_key(|&(group, _)| group);
        assert_eq!(grouped, expected);
    }

    #[test]
    fn small() {
        let elements = [(3, 0), (1, 1), (3, 2), (0, 3), (1, 4)];
        check_grouping(&elements, 0..4);
    }

    #[test]
    fn offset_range() {
        let elements = [(13, 0), (10, 1), (12, 2)];
        check_grouping(&elements, 10..14);
    }

    #[test]
    fn large() {
        let mut rng = RapidRng::new(0x9e37_79b9_7f4a_7c15);
        let elements: Vec<(usize, u64)> = (0..300_000u64)
            .map(|i| ((rng.next() % 77_777) as usize, i))
            .collect();
        check_grouping(&elements, 0..77_777);
    }

    #[test]
    fn scatter_inverse() {
        let source = vec![5, 0, 4, 2, 3, 1, 6];
        let mut destination = vec![None; 7];
        scatter(source.into_iter().map(|x| (x, x)), &mut destination);
        assert_eq!(destination, (0..=6).map(Some).collect::<Vec<_>>());
    }
}
