// Copyright © 2024 The fe-sample contributors
//
// This file is part of fe-sample.
//
// fe-sample is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the binary search that maps a uniformly drawn value
//! onto the bucket of a cumulative distribution table containing it.

use qfall_math::integer::Z;

/// Finds the smallest index `i` in `[start, end]` such that `table[i] > target`.
///
/// Interpreting `table` as cumulative masses, the returned index is the
/// half-open bucket `[table[i - 1], table[i])` that contains `target`.
/// Only `O(log(end - start))` comparisons are performed and no integer is
/// allocated.
///
/// Parameters:
/// - `target`: the value whose bucket is searched for
/// - `start`: the first index of `table` that is considered
/// - `end`: the last index of `table` that is considered
/// - `table`: a non-decreasing sequence of integers
///
/// Returns the smallest index `i` in `[start, end]` with `table[i] > target`.
///
/// # Examples
/// ```
/// use fe_sample::utils::locate::locate;
/// use qfall_math::integer::Z;
///
/// let table = [Z::from(2), Z::from(3), Z::from(4), Z::from(5)];
///
/// assert_eq!(0, locate(&Z::from(1), 0, 3, &table));
/// assert_eq!(1, locate(&Z::from(2), 0, 3, &table));
/// assert_eq!(3, locate(&Z::from(4), 0, 3, &table));
/// ```
///
/// # Panics ...
/// - if `end` is not a valid index of `table`.
/// - in debug builds, if `start > end`, `table` is not sorted in ascending order,
///   or `target >= table[end]`. The result is meaningless in release builds then.
pub fn locate(target: &Z, start: usize, end: usize, table: &[Z]) -> usize {
    debug_assert!(start <= end, "start index {start} exceeds end index {end}");
    debug_assert!(
        table[start..=end].windows(2).all(|pair| pair[0] <= pair[1]),
        "the table has to be sorted in ascending order"
    );
    debug_assert!(target < &table[end], "the target is not covered by the table");

    let mut low = start;
    let mut high = end;
    // invariant: table[high] > target, and table[i] <= target for all start <= i < low
    while low < high {
        let middle = low + (high - low) / 2;
        if &table[middle] <= target {
            low = middle + 1;
        } else {
            high = middle;
        }
    }
    low
}

#[cfg(test)]
mod test_locate {
    use super::locate;
    use qfall_math::integer::Z;

    /// Returns the index [`locate`] has to find by scanning `table` linearly.
    fn linear_scan(target: &Z, table: &[Z]) -> usize {
        table.iter().position(|entry| entry > target).unwrap()
    }

    fn table_from(values: &[i64]) -> Vec<Z> {
        values.iter().map(|value| Z::from(*value)).collect()
    }

    /// Ensure that every target below the last entry is mapped to its bucket.
    #[test]
    fn all_targets() {
        let table = table_from(&[2, 3, 4, 5]);

        for target in 0..5 {
            let target = Z::from(target);
            assert_eq!(linear_scan(&target, &table), locate(&target, 0, 3, &table));
        }
    }

    /// Ensure that repeated entries, i.e. buckets without mass, are skipped.
    #[test]
    fn repeated_entries() {
        let table = table_from(&[1, 1, 3, 3, 7]);

        assert_eq!(0, locate(&Z::ZERO, 0, 4, &table));
        assert_eq!(2, locate(&Z::from(1), 0, 4, &table));
        assert_eq!(2, locate(&Z::from(2), 0, 4, &table));
        assert_eq!(4, locate(&Z::from(3), 0, 4, &table));
        assert_eq!(4, locate(&Z::from(6), 0, 4, &table));
    }

    /// Ensure that the boundaries `0` and `table[last] - 1` are located correctly.
    #[test]
    fn boundaries() {
        let table = table_from(&[10, 25, 27, 40, 41, 100]);

        assert_eq!(0, locate(&Z::ZERO, 0, 5, &table));
        assert_eq!(5, locate(&Z::from(99), 0, 5, &table));
        assert_eq!(1, locate(&Z::from(10), 0, 5, &table));
        assert_eq!(4, locate(&Z::from(40), 0, 5, &table));
    }

    /// Ensure that the search respects the given sub-range of the table.
    #[test]
    fn sub_range() {
        let table = table_from(&[1, 2, 3, 4, 5, 6, 7, 8]);

        assert_eq!(3, locate(&Z::ZERO, 3, 6, &table));
        assert_eq!(5, locate(&Z::from(5), 3, 6, &table));
        assert_eq!(6, locate(&Z::from(6), 3, 6, &table));
    }

    /// Ensure that a table with a single entry works.
    #[test]
    fn single_entry() {
        let table = table_from(&[3]);

        for target in 0..3 {
            assert_eq!(0, locate(&Z::from(target), 0, 0, &table));
        }
    }

    /// Ensure that large integers are compared correctly.
    #[test]
    fn large_entries() {
        let base = Z::from(u64::MAX);
        let table = vec![&base * &base, &base * &base + Z::ONE, &base * &base * Z::from(2)];

        assert_eq!(0, locate(&base, 0, 2, &table));
        assert_eq!(1, locate(&(&base * &base), 0, 2, &table));
        assert_eq!(2, locate(&(&base * &base + Z::ONE), 0, 2, &table));
    }

    /// Ensure that a target outside of the table is caught in debug builds.
    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn target_too_large() {
        let table = table_from(&[1, 2, 3]);

        locate(&Z::from(3), 0, 2, &table);
    }
}
