// Copyright © 2024 The fe-sample contributors
//
// This file is part of fe-sample.
//
// fe-sample is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the unbiased uniform sampler over ranges of
//! arbitrary-precision integers and its batch forms.
//!
//! Sampling draws exactly as many random bits as the bit length of the range
//! and rejects values outside of it. In contrast to reducing a random value
//! modulo the range, this does not favour small values.
//!
//! Bounds are accepted as anything convertible into [`Z`], so machine
//! integers and references to [`Z`] can be passed alike.

use super::{fill_mat, IntegerDistribution};
use crate::{error::SampleError, sample::byte_source::ByteSource};
use qfall_math::integer::{MatZ, Z};
use serde::{Deserialize, Serialize};

/// The maximal number of draws [`sample`] performs before giving up.
///
/// A single draw is rejected with probability below `1/2`, so less than two
/// draws are needed on average and an honest byte source exhausts all
/// rounds with probability below `2^-128`.
pub const MAX_REJECTION_ROUNDS: u32 = 128;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Samples an integer uniformly at random from `[0, upper)`.
///
/// Parameters:
/// - `upper`: the exclusive upper bound of the interval
/// - `rng`: the source of randomness
///
/// Returns an integer uniformly distributed over `[0, upper)` or a [`SampleError`]
/// if the interval is empty or no value could be drawn.
///
/// # Examples
/// ```
/// use fe_sample::sample::distribution::uniform::sample;
/// use qfall_math::integer::Z;
/// use rand::rngs::OsRng;
///
/// let upper = Z::from(1024);
/// let value = sample(&upper, &mut OsRng).unwrap();
/// let small = sample(17, &mut OsRng).unwrap();
///
/// assert!(Z::ZERO <= value && value < upper);
/// assert!(Z::ZERO <= small && small < Z::from(17));
/// ```
///
/// # Errors and Failures
/// - Returns a [`SampleError`] of type [`InvalidRange`](SampleError::InvalidRange)
/// if `upper <= 0`.
/// - Returns a [`SampleError`] of type [`AllocationFailure`](SampleError::AllocationFailure)
/// if the buffer for the random bytes can not be reserved.
/// - Returns a [`SampleError`] of type [`RejectionLimit`](SampleError::RejectionLimit)
/// if `rng` did not produce a value in range within [`MAX_REJECTION_ROUNDS`] draws.
pub fn sample<R: ByteSource + ?Sized>(
    upper: impl Into<Z>,
    rng: &mut R,
) -> Result<Z, SampleError> {
    sample_below(&upper.into(), rng)
}

/// Samples an integer uniformly at random from `[0, upper)`, see [`sample`].
pub(crate) fn sample_below<R: ByteSource + ?Sized>(
    upper: &Z,
    rng: &mut R,
) -> Result<Z, SampleError> {
    if upper <= &Z::ZERO {
        return Err(SampleError::InvalidRange(format!(
            "the upper bound has to be positive, but it is {upper}"
        )));
    }

    let num_bits = upper.bits();
    let num_bytes = usize::try_from(num_bits.div_ceil(8))
        .map_err(|_| SampleError::AllocationFailure(usize::MAX))?;
    // the leading byte may only contribute the bits that `upper` occupies,
    // which reduces each draw modulo `2^num_bits`
    let excess_bits = (num_bytes as u64 * 8 - num_bits) as u32;
    let leading_mask = 0xffu8 >> excess_bits;

    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(num_bytes)
        .map_err(|_| SampleError::AllocationFailure(num_bytes))?;
    bytes.resize(num_bytes, 0);

    let num_digits = num_bytes
        .checked_mul(2)
        .ok_or(SampleError::AllocationFailure(usize::MAX))?;
    let mut hex = String::new();
    hex.try_reserve_exact(num_digits)
        .map_err(|_| SampleError::AllocationFailure(num_digits))?;

    for round in 0..MAX_REJECTION_ROUNDS {
        rng.fill_random_bytes(&mut bytes);
        bytes[0] &= leading_mask;

        let candidate = from_bytes_be(&bytes, &mut hex)?;
        if &candidate < upper {
            if round > 0 {
                log::trace!(
                    "uniform sample below {upper} accepted after {} rounds",
                    round + 1
                );
            }
            return Ok(candidate);
        }
    }

    Err(SampleError::RejectionLimit(MAX_REJECTION_ROUNDS))
}

/// Samples an integer uniformly at random from `[min, max)`.
///
/// Parameters:
/// - `min`: the inclusive lower bound of the interval
/// - `max`: the exclusive upper bound of the interval
/// - `rng`: the source of randomness
///
/// Returns an integer uniformly distributed over `[min, max)` or a [`SampleError`]
/// if the interval is empty or no value could be drawn.
///
/// # Examples
/// ```
/// use fe_sample::sample::distribution::uniform::sample_range;
/// use qfall_math::integer::Z;
/// use rand::rngs::OsRng;
///
/// let value = sample_range(5, 15, &mut OsRng).unwrap();
///
/// assert!(Z::from(5) <= value && value < Z::from(15));
/// ```
///
/// # Errors and Failures
/// - Returns a [`SampleError`] of type [`InvalidRange`](SampleError::InvalidRange)
/// if `max <= min`.
/// - Returns every other error of [`sample`].
pub fn sample_range<R: ByteSource + ?Sized>(
    min: impl Into<Z>,
    max: impl Into<Z>,
    rng: &mut R,
) -> Result<Z, SampleError> {
    sample_between(&min.into(), &max.into(), rng)
}

fn sample_between<R: ByteSource + ?Sized>(
    min: &Z,
    max: &Z,
    rng: &mut R,
) -> Result<Z, SampleError> {
    if max <= min {
        return Err(SampleError::InvalidRange(format!(
            "the interval [{min}, {max}) is empty"
        )));
    }

    let width = max - min;
    Ok(sample_below(&width, rng)? + min)
}

/// Samples a column vector with entries chosen uniformly at random from `[0, upper)`.
///
/// Parameters:
/// - `dimension`: the number of entries
/// - `upper`: the exclusive upper bound of every entry
/// - `rng`: the source of randomness
///
/// Returns a [`MatZ`] of dimensions `dimension x 1` or a [`SampleError`].
///
/// # Examples
/// ```
/// use fe_sample::sample::distribution::uniform::sample_vec;
/// use rand::rngs::OsRng;
///
/// let vector = sample_vec(50, 1024, &mut OsRng).unwrap();
/// ```
///
/// # Errors and Failures
/// - Returns a [`SampleError`] of type [`InvalidRange`](SampleError::InvalidRange)
/// if `upper <= 0`.
/// - Returns every error of [`sample_mat`](super::sample_mat).
pub fn sample_vec<R: ByteSource + ?Sized>(
    dimension: i64,
    upper: impl Into<Z>,
    rng: &mut R,
) -> Result<MatZ, SampleError> {
    sample_mat(dimension, 1, upper, rng)
}

/// Samples a column vector with entries chosen uniformly at random from `[min, max)`.
///
/// Parameters:
/// - `dimension`: the number of entries
/// - `min`: the inclusive lower bound of every entry
/// - `max`: the exclusive upper bound of every entry
/// - `rng`: the source of randomness
///
/// Returns a [`MatZ`] of dimensions `dimension x 1` or a [`SampleError`].
///
/// # Errors and Failures
/// - Returns a [`SampleError`] of type [`InvalidRange`](SampleError::InvalidRange)
/// if `max <= min`.
/// - Returns every error of [`sample_mat`](super::sample_mat).
pub fn sample_range_vec<R: ByteSource + ?Sized>(
    dimension: i64,
    min: impl Into<Z>,
    max: impl Into<Z>,
    rng: &mut R,
) -> Result<MatZ, SampleError> {
    sample_range_mat(dimension, 1, min, max, rng)
}

/// Samples a matrix with entries chosen uniformly at random from `[0, upper)`.
///
/// Parameters:
/// - `num_rows`: the number of rows
/// - `num_cols`: the number of columns
/// - `upper`: the exclusive upper bound of every entry
/// - `rng`: the source of randomness
///
/// Returns a [`MatZ`] of dimensions `num_rows x num_cols` or a [`SampleError`].
///
/// # Errors and Failures
/// - Returns a [`SampleError`] of type [`InvalidRange`](SampleError::InvalidRange)
/// if `upper <= 0`.
/// - Returns every error of [`sample_mat`](super::sample_mat).
pub fn sample_mat<R: ByteSource + ?Sized>(
    num_rows: i64,
    num_cols: i64,
    upper: impl Into<Z>,
    rng: &mut R,
) -> Result<MatZ, SampleError> {
    let distribution = UniformRange::new_upper(upper)?;
    fill_mat(num_rows, num_cols, || distribution.sample(&mut *rng))
}

/// Samples a matrix with entries chosen uniformly at random from `[min, max)`.
///
/// Parameters:
/// - `num_rows`: the number of rows
/// - `num_cols`: the number of columns
/// - `min`: the inclusive lower bound of every entry
/// - `max`: the exclusive upper bound of every entry
/// - `rng`: the source of randomness
///
/// Returns a [`MatZ`] of dimensions `num_rows x num_cols` or a [`SampleError`].
///
/// # Examples
/// ```
/// use fe_sample::sample::distribution::uniform::sample_range_mat;
/// use qfall_math::integer::Z;
/// use rand::rngs::OsRng;
///
/// let bound = Z::from(1024);
/// let matrix = sample_range_mat(5, 5, Z::ONE - &bound, &bound, &mut OsRng).unwrap();
/// ```
///
/// # Errors and Failures
/// - Returns a [`SampleError`] of type [`InvalidRange`](SampleError::InvalidRange)
/// if `max <= min`.
/// - Returns every error of [`sample_mat`](super::sample_mat).
pub fn sample_range_mat<R: ByteSource + ?Sized>(
    num_rows: i64,
    num_cols: i64,
    min: impl Into<Z>,
    max: impl Into<Z>,
    rng: &mut R,
) -> Result<MatZ, SampleError> {
    let distribution = UniformRange::new(min, max)?;
    fill_mat(num_rows, num_cols, || distribution.sample(&mut *rng))
}

/// Interprets `bytes` as a non-negative big-endian integer.
/// `hex` is cleared and reused as buffer for the digits.
fn from_bytes_be(bytes: &[u8], hex: &mut String) -> Result<Z, SampleError> {
    hex.clear();
    for byte in bytes {
        hex.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
        hex.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
    }
    Ok(Z::from_str_b(hex, 16)?)
}

/// The uniform distribution over the interval `[lower, upper)`.
///
/// Deserialization checks the bounds as [`UniformRange::new`] does.
///
/// Attributes:
/// - `lower`: the inclusive lower bound
/// - `upper`: the exclusive upper bound
///
/// # Examples
/// ```
/// use fe_sample::sample::distribution::{uniform::UniformRange, IntegerDistribution};
/// use rand::rngs::OsRng;
///
/// let distribution = UniformRange::new(-1023, 1024).unwrap();
///
/// let value = distribution.sample_z(&mut OsRng).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UniformBounds")]
pub struct UniformRange {
    lower: Z,
    upper: Z,
}

/// The unchecked bounds a [`UniformRange`] is deserialized from.
#[derive(Deserialize)]
struct UniformBounds {
    lower: Z,
    upper: Z,
}

impl TryFrom<UniformBounds> for UniformRange {
    type Error = SampleError;

    fn try_from(bounds: UniformBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.lower, bounds.upper)
    }
}

impl UniformRange {
    /// Creates the uniform distribution over `[lower, upper)`.
    ///
    /// # Errors and Failures
    /// - Returns a [`SampleError`] of type [`InvalidRange`](SampleError::InvalidRange)
    /// if `upper <= lower`.
    pub fn new(lower: impl Into<Z>, upper: impl Into<Z>) -> Result<Self, SampleError> {
        let (lower, upper) = (lower.into(), upper.into());
        if upper <= lower {
            return Err(SampleError::InvalidRange(format!(
                "the interval [{lower}, {upper}) is empty"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Creates the uniform distribution over `[0, upper)`.
    ///
    /// # Errors and Failures
    /// - Returns a [`SampleError`] of type [`InvalidRange`](SampleError::InvalidRange)
    /// if `upper <= 0`.
    pub fn new_upper(upper: impl Into<Z>) -> Result<Self, SampleError> {
        Self::new(Z::ZERO, upper)
    }

    /// Samples an integer uniformly at random from `[lower, upper)`.
    ///
    /// # Errors and Failures
    /// - Returns the errors of [`sample`] except for
    /// [`InvalidRange`](SampleError::InvalidRange).
    pub fn sample<R: ByteSource + ?Sized>(&self, rng: &mut R) -> Result<Z, SampleError> {
        sample_between(&self.lower, &self.upper, rng)
    }

    pub fn lower(&self) -> &Z {
        &self.lower
    }

    pub fn upper(&self) -> &Z {
        &self.upper
    }
}

#[typetag::serde]
impl IntegerDistribution for UniformRange {
    fn sample_z(&self, rng: &mut dyn ByteSource) -> Result<Z, SampleError> {
        self.sample(rng)
    }
}

/// Replays a fixed sequence of bytes, used to check the mapping from bytes to integers.
#[cfg(test)]
pub(crate) struct Replay {
    pub(crate) bytes: Vec<u8>,
    pub(crate) position: usize,
}

#[cfg(test)]
impl ByteSource for Replay {
    fn fill_random_bytes(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = self.bytes[self.position % self.bytes.len()];
            self.position += 1;
        }
    }

    fn random_below(&mut self, bound: u32) -> u32 {
        let mut buf = [0u8; 1];
        self.fill_random_bytes(&mut buf);
        u32::from(buf[0]) % bound
    }
}



#[cfg(test)]
mod test_batch {
    use super::{sample_mat, sample_range_mat, sample_range_vec, sample_vec, Replay};
    use crate::{error::SampleError, sample::byte_source::ByteSource};
    use qfall_math::{
        integer::Z,
        traits::{GetEntry, GetNumColumns, GetNumRows, Pow},
    };
    use rand::{rngs::StdRng, SeedableRng};

    /// Ensure that vectors of bounded entries as used for inner products are sampled.
    #[test]
    fn inner_product_vectors() {
        let mut rng = StdRng::seed_from_u64(40);
        let bound = Z::from(1024);
        let bound_neg = Z::ONE - &bound;

        let x = sample_range_vec(50, &bound_neg, &bound, &mut rng).unwrap();
        let y = sample_vec(50, &bound, &mut rng).unwrap();

        assert_eq!(50, x.get_num_rows());
        assert_eq!(1, x.get_num_columns());
        for i in 0..50 {
            let x_i: Z = x.get_entry(i, 0).unwrap();
            let y_i: Z = y.get_entry(i, 0).unwrap();
            assert!(bound_neg <= x_i && x_i < bound);
            assert!(Z::ZERO <= y_i && y_i < bound);
        }
    }

    /// Ensure that all entries of a matrix are in range.
    #[test]
    fn matrices() {
        let mut rng = StdRng::seed_from_u64(41);
        let upper = Z::from(17);

        let mat = sample_mat(4, 6, &upper, &mut rng).unwrap();
        let mat_range = sample_range_mat(6, 4, &Z::from(-3), &Z::from(3), &mut rng).unwrap();

        for i in 0..4 {
            for j in 0..6 {
                let entry: Z = mat.get_entry(i, j).unwrap();
                assert!(Z::ZERO <= entry && entry < upper);
                let entry: Z = mat_range.get_entry(j, i).unwrap();
                assert!(Z::from(-3) <= entry && entry < Z::from(3));
            }
        }
    }

    /// Ensure that entries are not all equal, i.e. sampled independently.
    #[test]
    fn independent_entries() {
        let mut rng = StdRng::seed_from_u64(42);
        let upper = Z::from(2).pow(64).unwrap();

        let vec = sample_vec(20, &upper, &mut rng).unwrap();

        let first: Z = vec.get_entry(0, 0).unwrap();
        assert!((1..20).any(|i| {
            let entry: Z = vec.get_entry(i, 0).unwrap();
            entry != first
        }));
    }

    /// Ensure that batches can be drawn from a byte source behind a trait object.
    #[test]
    fn dyn_byte_source() {
        let mut rng = StdRng::seed_from_u64(44);
        let rng: &mut dyn ByteSource = &mut rng;

        let vec = sample_vec(5, 10, rng).unwrap();
        let vec_range = sample_range_vec(5, -10, 10, rng).unwrap();
        let mat = sample_mat(2, 3, 10, rng).unwrap();
        let mat_range = sample_range_mat(3, 2, -10, 10, rng).unwrap();

        assert_eq!(5, vec.get_num_rows());
        assert_eq!(5, vec_range.get_num_rows());
        assert_eq!(3, mat.get_num_columns());
        assert_eq!(2, mat_range.get_num_columns());
        for i in 0..5 {
            let entry: Z = vec_range.get_entry(i, 0).unwrap();
            assert!(Z::from(-10) <= entry && entry < Z::from(10));
        }
    }

    /// Ensure that an invalid range is reported before any entry is sampled.
    #[test]
    fn invalid_range() {
        let mut rng = StdRng::seed_from_u64(43);

        assert!(matches!(
            sample_vec(3, &Z::ZERO, &mut rng),
            Err(SampleError::InvalidRange(_))
        ));
        assert!(matches!(
            sample_range_mat(3, 3, &Z::ONE, &Z::ZERO, &mut rng),
            Err(SampleError::InvalidRange(_))
        ));
    }

    /// Ensure that a failure in the middle of a batch reports the failing entry.
    #[test]
    fn failing_entry() {
        // 0x01 is accepted for the first entry, 0xff is rejected forever afterwards
        let mut bytes = vec![0x01];
        bytes.extend(std::iter::repeat(0xff).take(super::MAX_REJECTION_ROUNDS as usize));
        let mut replay = Replay { bytes, position: 0 };

        let err = sample_vec(3, &Z::from(5), &mut replay).unwrap_err();

        match err {
            SampleError::Entry { row, column, source } => {
                assert_eq!((1, 0), (row, column));
                assert!(matches!(*source, SampleError::RejectionLimit(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
