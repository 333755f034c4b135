// Copyright © 2024 The fe-sample contributors
//
// This file is part of fe-sample.
//
// fe-sample is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module collects the distributions integers can be sampled from and
//! the adapters that fill vectors and matrices entry by entry.
//!
//! Vectors are represented as [`MatZ`] with a single column.

use super::byte_source::ByteSource;
use crate::error::SampleError;
use qfall_math::{
    integer::{MatZ, Z},
    traits::SetEntry,
};

pub mod normal_cumulative;
pub mod uniform;

/// This trait should be implemented by all distributions over the integers
/// that schemes want to sample vectors or matrices from.
/// Trait objects can be (de-)serialized, so schemes can store the
/// distributions they were set up with.
///
/// Parameters:
/// - `rng`: the source of randomness the sample is drawn from
///
/// Returns a single integer sampled according to the distribution or a
/// [`SampleError`] if sampling failed.
#[typetag::serde]
pub trait IntegerDistribution {
    fn sample_z(&self, rng: &mut dyn ByteSource) -> Result<Z, SampleError>;
}

/// Samples a column vector whose entries are drawn independently from `distribution`.
///
/// Parameters:
/// - `distribution`: the distribution every entry is drawn from
/// - `dimension`: the number of entries of the vector
/// - `rng`: the source of randomness
///
/// Returns a [`MatZ`] of dimensions `dimension x 1` or a [`SampleError`]
/// describing the first entry that could not be sampled.
///
/// # Examples
/// ```
/// use fe_sample::sample::distribution::{sample_vec, uniform::UniformRange};
/// use qfall_math::integer::Z;
/// use rand::rngs::OsRng;
///
/// let distribution = UniformRange::new(Z::from(-5), Z::from(5)).unwrap();
///
/// let vector = sample_vec(&distribution, 10, &mut OsRng).unwrap();
/// ```
///
/// # Errors and Failures
/// - Returns a [`SampleError`] of type [`InvalidParameter`](SampleError::InvalidParameter)
/// if `dimension < 1`.
/// - Returns a [`SampleError`] of type [`Entry`](SampleError::Entry)
/// carrying the index of the first entry that could not be sampled.
/// Entries sampled before are discarded.
pub fn sample_vec<D: IntegerDistribution + ?Sized>(
    distribution: &D,
    dimension: i64,
    rng: &mut dyn ByteSource,
) -> Result<MatZ, SampleError> {
    sample_mat(distribution, dimension, 1, rng)
}

/// Samples a matrix whose entries are drawn independently from `distribution`.
///
/// Parameters:
/// - `distribution`: the distribution every entry is drawn from
/// - `num_rows`: the number of rows of the matrix
/// - `num_cols`: the number of columns of the matrix
/// - `rng`: the source of randomness
///
/// Returns a [`MatZ`] of dimensions `num_rows x num_cols` or a [`SampleError`]
/// describing the first entry that could not be sampled.
///
/// # Examples
/// ```
/// use fe_sample::sample::distribution::{normal_cumulative::NormalCumulative, sample_mat};
/// use rand::rngs::OsRng;
///
/// let sampler = NormalCumulative::init(3.0, 64, true).unwrap();
///
/// let matrix = sample_mat(&sampler, 4, 3, &mut OsRng).unwrap();
/// ```
///
/// # Errors and Failures
/// - Returns a [`SampleError`] of type [`InvalidParameter`](SampleError::InvalidParameter)
/// if `num_rows < 1` or `num_cols < 1`.
/// - Returns a [`SampleError`] of type [`Entry`](SampleError::Entry)
/// carrying the index of the first entry that could not be sampled.
/// Entries sampled before are discarded.
pub fn sample_mat<D: IntegerDistribution + ?Sized>(
    distribution: &D,
    num_rows: i64,
    num_cols: i64,
    rng: &mut dyn ByteSource,
) -> Result<MatZ, SampleError> {
    fill_mat(num_rows, num_cols, || distribution.sample_z(&mut *rng))
}

/// Fills a `num_rows x num_cols` matrix row by row with the values of `sample_entry`.
///
/// # Errors and Failures
/// - Returns a [`SampleError`] of type [`InvalidParameter`](SampleError::InvalidParameter)
/// if `num_rows < 1` or `num_cols < 1`.
/// - Returns a [`SampleError`] of type [`Entry`](SampleError::Entry)
/// carrying the index of the first entry that could not be sampled.
pub(crate) fn fill_mat<F>(
    num_rows: i64,
    num_cols: i64,
    mut sample_entry: F,
) -> Result<MatZ, SampleError>
where
    F: FnMut() -> Result<Z, SampleError>,
{
    if num_rows < 1 || num_cols < 1 {
        return Err(SampleError::InvalidParameter(format!(
            "a matrix needs at least one row and one column, but {num_rows}x{num_cols} were requested"
        )));
    }

    let mut out = MatZ::new(num_rows, num_cols);
    for row in 0..num_rows {
        for column in 0..num_cols {
            sample_entry()
                .and_then(|entry| Ok(out.set_entry(row, column, &entry)?))
                .map_err(|err| err.at(row, column))?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod test_sample_mat {
    use super::{sample_mat, sample_vec, IntegerDistribution};
    use crate::{
        error::SampleError,
        sample::{byte_source::ByteSource, distribution::uniform::UniformRange},
    };
    use qfall_math::{
        integer::Z,
        traits::{GetEntry, GetNumColumns, GetNumRows},
    };
    use rand::{rngs::StdRng, SeedableRng};

    /// A distribution that fails on every draw.
    #[derive(serde::Serialize, serde::Deserialize)]
    struct AlwaysFails;

    #[typetag::serde]
    impl IntegerDistribution for AlwaysFails {
        fn sample_z(&self, _rng: &mut dyn ByteSource) -> Result<Z, SampleError> {
            Err(SampleError::InvalidParameter(String::from("always fails")))
        }
    }

    /// Ensure that the dimensions of the output are the requested ones.
    #[test]
    fn dimensions() {
        let mut rng = StdRng::seed_from_u64(10);
        let distribution = UniformRange::new_upper(Z::from(10)).unwrap();

        let mat = sample_mat(&distribution, 3, 7, &mut rng).unwrap();
        let vec = sample_vec(&distribution, 5, &mut rng).unwrap();

        assert_eq!(3, mat.get_num_rows());
        assert_eq!(7, mat.get_num_columns());
        assert_eq!(5, vec.get_num_rows());
        assert_eq!(1, vec.get_num_columns());
    }

    /// Ensure that every entry is sampled from the distribution.
    #[test]
    fn entries_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let distribution = UniformRange::new(Z::from(-3), Z::from(3)).unwrap();

        let mat = sample_mat(&distribution, 6, 6, &mut rng).unwrap();

        for i in 0..6 {
            for j in 0..6 {
                let entry: Z = mat.get_entry(i, j).unwrap();
                assert!(Z::from(-3) <= entry && entry < Z::from(3));
            }
        }
    }

    /// Ensure that trait objects can be used as distribution.
    #[test]
    fn trait_object() {
        let mut rng = StdRng::seed_from_u64(12);
        let distribution: Box<dyn IntegerDistribution> =
            Box::new(UniformRange::new_upper(Z::from(2)).unwrap());

        let vec = sample_vec(distribution.as_ref(), 4, &mut rng).unwrap();

        assert_eq!(4, vec.get_num_rows());
    }

    /// Ensure that a byte source behind a trait object can drive the batch.
    #[test]
    fn dyn_byte_source() {
        let mut rng = StdRng::seed_from_u64(15);
        let rng: &mut dyn ByteSource = &mut rng;
        let distribution = UniformRange::new_upper(Z::from(10)).unwrap();

        let mat = sample_mat(&distribution, 2, 3, rng).unwrap();
        let vec = sample_vec(&distribution, 4, rng).unwrap();

        assert_eq!(3, mat.get_num_columns());
        assert_eq!(4, vec.get_num_rows());
    }

    /// Ensure that empty dimensions are rejected.
    #[test]
    fn empty_dimensions() {
        let mut rng = StdRng::seed_from_u64(13);
        let distribution = UniformRange::new_upper(Z::from(10)).unwrap();

        assert!(matches!(
            sample_mat(&distribution, 0, 3, &mut rng),
            Err(SampleError::InvalidParameter(_))
        ));
        assert!(matches!(
            sample_mat(&distribution, 3, -1, &mut rng),
            Err(SampleError::InvalidParameter(_))
        ));
        assert!(matches!(
            sample_vec(&distribution, 0, &mut rng),
            Err(SampleError::InvalidParameter(_))
        ));
    }

    /// Ensure that a failing entry aborts the batch and reports its position.
    #[test]
    fn failing_entry() {
        let mut rng = StdRng::seed_from_u64(14);

        let err = sample_mat(&AlwaysFails, 2, 2, &mut rng).unwrap_err();

        match err {
            SampleError::Entry { row, column, source } => {
                assert_eq!((0, 0), (row, column));
                assert!(matches!(*source, SampleError::InvalidParameter(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
