// Copyright © 2024 The fe-sample contributors
//
// This file is part of fe-sample.
//
// fe-sample is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the [`NormalCumulative`] sampler, which draws
//! integers from a discrete Gaussian centered on `0` by means of a
//! precomputed cumulative distribution table.
//!
//! A single sample costs one uniform draw below the total mass of the table
//! and a binary search through it. As the table grows with `σ * sqrt(n)`,
//! the sampler is only suited for moderately sized standard deviations.

use super::{fill_mat, uniform, IntegerDistribution};
use crate::{error::SampleError, sample::byte_source::ByteSource};
use qfall_math::integer::{MatZ, Z};
use serde::{Deserialize, Serialize};
use table::CumulativeTable;

pub mod table;

/// Collects the parameters a [`NormalCumulative`] sampler is built from.
///
/// Attributes:
/// - `sigma`: the standard deviation of the Gaussian
/// - `n`: the precision parameter, i.e. the number of fractional bits of the
///   precomputed weights, which also determines the tail bound
/// - `two_sided`: defines whether negative values can be sampled
///
/// # Examples
/// ```
/// use fe_sample::sample::distribution::normal_cumulative::NormalCumulativeParams;
///
/// let params = NormalCumulativeParams::new(3.0, 64, true).unwrap();
/// let default = NormalCumulativeParams::init_default(3.0).unwrap();
///
/// assert_eq!(256, default.n);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalCumulativeParams {
    pub sigma: f64,
    pub n: u32,
    pub two_sided: bool,
}

impl NormalCumulativeParams {
    /// The precision used by [`NormalCumulativeParams::init_default`].
    pub const DEFAULT_PRECISION: u32 = 256;

    /// Creates a parameter set after checking that `sigma` is a positive finite
    /// number and `n` is positive.
    ///
    /// # Errors and Failures
    /// - Returns a [`SampleError`] of type [`InvalidParameter`](SampleError::InvalidParameter)
    /// if `sigma <= 0`, `sigma` is not finite, or `n == 0`.
    pub fn new(sigma: f64, n: u32, two_sided: bool) -> Result<Self, SampleError> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(SampleError::InvalidParameter(format!(
                "sigma has to be a positive finite number, but it is {sigma}"
            )));
        }
        if n == 0 {
            return Err(SampleError::InvalidParameter(String::from(
                "the precision parameter n has to be positive",
            )));
        }
        Ok(Self {
            sigma,
            n,
            two_sided,
        })
    }

    /// Initializes the default parameters for the standard deviation `sigma`:
    /// - `n = 256`, so that the weights carry `256` exact fractional bits and the
    ///   tail is cut at `⌈σ * sqrt(512 ln(2))⌉ ≈ 18.84 σ`
    /// - `two_sided = true`, as schemes usually need signed noise
    ///
    /// # Errors and Failures
    /// - Returns a [`SampleError`] of type [`InvalidParameter`](SampleError::InvalidParameter)
    /// if `sigma <= 0` or `sigma` is not finite.
    pub fn init_default(sigma: f64) -> Result<Self, SampleError> {
        Self::new(sigma, Self::DEFAULT_PRECISION, true)
    }
}

/// Samples integers from the discrete Gaussian with mean `0` and standard
/// deviation `σ` according to a precomputed [`CumulativeTable`].
///
/// The table is built once on construction and only read while sampling.
/// Rebuilding it via [`NormalCumulative::precompute`] needs exclusive access,
/// so it can not happen while samples are drawn. The table is released
/// when the sampler is dropped.
///
/// The sampler is serialized as its [`NormalCumulativeParams`]; deserializing
/// rebuilds the table.
///
/// # Examples
/// ```
/// use fe_sample::sample::distribution::normal_cumulative::NormalCumulative;
/// use qfall_math::integer::Z;
/// use rand::rngs::OsRng;
///
/// let sampler = NormalCumulative::init(3.0, 64, false).unwrap();
///
/// let sample = sampler.sample(&mut OsRng).unwrap();
/// assert!(sample >= Z::ZERO);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NormalCumulativeParams", into = "NormalCumulativeParams")]
pub struct NormalCumulative {
    params: NormalCumulativeParams,
    precomputed: CumulativeTable,
}

impl NormalCumulative {
    /// Initializes a sampler with mean `0` and precomputes its table.
    ///
    /// Parameters:
    /// - `sigma`: the standard deviation
    /// - `n`: the precision parameter
    /// - `two_sided`: defines whether negative values can be sampled
    ///
    /// Returns a sampler ready to draw samples or a [`SampleError`]
    /// if the parameters are unusable.
    ///
    /// # Examples
    /// ```
    /// use fe_sample::sample::distribution::normal_cumulative::NormalCumulative;
    ///
    /// let sampler = NormalCumulative::init(3.0, 1, true).unwrap();
    ///
    /// assert_eq!(3, sampler.precomputed().tail_bound());
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`SampleError`] of type [`InvalidParameter`](SampleError::InvalidParameter)
    /// if `sigma <= 0`, `sigma` is not finite, `n == 0`, or the table would
    /// only allow to sample `0`.
    /// - Returns a [`SampleError`] of type [`AllocationFailure`](SampleError::AllocationFailure)
    /// if the storage of the table can not be reserved.
    pub fn init(sigma: f64, n: u32, two_sided: bool) -> Result<Self, SampleError> {
        Self::from_params(NormalCumulativeParams::new(sigma, n, two_sided)?)
    }

    /// Initializes a sampler from a parameter set and precomputes its table.
    ///
    /// # Errors and Failures
    /// - Returns the errors of [`CumulativeTable::build`].
    pub fn from_params(params: NormalCumulativeParams) -> Result<Self, SampleError> {
        let precomputed = CumulativeTable::build(params.sigma, params.n, params.two_sided)?;
        Ok(Self {
            params,
            precomputed,
        })
    }

    /// Rebuilds the table from the stored parameters.
    /// As the precomputation is deterministic, the table does not change.
    ///
    /// # Errors and Failures
    /// - Returns the errors of [`CumulativeTable::build`].
    /// The previous table is kept in this case.
    pub fn precompute(&mut self) -> Result<(), SampleError> {
        self.precomputed =
            CumulativeTable::build(self.params.sigma, self.params.n, self.params.two_sided)?;
        Ok(())
    }

    /// Draws a single sample.
    ///
    /// A value `u` is drawn uniformly from `[0, sample_size)` and the
    /// magnitude is the index of the bucket of the table containing `u`.
    /// If the sampler is two-sided, non-zero magnitudes are negated with
    /// probability `1/2`.
    ///
    /// Parameters:
    /// - `rng`: the source of randomness
    ///
    /// Returns an integer distributed according to the discrete Gaussian or
    /// a [`SampleError`] if the uniform draw failed.
    ///
    /// # Examples
    /// ```
    /// use fe_sample::sample::distribution::normal_cumulative::NormalCumulative;
    /// use rand::rngs::OsRng;
    ///
    /// let sampler = NormalCumulative::init(10.0, 128, true).unwrap();
    ///
    /// let sample = sampler.sample(&mut OsRng).unwrap();
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns the errors of [`uniform::sample`] except for
    /// [`InvalidRange`](SampleError::InvalidRange), as the total mass is positive.
    pub fn sample<R: ByteSource + ?Sized>(&self, rng: &mut R) -> Result<Z, SampleError> {
        let u = uniform::sample_below(self.sample_size(), rng)?;
        let magnitude = self.precomputed.locate(&u);
        let value = Z::from(magnitude as u64);

        if self.params.two_sided && magnitude != 0 && rng.random_bit() {
            Ok(Z::ZERO - &value)
        } else {
            Ok(value)
        }
    }

    /// Samples a column vector whose entries are drawn independently by [`NormalCumulative::sample`].
    ///
    /// Parameters:
    /// - `dimension`: the number of entries
    /// - `rng`: the source of randomness
    ///
    /// Returns a [`MatZ`] of dimensions `dimension x 1` or a [`SampleError`].
    ///
    /// # Errors and Failures
    /// - Returns the errors of [`sample_mat`](super::sample_mat).
    pub fn sample_vec<R: ByteSource + ?Sized>(
        &self,
        dimension: i64,
        rng: &mut R,
    ) -> Result<MatZ, SampleError> {
        self.sample_mat(dimension, 1, rng)
    }

    /// Samples a matrix whose entries are drawn independently by [`NormalCumulative::sample`].
    ///
    /// Parameters:
    /// - `num_rows`: the number of rows
    /// - `num_cols`: the number of columns
    /// - `rng`: the source of randomness
    ///
    /// Returns a [`MatZ`] of dimensions `num_rows x num_cols` or a [`SampleError`].
    ///
    /// # Examples
    /// ```
    /// use fe_sample::sample::distribution::normal_cumulative::NormalCumulative;
    /// use rand::rngs::OsRng;
    ///
    /// let sampler = NormalCumulative::init(3.0, 64, true).unwrap();
    ///
    /// let noise = sampler.sample_mat(10, 2, &mut OsRng).unwrap();
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns the errors of [`sample_mat`](super::sample_mat).
    pub fn sample_mat<R: ByteSource + ?Sized>(
        &self,
        num_rows: i64,
        num_cols: i64,
        rng: &mut R,
    ) -> Result<MatZ, SampleError> {
        fill_mat(num_rows, num_cols, || self.sample(&mut *rng))
    }

    /// Returns the total mass of the table, i.e. the size of the interval
    /// uniform values are drawn from.
    pub fn sample_size(&self) -> &Z {
        self.precomputed.total_mass()
    }

    pub fn sigma(&self) -> f64 {
        self.params.sigma
    }

    pub fn precision(&self) -> u32 {
        self.params.n
    }

    pub fn is_two_sided(&self) -> bool {
        self.params.two_sided
    }

    pub fn params(&self) -> &NormalCumulativeParams {
        &self.params
    }

    pub fn precomputed(&self) -> &CumulativeTable {
        &self.precomputed
    }
}

impl TryFrom<NormalCumulativeParams> for NormalCumulative {
    type Error = SampleError;

    fn try_from(params: NormalCumulativeParams) -> Result<Self, Self::Error> {
        Self::from_params(params)
    }
}

impl From<NormalCumulative> for NormalCumulativeParams {
    fn from(sampler: NormalCumulative) -> Self {
        sampler.params
    }
}

#[typetag::serde]
impl IntegerDistribution for NormalCumulative {
    fn sample_z(&self, rng: &mut dyn ByteSource) -> Result<Z, SampleError> {
        self.sample(rng)
    }
}
