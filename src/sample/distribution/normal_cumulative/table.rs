// Copyright © 2024 The fe-sample contributors
//
// This file is part of fe-sample.
//
// fe-sample is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the [`CumulativeTable`] of a discrete Gaussian
//! centered on `0` and the precomputation building it.
//!
//! The density `ρ(x) = exp(-x^2 / (2σ^2))` of every magnitude `x` is turned
//! into the fixed-point weight `⌊ρ(x) * 2^n⌋`. Magnitudes beyond
//! `τ = ⌈σ * sqrt(2 ln(2) n)⌉` have `ρ(x) < 2^-n`, so their weight is `0`
//! and the table ends there.
//!
//! Weights are computed in fixed-point arithmetic on [`Z`] from the exact
//! binary value of `σ`, so every one of the `n` fractional bits is correct
//! and not only the 53 bits of a binary64 density.

use crate::{error::SampleError, utils::locate::locate};
use num_traits::Float;
use qfall_math::{integer::Z, traits::Pow};
use std::f64::consts::LN_2;

/// Fractional bits computed beyond the requested precision.
const GUARD_BITS: u32 = 64;

/// Cumulative weights of the magnitudes `0, 1, ..., tail_bound` of a
/// discrete Gaussian, in fixed-point representation.
///
/// Entry `i` holds the summed weight of the magnitudes in `[0, i]`, hence the
/// entries are non-decreasing and the last entry is the total mass.
///
/// # Examples
/// ```
/// use fe_sample::sample::distribution::normal_cumulative::table::CumulativeTable;
/// use qfall_math::integer::Z;
///
/// let table = CumulativeTable::build(3.0, 1, false).unwrap();
///
/// assert_eq!(&[Z::from(2), Z::from(3), Z::from(4), Z::from(5)], table.entries());
/// assert_eq!(&Z::from(5), table.total_mass());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeTable {
    entries: Vec<Z>,
}

impl CumulativeTable {
    /// Precomputes the cumulative weights of a discrete Gaussian with mean `0`.
    ///
    /// If `two_sided` is set, the weight of every non-zero magnitude is doubled,
    /// as it stands for both `x` and `-x`. A sampler then chooses the sign
    /// uniformly at random, which results in `P(x) = P(-x)`.
    ///
    /// Parameters:
    /// - `sigma`: the standard deviation
    /// - `n`: the precision parameter, i.e. the number of fractional bits of
    ///   the weights, which also determines the tail bound
    /// - `two_sided`: defines whether the weights account for negative values
    ///
    /// Returns the table of cumulative weights or a [`SampleError`] if the
    /// parameters are unusable.
    ///
    /// # Errors and Failures
    /// - Returns a [`SampleError`] of type [`InvalidParameter`](SampleError::InvalidParameter)
    /// if `sigma` is not a positive finite number, if `n == 0`, or if the table would
    /// hold the magnitude `0` only.
    /// - Returns a [`SampleError`] of type [`AllocationFailure`](SampleError::AllocationFailure)
    /// if the storage of the table can not be reserved.
    pub fn build(sigma: f64, n: u32, two_sided: bool) -> Result<Self, SampleError> {
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

        // one spare magnitude absorbs rounding of the float tail bound
        let len = tail_bound(sigma, n)
            .checked_add(2)
            .ok_or(SampleError::AllocationFailure(usize::MAX))?;
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(len)
            .map_err(|_| SampleError::AllocationFailure(len))?;

        // ρ(x) = q^(x^2) with q = exp(-1/(2σ^2)), hence ρ(x + 1) = ρ(x) * q^(2x + 1)
        let precision = working_precision(n, len)?;
        let one = Z::from(2).pow(precision)?;
        let (numerator, denominator) = inverse_two_sigma_squared(sigma)?;
        let mut ratio = exp_neg(&numerator, &denominator, precision)?;
        let ratio_step = (&ratio * &ratio).div_floor(&one);
        let unit = Z::from(2).pow(precision - i64::from(n))?;

        let mut density = one.clone();
        let mut total = Z::ZERO;
        for x in 0..len {
            let mut weight = density.div_floor(&unit);
            // the density decreases, so no later magnitude has weight either
            if weight == Z::ZERO {
                break;
            }
            if two_sided && x != 0 {
                weight = weight * Z::from(2);
            }
            total = total + weight;
            entries.push(total.clone());

            density = (density * &ratio).div_floor(&one);
            ratio = (ratio * &ratio_step).div_floor(&one);
        }

        if entries.len() < 2 {
            return Err(SampleError::InvalidParameter(format!(
                "sigma = {sigma} and n = {n} only allow to sample 0"
            )));
        }

        log::debug!(
            "precomputed cumulative table for sigma = {sigma}, n = {n}, two_sided = {two_sided} \
            with {} entries",
            entries.len()
        );

        Ok(Self { entries })
    }

    /// Returns the cumulative weights in ascending order.
    pub fn entries(&self) -> &[Z] {
        &self.entries
    }

    /// Returns the number of entries, i.e. the number of magnitudes that can be sampled.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `false`, as every built table holds at least two entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the largest magnitude with non-zero weight.
    pub fn tail_bound(&self) -> usize {
        self.entries.len() - 1
    }

    /// Returns the sum of all weights, which equals the last entry.
    pub fn total_mass(&self) -> &Z {
        &self.entries[self.entries.len() - 1]
    }

    /// Returns the magnitude whose bucket contains `target`.
    ///
    /// # Panics ...
    /// - in debug builds, if `target` is negative or not smaller than [`CumulativeTable::total_mass`].
    pub fn locate(&self, target: &Z) -> usize {
        debug_assert!(target >= &Z::ZERO, "the target has to be non-negative");
        locate(target, 0, self.entries.len() - 1, &self.entries)
    }
}

/// Returns `⌈σ * sqrt(2 ln(2) n)⌉`, the smallest magnitude `x` with `ρ(x) <= 2^-n`.
/// The result saturates at [`usize::MAX`].
fn tail_bound(sigma: f64, n: u32) -> usize {
    (sigma * (2.0 * LN_2 * f64::from(n)).sqrt()).ceil() as usize
}

/// Returns the number of fractional bits the weights are computed with.
///
/// Every step of the recurrence over `len` magnitudes loses less than one unit
/// in the last place, so `2 * bits(len)` bits absorb the accumulated error and
/// [`GUARD_BITS`] keep it from reaching bit `n`.
fn working_precision(n: u32, len: usize) -> Result<i64, SampleError> {
    let len_bits = i64::from(usize::BITS - len.leading_zeros());
    let precision = i64::from(n) + i64::from(GUARD_BITS) + 2 * len_bits;
    if precision > i64::from(u32::MAX) {
        return Err(SampleError::InvalidParameter(format!(
            "the precision parameter n = {n} is too large"
        )));
    }
    Ok(precision)
}

/// Returns `1/(2σ^2)` as an exact fraction `(numerator, denominator)`.
fn inverse_two_sigma_squared(sigma: f64) -> Result<(Z, Z), SampleError> {
    // σ = mantissa * 2^exponent
    let (mantissa, exponent, _) = sigma.integer_decode();
    let mantissa_squared = Z::from(mantissa) * Z::from(mantissa);
    let shift = 2 * i64::from(exponent) + 1;

    if shift >= 0 {
        Ok((Z::ONE, mantissa_squared * Z::from(2).pow(shift)?))
    } else {
        Ok((Z::from(2).pow(-shift)?, mantissa_squared))
    }
}

/// Computes `exp(-numerator / denominator) * 2^precision`, rounded down.
///
/// The argument is halved until it is at most `1/2`, the exponential of the
/// reduced argument is summed as Taylor series and the result is squared back.
/// All steps run with [`GUARD_BITS`] plus one bit per halving beyond `precision`,
/// so the result is exact unless the true value lies within `2^-GUARD_BITS`
/// of an integer.
///
/// Parameters:
/// - `numerator`: the non-negative numerator of the argument
/// - `denominator`: the positive denominator of the argument
/// - `precision`: the number of fractional bits of the result
fn exp_neg(numerator: &Z, denominator: &Z, precision: i64) -> Result<Z, SampleError> {
    let two = Z::from(2);
    let mut halvings = 0;
    let mut reduced_denominator = denominator.clone();
    while numerator * &two > reduced_denominator {
        reduced_denominator = reduced_denominator * &two;
        halvings += 1;
    }

    let extra_bits = i64::from(GUARD_BITS) + halvings;
    let one = Z::from(2).pow(precision + extra_bits)?;
    let argument = (numerator * &one).div_floor(&reduced_denominator);

    // the terms alternate in sign and shrink at least by half each step
    let mut sum = one.clone();
    let mut term = one.clone();
    let mut k: i64 = 1;
    while term > Z::ZERO {
        term = (term * &argument).div_floor(&(&one * &Z::from(k)));
        if k % 2 == 1 {
            sum = sum - &term;
        } else {
            sum = sum + &term;
        }
        k += 1;
    }

    for _ in 0..halvings {
        sum = (&sum * &sum).div_floor(&one);
    }

    Ok(sum.div_floor(&Z::from(2).pow(extra_bits)?))
}
