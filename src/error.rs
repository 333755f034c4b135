// Copyright © 2024 The fe-sample contributors
//
// This file is part of fe-sample.
//
// fe-sample is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the error type returned by all fallible samplers.

use qfall_math::error::MathError;
use thiserror::Error;

/// Errors that can occur while sampling or while precomputing a sampler.
///
/// Violations of caller contracts, e.g. calling [`locate`](crate::utils::locate::locate)
/// on a table that is not sorted, are not represented here. They are checked
/// by debug assertions instead.
#[derive(Error, Debug)]
pub enum SampleError {
    /// The requested range is empty, i.e. `upper <= 0` or `max <= min`.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// A sampler was configured with unusable parameters.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Reserving storage for the given number of elements failed.
    #[error("allocation of {0} elements failed")]
    AllocationFailure(usize),

    /// The byte source did not produce a value in range within the given
    /// number of rejection rounds.
    #[error("no value in range was drawn within {0} rejection rounds")]
    RejectionLimit(u32),

    /// Sampling an entry of a vector or matrix failed.
    #[error("sampling entry ({row}, {column}) failed: {source}")]
    Entry {
        row: i64,
        column: i64,
        #[source]
        source: Box<SampleError>,
    },

    #[error(transparent)]
    Math(#[from] MathError),
}

impl SampleError {
    /// Attaches the position of a vector or matrix entry to `self`.
    pub(crate) fn at(self, row: i64, column: i64) -> Self {
        SampleError::Entry {
            row,
            column,
            source: Box::new(self),
        }
    }
}
