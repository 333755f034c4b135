// Copyright © 2024 The fe-sample contributors
//
// This file is part of fe-sample.
//
// fe-sample is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This crate provides the randomness layer of functional-encryption schemes
//! over arbitrary-precision integers:
//! - an unbiased uniform sampler over `[0, upper)` and `[min, max)`,
//! - a discrete Gaussian sampler centered on `0` that draws from a precomputed
//!   cumulative distribution table, and
//! - vector and matrix batch forms of both.
//!
//! Randomness is taken from any [`ByteSource`](sample::byte_source::ByteSource),
//! which is implemented for every cryptographically secure [`rand`] generator.

pub mod error;
pub mod sample;
pub mod utils;
