// Copyright © 2024 The fe-sample contributors
//
// This file is part of fe-sample.
//
// fe-sample is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the [`ByteSource`] trait, the only source of
//! randomness the samplers of this crate draw from.

use rand::{CryptoRng, Rng, RngCore};

/// This trait should be implemented by every source of randomness the samplers
/// are supposed to draw from. The source has to be unpredictable and its
/// output uniformly distributed.
///
/// It is implemented for every cryptographically secure generator of the
/// [`rand`] crate, e.g. [`OsRng`](rand::rngs::OsRng) or
/// [`StdRng`](rand::rngs::StdRng).
///
/// # Examples
/// ```
/// use fe_sample::sample::byte_source::ByteSource;
/// use rand::rngs::OsRng;
///
/// let mut buf = [0u8; 32];
/// OsRng.fill_random_bytes(&mut buf);
///
/// let below = OsRng.random_below(7);
/// assert!(below < 7);
/// ```
pub trait ByteSource {
    /// Overwrites every byte of `buf` with a fresh random byte.
    fn fill_random_bytes(&mut self, buf: &mut [u8]);

    /// Returns an integer drawn uniformly at random from `[0, bound)`.
    ///
    /// # Panics ...
    /// - if `bound == 0`.
    fn random_below(&mut self, bound: u32) -> u32;

    /// Returns a fair random bit.
    fn random_bit(&mut self) -> bool {
        self.random_below(2) == 1
    }
}

impl<R: RngCore + CryptoRng> ByteSource for R {
    fn fill_random_bytes(&mut self, buf: &mut [u8]) {
        self.fill_bytes(buf);
    }

    fn random_below(&mut self, bound: u32) -> u32 {
        assert!(bound > 0, "the bound of random_below must be positive");
        self.gen_range(0..bound)
    }
}
