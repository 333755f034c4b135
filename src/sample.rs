// Copyright © 2024 The fe-sample contributors
//
// This file is part of fe-sample.
//
// fe-sample is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains anything that can be sampled for functional-encryption
//! schemes. This includes the source of randomness and the distributions
//! `Uniform` and `NormalCumulative`.

pub mod byte_source;
pub mod distribution;
