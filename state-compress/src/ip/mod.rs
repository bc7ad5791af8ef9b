// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The integer-programming encoding of "generalize without collision".

mod constraints;
mod model;
mod registry;

pub use constraints::*;
pub use model::*;
pub use registry::*;
