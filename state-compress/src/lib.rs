// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compresses a decision table, mapping complete states to actions, into the smallest set of
//! partial states per action that matches exactly that action's states.
//!
//! The number of partial states is minimized first, then the total number of specified facts.
//! Each action is searched incrementally over the number of partial states, solving an integer
//! program per trial size.

pub mod compress;
pub mod display;
pub mod errors;
pub mod ip;
pub mod natural;
pub mod pattern;
#[cfg(any(test, feature = "proptest1"))]
mod proptest_helpers;
pub mod solver;
pub mod table;

#[cfg(any(test, feature = "proptest1"))]
pub use proptest_helpers::TableParams;
