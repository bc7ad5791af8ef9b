// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for parsing, solving and compression.

use camino::Utf8PathBuf;
use thiserror::Error;

/// The input table is malformed. Line numbers are 1-based.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("the separator token must not be empty")]
    EmptySeparator,

    #[error("line {line}: a row needs at least one fact before the action")]
    MissingFacts { line: usize },

    #[error("line {line}: expected {expected} facts (as on line 1), found {actual}")]
    InconsistentFactCount {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: the same state is already mapped to an action on line {first_line}")]
    DuplicateState { line: usize, first_line: usize },

    #[error("line {line}, position {position}: partial states are not supported in the input")]
    WildcardInInput { line: usize, position: usize },
}

/// The solver backend returned something other than an optimum or a certified infeasibility.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SolverError {
    #[error("integer program is unbounded")]
    Unbounded,

    #[error("solver backend failed: {0}")]
    Backend(String),
}

/// Errors raised while compressing one or more actions.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error("action `{0}` has no states in the table")]
    UnknownAction(String),

    #[error("solving action `{action}` with {k} partial states failed")]
    Solver {
        action: String,
        k: usize,
        #[source]
        source: SolverError,
    },

    /// Covering every state with its own fully specified partial state is always feasible, so
    /// this indicates a defect in the encoding rather than an infeasible table.
    #[error(
        "internal error: action `{action}` is infeasible even with {bound} partial states, \
         one per state (this is a bug)"
    )]
    SearchExhausted { action: String, bound: usize },

    #[error(
        "solver returned {actual} values for action `{action}` with {k} partial states, \
         expected {expected}"
    )]
    AssignmentLength {
        action: String,
        k: usize,
        expected: usize,
        actual: usize,
    },

    #[error(
        "solver assigned two values to position {position} of partial state {index} \
         for action `{action}` with {k} partial states"
    )]
    ConflictingFacts {
        action: String,
        k: usize,
        index: usize,
        position: usize,
    },

    #[error("failed to write integer program to `{path}`")]
    LpDump {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
