// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The boundary to the integer-programming backend.

mod backend;

pub use backend::*;

use crate::{
    errors::SolverError,
    ip::{IntegerProgram, VarId},
};

/// Solves integer programs to optimality.
///
/// Implementations must be exact: `Infeasible` is a certificate, never a timeout or a heuristic
/// give-up, since the compression driver relies on it to move on to a larger trial size.
pub trait Solver {
    fn solve(&self, program: &IntegerProgram<'_>) -> Result<SolveOutcome, SolverError>;
}

impl<'s, S: Solver + ?Sized> Solver for &'s S {
    fn solve(&self, program: &IntegerProgram<'_>) -> Result<SolveOutcome, SolverError> {
        (**self).solve(program)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    Optimal(Assignment),
    Infeasible,
}

/// An optimal assignment, with one value per program variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<i64>,
    objective: i64,
}

impl Assignment {
    pub fn new(values: Vec<i64>, objective: i64) -> Self {
        Self { values, objective }
    }

    #[inline]
    pub fn value(&self, var: VarId) -> i64 {
        self.values[var.index()]
    }

    /// Whether a binary variable is assigned 1.
    #[inline]
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) == 1
    }

    #[inline]
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    #[inline]
    pub fn objective(&self) -> i64 {
        self.objective
    }
}
