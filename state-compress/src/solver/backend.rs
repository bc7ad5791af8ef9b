// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Assignment, SolveOutcome, Solver};
use crate::{
    errors::SolverError,
    ip::{IntegerProgram, LinearExpr, Sense, VarKind},
};
use good_lp::{
    constraint, solvers::microlp::microlp, variable, Expression, ProblemVariables,
    ResolutionError, Solution, SolverModel, Variable,
};
use tracing::trace;

/// Solves programs with `good_lp` on top of the pure-Rust `microlp` branch-and-bound solver.
#[derive(Clone, Copy, Debug, Default)]
pub struct MicrolpSolver;

impl MicrolpSolver {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Solver for MicrolpSolver {
    fn solve(&self, program: &IntegerProgram<'_>) -> Result<SolveOutcome, SolverError> {
        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> = program
            .variables()
            .iter()
            .map(|def| {
                let definition = match def.kind {
                    VarKind::Binary => variable().binary(),
                    VarKind::Integer { min, max } => {
                        variable().integer().min(min as f64).max(max as f64)
                    }
                };
                problem.add(definition.name(def.name.as_str()))
            })
            .collect();

        let mut model = problem
            .minimise(to_expression(program.objective(), &vars))
            .using(microlp);
        for c in program.constraints() {
            let rhs = c.rhs() as f64;
            // `>=` is passed on as `-lhs <= -rhs`.
            model.add_constraint(match c.sense() {
                Sense::Le => constraint::leq(to_scaled_expression(c.expr(), 1.0, &vars), rhs),
                Sense::Ge => constraint::leq(to_scaled_expression(c.expr(), -1.0, &vars), -rhs),
                Sense::Eq => constraint::eq(to_expression(c.expr(), &vars), rhs),
            });
        }

        match model.solve() {
            Ok(solution) => {
                let values: Vec<i64> = vars
                    .iter()
                    .map(|&var| solution.value(var).round() as i64)
                    .collect();
                let objective = program.objective().evaluate(&values);
                trace!(objective, "microlp found an optimum");
                Ok(SolveOutcome::Optimal(Assignment::new(values, objective)))
            }
            Err(ResolutionError::Infeasible) => Ok(SolveOutcome::Infeasible),
            Err(ResolutionError::Unbounded) => Err(SolverError::Unbounded),
            Err(other) => Err(SolverError::Backend(other.to_string())),
        }
    }
}

#[inline]
fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    to_scaled_expression(expr, 1.0, vars)
}

fn to_scaled_expression(expr: &LinearExpr, scale: f64, vars: &[Variable]) -> Expression {
    let mut expression = Expression::with_capacity(expr.terms().len());
    for &(var, coefficient) in expr.terms() {
        expression.add_mul(scale * coefficient as f64, vars[var.index()]);
    }
    expression
}
