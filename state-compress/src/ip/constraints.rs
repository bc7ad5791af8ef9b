// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    model::{Constraint, IntegerProgram, LinearExpr, Sense},
    registry::{PatternVariables, VariableRegistry},
};
use crate::table::{DecisionTable, StateId};
use tracing::trace;

/// Non-collision constraints, keyed by (state, partial-state index).
///
/// `size[i] - Σ_{f ∈ s} contains[i][f] >= 1` does not depend on the action being compressed or
/// on the trial size, so each one is built once and shared by every program that needs it.
#[derive(Clone, Debug)]
pub struct NegativeConstraintCache {
    // Indexed by StateId, then by partial-state index.
    by_state: Vec<Vec<Constraint>>,
}

impl NegativeConstraintCache {
    pub fn new(table: &DecisionTable) -> Self {
        Self {
            by_state: vec![Vec::new(); table.state_count()],
        }
    }

    /// Builds the constraints of `state` for indices `0..patterns.len()` that are not cached yet.
    pub fn ensure(&mut self, table: &DecisionTable, state: StateId, patterns: &[PatternVariables]) {
        let cached = &mut self.by_state[state.index()];
        for pattern in patterns.iter().skip(cached.len()) {
            let facts = table.state_facts(state);
            let mut expr = LinearExpr::with_capacity(facts.len() + 1);
            expr.add_term(pattern.size(), 1);
            for &fact in facts {
                expr.add_term(pattern.contains(fact), -1);
            }
            cached.push(Constraint::new(expr, Sense::Ge, 1));
        }
    }

    /// Panics if the constraint was never built.
    #[inline]
    pub fn get(&self, state: StateId, index: usize) -> &Constraint {
        &self.by_state[state.index()][index]
    }

    /// The number of constraints built so far.
    pub fn len(&self) -> usize {
        self.by_state.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assembles the integer program for one action and one trial size.
///
/// Owns the variable registry and the negative-constraint cache, which grow monotonically across
/// every call for the same table.
#[derive(Clone, Debug)]
pub struct ConstraintBuilder {
    registry: VariableRegistry,
    negatives: NegativeConstraintCache,
}

impl ConstraintBuilder {
    pub fn new(table: &DecisionTable) -> Self {
        Self {
            registry: VariableRegistry::new(table),
            negatives: NegativeConstraintCache::new(table),
        }
    }

    #[inline]
    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    #[inline]
    pub fn negatives(&self) -> &NegativeConstraintCache {
        &self.negatives
    }

    /// Builds the program asking whether `k` partial states can cover exactly the states of
    /// `action`, minimizing the total number of specified facts.
    ///
    /// For every index `i < k`:
    /// * `size[i] = Σ_f contains[i][f]`
    /// * for each state `s` of another action: `size[i] - Σ_{f ∈ s} contains[i][f] >= 1`
    /// * for each state `s` of `action` and fact `f ∉ s`: `contains[i][f] + represents[i][s] <= 1`
    ///
    /// and for each state `s` of `action`, `Σ_i represents[i][s] >= 1`.
    pub fn build<'a>(
        &'a mut self,
        table: &DecisionTable,
        action: &str,
        k: usize,
    ) -> IntegerProgram<'a> {
        assert!(k > 0, "trial size must be positive");

        let negative_states: Vec<StateId> = table.states_not_of(action).collect();
        {
            let patterns = self.registry.ensure(k);
            for &state in &negative_states {
                self.negatives.ensure(table, state, patterns);
            }
        }
        trace!(
            cached_negatives = self.negatives.len(),
            "negative constraint cache"
        );

        let this: &'a Self = self;
        let patterns = this.registry.patterns(k);
        let positive_states = table.states_of(action);
        let mut program = IntegerProgram::new(this.registry.variables(k));

        for (i, pattern) in patterns.iter().enumerate() {
            let mut size_def = LinearExpr::with_capacity(table.facts().len() + 1);
            size_def.add_term(pattern.size(), 1);
            for &contains in pattern.contains_all() {
                size_def.add_term(contains, -1);
            }
            program.push(Constraint::new(size_def, Sense::Eq, 0));

            for &state in &negative_states {
                program.push_cached(this.negatives.get(state, i));
            }

            for &state in positive_states {
                let represents = pattern.represents(state);
                for fact in table.facts_absent_from(state) {
                    program.push(Constraint::at_most_one_of(
                        pattern.contains(fact),
                        represents,
                    ));
                }
            }
        }

        for &state in positive_states {
            let coverage = LinearExpr::sum(patterns.iter().map(|pattern| pattern.represents(state)));
            program.push(Constraint::new(coverage, Sense::Ge, 1));
        }

        program.set_objective(LinearExpr::sum(patterns.iter().map(PatternVariables::size)));
        program
    }
}
