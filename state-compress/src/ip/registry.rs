// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::model::{VarDef, VarId, VarKind};
use crate::table::{DecisionTable, FactId, StateId};
use tracing::trace;

/// The decision variables of one partial-state index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternVariables {
    contains: Vec<VarId>,
    represents: Vec<VarId>,
    size: VarId,
}

impl PatternVariables {
    /// Binary: whether this partial state specifies `fact`.
    #[inline]
    pub fn contains(&self, fact: FactId) -> VarId {
        self.contains[fact.index()]
    }

    /// `contains` for every fact, in fact order.
    #[inline]
    pub fn contains_all(&self) -> &[VarId] {
        &self.contains
    }

    /// Binary: whether this partial state is responsible for covering `state`.
    #[inline]
    pub fn represents(&self, state: StateId) -> VarId {
        self.represents[state.index()]
    }

    /// Integer in `[0, n]`: the number of facts this partial state specifies.
    #[inline]
    pub fn size(&self) -> VarId {
        self.size
    }
}

/// Allocates decision variables for partial-state indices on demand.
///
/// The pool only grows: asking for `k` indices allocates the ones beyond those already present,
/// so variables (and constraints referring to them) from smaller trials stay valid. The variables
/// of index `i` are contiguous and follow those of index `i - 1`.
#[derive(Clone, Debug)]
pub struct VariableRegistry {
    fact_count: usize,
    distinct_facts: usize,
    state_count: usize,
    variables: Vec<VarDef>,
    patterns: Vec<PatternVariables>,
}

impl VariableRegistry {
    pub fn new(table: &DecisionTable) -> Self {
        Self {
            fact_count: table.fact_count(),
            distinct_facts: table.facts().len(),
            state_count: table.state_count(),
            variables: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Makes sure indices `0..k` have variables, and returns them.
    pub fn ensure(&mut self, k: usize) -> &[PatternVariables] {
        for i in self.patterns.len()..k {
            let contains = (0..self.distinct_facts)
                .map(|fact_ix| self.push(format!("contains_{}_f{}", i, fact_ix), VarKind::Binary))
                .collect();
            let represents = (0..self.state_count)
                .map(|state_ix| {
                    self.push(format!("represents_{}_s{}", i, state_ix), VarKind::Binary)
                })
                .collect();
            let size = self.push(
                format!("size_{}", i),
                VarKind::Integer {
                    min: 0,
                    max: self.fact_count as i64,
                },
            );
            self.patterns.push(PatternVariables {
                contains,
                represents,
                size,
            });
            trace!(index = i, total = self.variables.len(), "allocated variables");
        }
        &self.patterns[..k]
    }

    /// The number of indices allocated so far.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.patterns.len()
    }

    /// The variables of allocated indices `0..k`.
    ///
    /// Panics if fewer than `k` indices have been allocated.
    #[inline]
    pub fn patterns(&self, k: usize) -> &[PatternVariables] {
        &self.patterns[..k]
    }

    /// The definitions of every variable belonging to indices `0..k`.
    ///
    /// Panics if fewer than `k` indices have been allocated.
    pub fn variables(&self, k: usize) -> &[VarDef] {
        assert!(
            k <= self.patterns.len(),
            "requested variables for {} indices, only {} allocated",
            k,
            self.patterns.len()
        );
        &self.variables[..k * self.per_index()]
    }

    #[inline]
    fn per_index(&self) -> usize {
        self.distinct_facts + self.state_count + 1
    }

    fn push(&mut self, name: String, kind: VarKind) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VarDef { name, kind });
        id
    }
}
