// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The decision table: complete states, each mapped to one action.

use crate::{errors::TableError, natural};
use bitvec::prelude::*;
use itertools::Itertools;
use once_cell::sync::OnceCell;
use std::{collections::HashMap, fmt};

/// A `(position, value)` pair. Facts order by position, then by value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fact {
    pub position: usize,
    pub value: String,
}

impl Fact {
    #[inline]
    pub fn new(position: usize, value: impl Into<String>) -> Self {
        Self {
            position,
            value: value.into(),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.position, self.value)
    }
}

/// Index of a fact in [`DecisionTable::facts`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(pub(crate) usize);

impl FactId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a state in [`DecisionTable::states`], i.e. its row in the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A complete state: one value per position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
    values: Vec<String>,
}

impl State {
    pub fn new<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn fact_count(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[inline]
    pub fn value(&self, position: usize) -> Option<&str> {
        self.values.get(position).map(String::as_str)
    }

    pub fn facts(&self) -> impl Iterator<Item = Fact> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(position, value)| Fact::new(position, value.as_str()))
    }

    #[inline]
    pub fn contains(&self, fact: &Fact) -> bool {
        self.value(fact.position) == Some(fact.value.as_str())
    }
}

/// Tokens used to read and write tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableFormat {
    pub separator: String,
    pub null_fact_token: String,
    pub goal_token: String,
}

impl TableFormat {
    pub const DEFAULT_SEPARATOR: &'static str = " ";
    pub const DEFAULT_NULL_FACT_TOKEN: &'static str = "-";
    pub const DEFAULT_GOAL_TOKEN: &'static str = "GOAL";

    #[inline]
    pub fn is_null_fact(&self, value: &str) -> bool {
        value == self.null_fact_token
    }
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            separator: Self::DEFAULT_SEPARATOR.to_owned(),
            null_fact_token: Self::DEFAULT_NULL_FACT_TOKEN.to_owned(),
            goal_token: Self::DEFAULT_GOAL_TOKEN.to_owned(),
        }
    }
}

/// A validated mapping from complete states to actions.
///
/// States keep their input order and are identified by [`StateId`]. Every fact that occurs in any
/// state gets a [`FactId`], assigned in fact order.
#[derive(Clone, Debug)]
pub struct DecisionTable {
    format: TableFormat,
    fact_count: usize,
    states: Vec<State>,
    actions: Vec<String>,
    facts: Vec<Fact>,
    // FactIds of each state, indexed by position.
    state_facts: Vec<Vec<FactId>>,
    // Membership of every FactId in each state.
    state_masks: Vec<BitVec>,
    action_states: HashMap<String, Vec<StateId>>,
    sorted_actions: OnceCell<Vec<String>>,
}

impl DecisionTable {
    /// Builds a table out of `(state, action)` rows, validating them in order.
    ///
    /// Errors refer to rows by 1-based line number.
    pub fn new<A: Into<String>>(
        rows: impl IntoIterator<Item = (State, A)>,
        format: TableFormat,
    ) -> Result<Self, TableError> {
        let mut states = Vec::new();
        let mut actions = Vec::new();
        let mut first_lines: HashMap<State, usize> = HashMap::new();
        let mut fact_count = None;

        for (row_ix, (state, action)) in rows.into_iter().enumerate() {
            let line = row_ix + 1;
            if state.fact_count() == 0 {
                return Err(TableError::MissingFacts { line });
            }
            let expected = *fact_count.get_or_insert(state.fact_count());
            if state.fact_count() != expected {
                return Err(TableError::InconsistentFactCount {
                    line,
                    expected,
                    actual: state.fact_count(),
                });
            }
            if let Some(position) = state.values().iter().position(|v| format.is_null_fact(v)) {
                return Err(TableError::WildcardInInput { line, position });
            }
            if let Some(&first_line) = first_lines.get(&state) {
                return Err(TableError::DuplicateState { line, first_line });
            }
            first_lines.insert(state.clone(), line);
            states.push(state);
            actions.push(action.into());
        }

        Ok(Self::index(format, fact_count.unwrap_or(0), states, actions))
    }

    /// Parses a table: one row per line, fact values followed by the action, all separated by
    /// `format.separator`. Reading stops at the first empty line.
    pub fn parse(input: &str, format: TableFormat) -> Result<Self, TableError> {
        if format.separator.is_empty() {
            return Err(TableError::EmptySeparator);
        }
        let rows: Vec<(State, String)> = input
            .lines()
            .take_while(|line| !line.is_empty())
            .map(|line| {
                let mut tokens: Vec<&str> = line.split(format.separator.as_str()).collect();
                // `split` always yields at least one token.
                let action = tokens.pop().unwrap_or_default().to_owned();
                (State::new(tokens), action)
            })
            .collect();
        Self::new(rows, format)
    }

    fn index(
        format: TableFormat,
        fact_count: usize,
        states: Vec<State>,
        actions: Vec<String>,
    ) -> Self {
        let facts: Vec<Fact> = states
            .iter()
            .flat_map(|state| state.facts())
            .sorted()
            .dedup()
            .collect();
        let fact_ids: HashMap<&Fact, FactId> = facts
            .iter()
            .enumerate()
            .map(|(ix, fact)| (fact, FactId(ix)))
            .collect();

        let mut state_facts = Vec::with_capacity(states.len());
        let mut state_masks = Vec::with_capacity(states.len());
        for state in &states {
            let ids: Vec<FactId> = state.facts().map(|fact| fact_ids[&fact]).collect();
            let mut mask = bitvec![0; facts.len()];
            for id in &ids {
                mask.set(id.0, true);
            }
            state_facts.push(ids);
            state_masks.push(mask);
        }

        let mut action_states: HashMap<String, Vec<StateId>> = HashMap::new();
        for (state_ix, action) in actions.iter().enumerate() {
            action_states
                .entry(action.clone())
                .or_default()
                .push(StateId(state_ix));
        }

        Self {
            format,
            fact_count,
            states,
            actions,
            facts,
            state_facts,
            state_masks,
            action_states,
            sorted_actions: OnceCell::new(),
        }
    }

    #[inline]
    pub fn format(&self) -> &TableFormat {
        &self.format
    }

    /// The number of facts n in every state.
    #[inline]
    pub fn fact_count(&self) -> usize {
        self.fact_count
    }

    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn states(&self) -> &[State] {
        &self.states
    }

    #[inline]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn state_ids(&self) -> impl Iterator<Item = StateId> + ExactSizeIterator {
        (0..self.states.len()).map(StateId)
    }

    #[inline]
    pub fn action_of(&self, id: StateId) -> &str {
        &self.actions[id.0]
    }

    /// All facts seen anywhere in the table, in fact order.
    #[inline]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    #[inline]
    pub fn fact(&self, id: FactId) -> &Fact {
        &self.facts[id.0]
    }

    pub fn fact_ids(&self) -> impl Iterator<Item = FactId> + ExactSizeIterator {
        (0..self.facts.len()).map(FactId)
    }

    /// The facts of a state, indexed by position.
    #[inline]
    pub fn state_facts(&self, id: StateId) -> &[FactId] {
        &self.state_facts[id.0]
    }

    /// The facts that a state does *not* have.
    pub fn facts_absent_from(&self, id: StateId) -> impl Iterator<Item = FactId> + '_ {
        self.state_masks[id.0].iter_zeros().map(FactId)
    }

    #[inline]
    pub fn state_has_fact(&self, state: StateId, fact: FactId) -> bool {
        self.state_masks[state.0][fact.0]
    }

    /// The states mapped to `action`, in input order. Empty if the action does not occur.
    pub fn states_of(&self, action: &str) -> &[StateId] {
        self.action_states
            .get(action)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The states mapped to any action other than `action`, in input order.
    pub fn states_not_of<'a>(&'a self, action: &'a str) -> impl Iterator<Item = StateId> + 'a {
        self.state_ids().filter(move |&id| self.action_of(id) != action)
    }

    /// Distinct actions in natural order.
    pub fn actions(&self) -> &[String] {
        self.sorted_actions.get_or_init(|| {
            let mut actions: Vec<String> = self.action_states.keys().cloned().collect();
            natural::sort(&mut actions);
            actions
        })
    }

    #[inline]
    pub fn is_goal(&self, action: &str) -> bool {
        action == self.format.goal_token
    }

    /// The rows of the table in input order.
    pub fn rows(&self) -> impl Iterator<Item = (&State, &str)> + '_ {
        self.states
            .iter()
            .zip(&self.actions)
            .map(|(state, action)| (state, action.as_str()))
    }
}
