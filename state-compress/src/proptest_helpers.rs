// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::table::{DecisionTable, State, TableFormat};
use proptest::prelude::*;
use std::collections::HashSet;

/// Parameters for a random table: `(max fact count, values per position, max rows)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableParams {
    pub max_fact_count: usize,
    pub values_per_position: usize,
    pub max_rows: usize,
}

impl Default for TableParams {
    fn default() -> Self {
        // Small enough for exhaustive checks.
        Self {
            max_fact_count: 3,
            values_per_position: 2,
            max_rows: 5,
        }
    }
}

impl Arbitrary for DecisionTable {
    type Parameters = TableParams;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(params: Self::Parameters) -> Self::Strategy {
        let values: Vec<String> = (0..params.values_per_position.max(1))
            .map(|ix| ((b'a' + (ix % 26) as u8) as char).to_string())
            .collect();
        let actions = prop::sample::select(vec!["go", "stop", "wait", TableFormat::DEFAULT_GOAL_TOKEN]);

        (1..=params.max_fact_count.max(1))
            .prop_flat_map(move |fact_count| {
                let state = prop::collection::vec(prop::sample::select(values.clone()), fact_count);
                prop::collection::vec((state, actions.clone()), 1..=params.max_rows.max(1))
            })
            .prop_map(|rows| {
                // Keep the first action drawn for each state.
                let mut seen = HashSet::new();
                let rows: Vec<(State, &str)> = rows
                    .into_iter()
                    .filter(|(values, _)| seen.insert(values.clone()))
                    .map(|(values, action)| (State::new(values), action))
                    .collect();
                DecisionTable::new(rows, TableFormat::default())
                    .expect("generated rows are distinct, complete and of equal length")
            })
            .boxed()
    }
}
