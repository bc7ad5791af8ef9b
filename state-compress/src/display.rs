// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Textual emission of a [`Solution`].

use crate::{
    compress::{ActionEntry, Solution},
    table::DecisionTable,
};
use std::fmt;

impl Solution {
    #[inline]
    pub fn display<'a>(&'a self, table: &'a DecisionTable) -> SolutionDisplay<'a> {
        SolutionDisplay::new(self, table)
    }
}

/// Writes one line per pattern (or per passed-through goal state), each ending in its action,
/// followed by an empty line.
///
/// Tokens come from the table's [`TableFormat`](crate::table::TableFormat), so the output can be
/// read back by [`DecisionTable::parse`] when it contains no wildcards.
pub struct SolutionDisplay<'a> {
    solution: &'a Solution,
    table: &'a DecisionTable,
}

impl<'a> SolutionDisplay<'a> {
    pub fn new(solution: &'a Solution, table: &'a DecisionTable) -> Self {
        Self { solution, table }
    }
}

impl<'a> fmt::Display for SolutionDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let format = self.table.format();
        let separator = format.separator.as_str();

        for entry in &self.solution.entries {
            match entry {
                ActionEntry::Compressed(solution) => {
                    for pattern in &solution.patterns {
                        let display = pattern
                            .display(&format.null_fact_token)
                            .with_separator(separator);
                        writeln!(f, "{}{}{}", display, separator, solution.action)?;
                    }
                }
                ActionEntry::Passthrough { action, states } => {
                    for &state in states {
                        let values = self.table.state(state).values().join(separator);
                        writeln!(f, "{}{}{}", values, separator, action)?;
                    }
                }
            }
        }

        writeln!(f)
    }
}
