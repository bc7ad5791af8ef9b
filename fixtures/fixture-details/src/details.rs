// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::{
    eyre::{bail, WrapErr},
    Result,
};
use state_compress::{
    compress::{Compressor, Solution},
    solver::MicrolpSolver,
    table::{DecisionTable, TableFormat},
};
use std::{fmt::Write, fs};

/// One fixture: an input table on disk.
#[derive(Clone, Debug)]
pub struct FixtureDetails {
    path: Utf8PathBuf,
    table: DecisionTable,
}

impl FixtureDetails {
    pub fn load(path: impl Into<Utf8PathBuf>) -> Result<Self> {
        let path = path.into();
        let input =
            fs::read_to_string(&path).wrap_err_with(|| format!("failed to read `{}`", path))?;
        let table = DecisionTable::parse(&input, TableFormat::default())
            .wrap_err_with(|| format!("failed to parse `{}`", path))?;
        Ok(Self { path, table })
    }

    #[inline]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    #[inline]
    pub fn table(&self) -> &DecisionTable {
        &self.table
    }

    /// The path the expected output is stored at.
    pub fn output_path(&self) -> Utf8PathBuf {
        self.path.with_extension("out")
    }

    /// Compresses the table and checks that every action's patterns match exactly its states.
    pub fn compress_and_check(&self) -> Result<Solution> {
        let solution = Compressor::new(&self.table, MicrolpSolver)
            .compress()
            .wrap_err_with(|| format!("failed to compress `{}`", self.path))?;
        check_solution(&self.table, &solution)?;
        Ok(solution)
    }
}

/// Checks that each compressed action matches all of its own states and none of the others.
pub fn check_solution(table: &DecisionTable, solution: &Solution) -> Result<()> {
    for entry in solution.compressed() {
        for (state, action) in table.rows() {
            let matched = entry.patterns.iter().any(|p| p.matches(state));
            if action == entry.action && !matched {
                bail!("state {:?} of `{}` is not covered", state.values(), action);
            }
            if action != entry.action && matched {
                bail!(
                    "state {:?} of `{}` is wrongly matched by `{}`",
                    state.values(),
                    action,
                    entry.action
                );
            }
        }
    }
    Ok(())
}

/// Renders a table in the default input format.
pub fn render_table(table: &DecisionTable) -> String {
    let separator = table.format().separator.as_str();
    let mut out = String::new();
    for (state, action) in table.rows() {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{}{}{}",
            state.values().join(separator),
            separator,
            action
        );
    }
    out
}
