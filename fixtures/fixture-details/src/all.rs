// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{render_table, FixtureDetails, ValueGenerator};
use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::{eyre::WrapErr, Result};
use once_cell::sync::Lazy;
use proptest::prelude::*;
use state_compress::{natural, table::DecisionTable, TableParams};
use std::fs;

/// Fixture tables are larger than the ones used in unit tests, but still solve quickly.
pub const FIXTURE_PARAMS: TableParams = TableParams {
    max_fact_count: 4,
    values_per_position: 3,
    max_rows: 12,
};

pub struct AllFixtures {
    dir: Utf8PathBuf,
}

static ALL_FIXTURES_STATIC: Lazy<AllFixtures> = Lazy::new(AllFixtures::init);

impl AllFixtures {
    pub fn get() -> &'static Self {
        &*ALL_FIXTURES_STATIC
    }

    fn init() -> Self {
        let dir: Utf8PathBuf = env!("CARGO_MANIFEST_DIR").into();
        let dir = dir
            .parent()
            .expect("fixture-details lives inside the fixtures directory")
            .join("data");
        Self { dir }
    }

    #[inline]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Generates `count` random tables, deterministically, as `table-{ix}.txt`.
    pub fn generate_inputs(&self, count: usize) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .wrap_err_with(|| format!("failed to create `{}`", self.dir))?;

        let mut value_gen = ValueGenerator::from_seed("state-compress-tables");
        for ix in 0..count {
            let mut gen = value_gen.partial_clone();
            let table = gen.generate(DecisionTable::arbitrary_with(FIXTURE_PARAMS));
            let path = self.dir.join(format!("table-{}.txt", ix));
            fs::write(&path, render_table(&table))
                .wrap_err_with(|| format!("failed to write `{}`", path))?;
        }

        println!("generated {} inputs in {}", count, self.dir);
        Ok(())
    }

    /// Compresses every input and writes the solution next to it.
    pub fn generate_outputs(&self) -> Result<()> {
        let fixtures = self.load_all()?;
        for fixture in &fixtures {
            let solution = fixture.compress_and_check()?;
            let output_path = fixture.output_path();
            fs::write(
                &output_path,
                solution.display(fixture.table()).to_string(),
            )
            .wrap_err_with(|| format!("failed to write `{}`", output_path))?;
        }

        println!("generated {} outputs in {}", fixtures.len(), self.dir);
        Ok(())
    }

    /// Loads every `*.txt` input in natural order.
    pub fn load_all(&self) -> Result<Vec<FixtureDetails>> {
        let mut paths = Vec::new();
        for entry in self
            .dir
            .read_dir_utf8()
            .wrap_err_with(|| format!("failed to read `{}`", self.dir))?
        {
            let entry = entry?;
            if entry.path().extension() == Some("txt") {
                paths.push(entry.path().to_owned());
            }
        }
        paths.sort_by(|a, b| natural::compare(a.as_str(), b.as_str()));
        paths.into_iter().map(FixtureDetails::load).collect()
    }
}
