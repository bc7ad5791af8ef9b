// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use clap::Parser;
use color_eyre::{eyre::WrapErr, Result};
use state_compress::{
    compress::{Compressor, Solution},
    solver::MicrolpSolver,
    table::{DecisionTable, TableFormat},
};
use std::{
    fs,
    io::{self, Read, Write},
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Compress a decision table into a minimal set of partial states per action.
///
/// Each input line holds the fact values of one state followed by its action. Input ends at the
/// first empty line.
#[derive(Debug, Parser)]
#[clap(name = "state-compress", version)]
pub struct StateCompressApp {
    /// Input table [default: standard input]
    input: Option<Utf8PathBuf>,

    /// Token separating facts and the action
    #[clap(long, default_value = TableFormat::DEFAULT_SEPARATOR)]
    separator_token: String,

    /// Token rendering a wildcard position in the output
    #[clap(long, default_value = TableFormat::DEFAULT_NULL_FACT_TOKEN)]
    null_fact_token: String,

    /// Action that is passed through without compression
    #[clap(long, default_value = TableFormat::DEFAULT_GOAL_TOKEN)]
    goal_token: String,

    /// Write every trial's integer program to this directory, in LP format
    #[clap(long)]
    dump_lp: Option<Utf8PathBuf>,

    /// Print per-action statistics to standard error
    #[clap(long)]
    stats: bool,

    /// Log more (repeat for debug and trace output)
    #[clap(short, long, parse(from_occurrences))]
    verbose: u8,
}

impl StateCompressApp {
    pub fn exec(self) -> Result<()> {
        self.init_logging()?;
        let input = self.read_input()?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        let solution = self.run(&input, &mut out)?;

        if self.stats {
            let stderr = io::stderr();
            let mut err = stderr.lock();
            write_stats(&solution, &mut err)?;
        }
        Ok(())
    }

    pub fn format(&self) -> TableFormat {
        TableFormat {
            separator: self.separator_token.clone(),
            null_fact_token: self.null_fact_token.clone(),
            goal_token: self.goal_token.clone(),
        }
    }

    /// Compresses `input` and writes the solution to `out`.
    pub fn run(&self, input: &str, out: &mut impl Write) -> Result<Solution> {
        let table =
            DecisionTable::parse(input, self.format()).wrap_err("failed to read the input table")?;

        let mut compressor = Compressor::new(&table, MicrolpSolver);
        if let Some(dir) = &self.dump_lp {
            fs::create_dir_all(dir)
                .wrap_err_with(|| format!("failed to create LP dump directory `{}`", dir))?;
            compressor = compressor.with_lp_dump_dir(dir.clone());
        }
        let solution = compressor.compress()?;

        write!(out, "{}", solution.display(&table))?;
        out.flush()?;
        Ok(solution)
    }

    fn read_input(&self) -> Result<String> {
        match &self.input {
            Some(path) if path.as_str() != "-" => fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read input from `{}`", path)),
            _ => {
                let mut input = String::new();
                io::stdin()
                    .read_to_string(&mut input)
                    .wrap_err("failed to read standard input")?;
                Ok(input)
            }
        }
    }

    fn init_logging(&self) -> Result<()> {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).wrap_err("failed to install logger")
    }
}

/// Writes one line per compressed action: states, patterns, facts and trials.
pub fn write_stats(solution: &Solution, out: &mut impl Write) -> io::Result<()> {
    for entry in solution.compressed() {
        writeln!(
            out,
            "{}: {} states -> {} patterns, {} facts ({} trials)",
            entry.action,
            entry.state_count,
            entry.pattern_count(),
            entry.fact_count(),
            entry.trials,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(args: &[&str]) -> StateCompressApp {
        StateCompressApp::try_parse_from(std::iter::once("state-compress").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let app = app(&[]);
        assert_eq!(app.format(), TableFormat::default());
        assert!(app.input.is_none());
        assert_eq!(app.verbose, 0);
    }

    #[test]
    fn test_options() {
        let app = app(&[
            "--separator-token",
            ",",
            "--null-fact-token",
            "*",
            "--goal-token",
            "done",
            "-vv",
            "--stats",
            "table.txt",
        ]);
        assert_eq!(app.format().separator, ",");
        assert_eq!(app.format().null_fact_token, "*");
        assert_eq!(app.format().goal_token, "done");
        assert_eq!(app.verbose, 2);
        assert!(app.stats);
        assert_eq!(app.input.as_deref().map(|p| p.as_str()), Some("table.txt"));
    }

    #[test]
    fn test_run() {
        let app = app(&["--separator-token", ",", "--goal-token", "done"]);
        let mut out = Vec::new();
        let solution = app
            .run("a,x,go\na,y,stop\nb,x,stop\nb,y,done\n", &mut out)
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        // The goal row, one pattern for go, two for stop, then the end marker.
        assert_eq!(lines[0], "b,y,done");
        assert_eq!(lines[1], "a,x,go");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "");

        let mut stats = Vec::new();
        write_stats(&solution, &mut stats).unwrap();
        assert_eq!(
            String::from_utf8(stats).unwrap(),
            "go: 1 states -> 1 patterns, 2 facts (1 trials)\n\
             stop: 2 states -> 2 patterns, 4 facts (2 trials)\n"
        );
    }

    #[test]
    fn test_run_rejects_bad_input() {
        let app = app(&[]);
        let mut out = Vec::new();
        let err = app.run("a x go\na x stop\n", &mut out).unwrap_err();
        assert!(format!("{:?}", err).contains("line 2"));
        assert!(out.is_empty());
    }
}
