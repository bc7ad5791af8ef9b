// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-action search for the smallest set of partial states.

use crate::{
    errors::CompressError,
    ip::{ConstraintBuilder, IntegerProgram},
    pattern::PartialState,
    solver::{Assignment, SolveOutcome, Solver},
    table::{DecisionTable, Fact, StateId},
};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::{debug, info};

/// One step of the search for a single action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trial {
    /// Solving with `k` partial states.
    Trying(usize),
    /// `k` partial states are not enough.
    Infeasible(usize),
    /// `k` is the smallest feasible size.
    Feasible(usize, Assignment),
}

/// The compressed form of one action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionSolution {
    pub action: String,
    /// The number of states mapped to the action.
    pub state_count: usize,
    pub patterns: Vec<PartialState>,
    /// The number of trial sizes that were solved, including the feasible one.
    pub trials: usize,
}

impl ActionSolution {
    #[inline]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// The total number of specified facts over all patterns.
    pub fn fact_count(&self) -> usize {
        self.patterns.iter().map(PartialState::size).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionEntry {
    Compressed(ActionSolution),
    /// The goal action, whose states are reported unchanged.
    Passthrough { action: String, states: Vec<StateId> },
}

impl ActionEntry {
    pub fn action(&self) -> &str {
        match self {
            Self::Compressed(solution) => &solution.action,
            Self::Passthrough { action, .. } => action,
        }
    }
}

/// Every action of a table, in natural order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Solution {
    pub entries: Vec<ActionEntry>,
}

impl Solution {
    pub fn compressed(&self) -> impl Iterator<Item = &ActionSolution> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            ActionEntry::Compressed(solution) => Some(solution),
            ActionEntry::Passthrough { .. } => None,
        })
    }

    pub fn get(&self, action: &str) -> Option<&ActionEntry> {
        self.entries.iter().find(|entry| entry.action() == action)
    }
}

/// Compresses the actions of one table.
///
/// Variables and non-collision constraints are cached across every action and trial size of
/// the table, so compressing several actions with one `Compressor` reuses them.
pub struct Compressor<'t, S> {
    table: &'t DecisionTable,
    solver: S,
    builder: ConstraintBuilder,
    lp_dump_dir: Option<Utf8PathBuf>,
}

impl<'t, S: Solver> Compressor<'t, S> {
    pub fn new(table: &'t DecisionTable, solver: S) -> Self {
        Self {
            table,
            solver,
            builder: ConstraintBuilder::new(table),
            lp_dump_dir: None,
        }
    }

    /// Writes every trial's program to `dir/{action}_{k}.lp`, with characters other than ASCII
    /// alphanumerics, `-` and `_` in the action replaced by `_`.
    pub fn with_lp_dump_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.lp_dump_dir = Some(dir.into());
        self
    }

    #[inline]
    pub fn builder(&self) -> &ConstraintBuilder {
        &self.builder
    }

    /// Compresses every non-goal action and passes the goal action through.
    pub fn compress(&mut self) -> Result<Solution, CompressError> {
        let table = self.table;
        let mut entries = Vec::with_capacity(table.actions().len());
        for action in table.actions() {
            if table.is_goal(action) {
                debug!(action = %action, "passing goal action through");
                entries.push(ActionEntry::Passthrough {
                    action: action.clone(),
                    states: table.states_of(action).to_vec(),
                });
            } else {
                entries.push(ActionEntry::Compressed(self.compress_action(action)?));
            }
        }
        Ok(Solution { entries })
    }

    /// Finds the smallest k such that k partial states cover exactly the states of `action`,
    /// with as few specified facts as possible for that k.
    ///
    /// k never exceeds the number of states mapped to the action: one fully specified partial
    /// state per state is always feasible.
    pub fn compress_action(&mut self, action: &str) -> Result<ActionSolution, CompressError> {
        let table = self.table;
        let bound = table.states_of(action).len();
        if bound == 0 {
            return Err(CompressError::UnknownAction(action.to_owned()));
        }
        info!(action = %action, states = bound, "compressing action");

        let mut trials = 0;
        let mut trial = Trial::Trying(1);
        loop {
            trial = match trial {
                Trial::Trying(k) => {
                    trials += 1;
                    match self.solve_trial(action, k)? {
                        SolveOutcome::Optimal(assignment) => Trial::Feasible(k, assignment),
                        SolveOutcome::Infeasible => Trial::Infeasible(k),
                    }
                }
                Trial::Infeasible(k) if k >= bound => {
                    return Err(CompressError::SearchExhausted {
                        action: action.to_owned(),
                        bound,
                    });
                }
                Trial::Infeasible(k) => Trial::Trying(k + 1),
                Trial::Feasible(k, assignment) => {
                    let patterns = self.extract(action, k, &assignment)?;
                    let solution = ActionSolution {
                        action: action.to_owned(),
                        state_count: bound,
                        patterns,
                        trials,
                    };
                    info!(
                        action = %action,
                        patterns = solution.pattern_count(),
                        facts = solution.fact_count(),
                        "compressed action"
                    );
                    return Ok(solution);
                }
            };
        }
    }

    fn solve_trial(&mut self, action: &str, k: usize) -> Result<SolveOutcome, CompressError> {
        let program = self.builder.build(self.table, action, k);
        debug!(
            action = %action,
            k,
            variables = program.variables().len(),
            constraints = program.constraint_count(),
            cached = program.cached_constraint_count(),
            "solving trial"
        );
        if let Some(dir) = &self.lp_dump_dir {
            dump_program(dir, action, k, &program)?;
        }

        let outcome = self
            .solver
            .solve(&program)
            .map_err(|source| CompressError::Solver {
                action: action.to_owned(),
                k,
                source,
            })?;
        match &outcome {
            SolveOutcome::Optimal(assignment) => {
                debug!(action = %action, k, objective = assignment.objective(), "feasible")
            }
            SolveOutcome::Infeasible => debug!(action = %action, k, "infeasible"),
        }
        Ok(outcome)
    }

    /// Reads partial states `0..k` out of a feasible assignment.
    fn extract(
        &self,
        action: &str,
        k: usize,
        assignment: &Assignment,
    ) -> Result<Vec<PartialState>, CompressError> {
        let table = self.table;
        let registry = self.builder.registry();
        let expected = registry.variables(k).len();
        if assignment.values().len() != expected {
            return Err(CompressError::AssignmentLength {
                action: action.to_owned(),
                k,
                expected,
                actual: assignment.values().len(),
            });
        }

        let mut patterns = Vec::with_capacity(k);
        for (index, pattern) in registry.patterns(k).iter().enumerate() {
            let facts: Vec<Fact> = table
                .fact_ids()
                .filter(|&fact| assignment.is_set(pattern.contains(fact)))
                .map(|fact| table.fact(fact).clone())
                .collect();
            // Facts are in fact order, so two values at one position are adjacent.
            if let Some(pair) = facts.windows(2).find(|w| w[0].position == w[1].position) {
                return Err(CompressError::ConflictingFacts {
                    action: action.to_owned(),
                    k,
                    index,
                    position: pair[0].position,
                });
            }
            patterns.push(PartialState::new(index, table.fact_count(), facts));
        }
        Ok(patterns)
    }
}

/// Action labels are free text, so anything outside `[A-Za-z0-9_-]` is replaced in file names.
fn dump_file_name(action: &str, k: usize) -> String {
    let label: String = action
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}.lp", label, k)
}

fn dump_program(
    dir: &Utf8Path,
    action: &str,
    k: usize,
    program: &IntegerProgram<'_>,
) -> Result<(), CompressError> {
    let path = dir.join(dump_file_name(action, k));
    fs::write(&path, program.lp_display().to_string())
        .map_err(|source| CompressError::LpDump { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::SolverError,
        solver::MicrolpSolver,
        table::{State, TableFormat},
    };
    use itertools::Itertools;
    use proptest::prelude::*;
    use std::cell::Cell;

    fn parse(input: &str) -> DecisionTable {
        DecisionTable::parse(input, TableFormat::default()).unwrap()
    }

    fn compress(table: &DecisionTable) -> Solution {
        Compressor::new(table, MicrolpSolver).compress().unwrap()
    }

    fn check_sound_and_complete(table: &DecisionTable, solution: &ActionSolution) {
        for (state, action) in table.rows() {
            let matched = solution.patterns.iter().any(|p| p.matches(state));
            if action == solution.action {
                assert!(matched, "state {:?} of {} is covered", state, action);
            } else {
                assert!(
                    !matched,
                    "state {:?} of {} is not matched by {}",
                    state, action, solution.action
                );
            }
        }
    }

    /// Exhaustively finds the smallest (pattern count, fact count) for `action`.
    fn brute_force_optimum(table: &DecisionTable, action: &str) -> (usize, usize) {
        let positives: Vec<&State> = table
            .states_of(action)
            .iter()
            .map(|&id| table.state(id))
            .collect();
        let negatives: Vec<&State> = table.states_not_of(action).map(|id| table.state(id)).collect();

        // Useful patterns generalize at least one positive state and match no negative state.
        let candidates: Vec<PartialState> = positives
            .iter()
            .flat_map(|state| {
                state
                    .facts()
                    .powerset()
                    .map(|facts| PartialState::new(0, table.fact_count(), facts))
            })
            .unique()
            .filter(|p| negatives.iter().all(|s| !p.matches(s)))
            .collect();

        for k in 1..=positives.len() {
            let best = candidates
                .iter()
                .combinations(k)
                .filter(|set| positives.iter().all(|s| set.iter().any(|p| p.matches(s))))
                .map(|set| set.iter().map(|p| p.size()).sum::<usize>())
                .min();
            if let Some(facts) = best {
                return (k, facts);
            }
        }
        unreachable!("one fully specified pattern per state is always sound")
    }

    #[test]
    fn test_go_stop_scenario() {
        let table = parse("a x go\na y stop\nb x stop\n");
        let solution = compress(&table);

        let go = solution.compressed().find(|s| s.action == "go").unwrap();
        assert_eq!(go.pattern_count(), 1);
        assert_eq!(go.fact_count(), 2, "no generalization of `a x` is sound");
        assert_eq!(
            go.patterns[0].display("-").to_string(),
            "a x",
            "both facts specified"
        );

        let stop = solution.compressed().find(|s| s.action == "stop").unwrap();
        // `- x` would match `a x`, and no single pattern covers `a y` and `b x`.
        assert_eq!(stop.pattern_count(), 2);
        assert_eq!(stop.fact_count(), 2);
        let mut rendered: Vec<String> = stop
            .patterns
            .iter()
            .map(|p| p.display("-").to_string())
            .collect();
        rendered.sort();
        assert_eq!(rendered, ["- y", "b -"]);

        check_sound_and_complete(&table, go);
        check_sound_and_complete(&table, stop);
    }

    #[test]
    fn test_generalizes_when_sound() {
        let table = parse("a x go\na y go\nb x stop\nb y stop\n");
        let solution = compress(&table);
        for action in ["go", "stop"] {
            let entry = solution.compressed().find(|s| s.action == action).unwrap();
            assert_eq!(entry.pattern_count(), 1, "{} needs one pattern", action);
            assert_eq!(entry.fact_count(), 1, "{} only depends on position 0", action);
            assert_eq!(entry.trials, 1);
            check_sound_and_complete(&table, entry);
        }
    }

    #[test]
    fn test_single_action_is_all_wildcards() {
        let table = parse("a x go\nb y go\n");
        let solution = compress(&table);
        let go = solution.compressed().next().unwrap();
        assert_eq!(go.pattern_count(), 1);
        assert_eq!(go.fact_count(), 0);
        assert_eq!(go.patterns[0].display("-").to_string(), "- -");
    }

    #[test]
    fn test_goal_passthrough() {
        let table = parse("a x GOAL\na y go\nb x go\nb y stop\n");
        let solution = compress(&table);

        assert_eq!(
            solution.get("GOAL"),
            Some(&ActionEntry::Passthrough {
                action: "GOAL".to_owned(),
                states: vec![StateId(0)],
            })
        );
        assert_eq!(solution.compressed().count(), 2);

        // Goal states still act as negatives: `go` cannot be `a -` or `- x`.
        let go = solution.compressed().find(|s| s.action == "go").unwrap();
        assert_eq!(go.pattern_count(), 2);
        check_sound_and_complete(&table, go);
        for pattern in &go.patterns {
            assert!(!pattern.matches(&State::new(["a", "x"])));
        }
    }

    #[test]
    fn test_unknown_action() {
        let table = parse("a go\n");
        let mut compressor = Compressor::new(&table, MicrolpSolver);
        assert!(matches!(
            compressor.compress_action("stop"),
            Err(CompressError::UnknownAction(action)) if action == "stop"
        ));
    }

    #[test]
    fn test_metrics_are_deterministic() {
        let table = parse("a x 1 go\na y 2 go\nb x 2 stop\nb y 1 go\nc x 1 stop\nc y 2 stop\n");
        let first = compress(&table);
        let second = compress(&table);
        let metrics = |solution: &Solution| {
            solution
                .compressed()
                .map(|s| (s.action.clone(), s.pattern_count(), s.fact_count()))
                .collect::<Vec<_>>()
        };
        assert_eq!(metrics(&first), metrics(&second));
    }

    /// Never finds anything feasible.
    struct AlwaysInfeasible {
        calls: Cell<usize>,
    }

    impl Solver for AlwaysInfeasible {
        fn solve(&self, _: &IntegerProgram<'_>) -> Result<SolveOutcome, SolverError> {
            self.calls.set(self.calls.get() + 1);
            Ok(SolveOutcome::Infeasible)
        }
    }

    #[test]
    fn test_search_is_bounded() {
        let table = parse("a go\nb go\nc go\nd stop\n");
        let solver = AlwaysInfeasible {
            calls: Cell::new(0),
        };
        let mut compressor = Compressor::new(&table, &solver);
        match compressor.compress_action("go") {
            Err(CompressError::SearchExhausted { action, bound }) => {
                assert_eq!(action, "go");
                assert_eq!(bound, 3);
            }
            other => panic!("expected search to be exhausted, got {:?}", other),
        }
        assert_eq!(solver.calls.get(), 3, "k never exceeds the state count");
    }

    struct Failing;

    impl Solver for Failing {
        fn solve(&self, _: &IntegerProgram<'_>) -> Result<SolveOutcome, SolverError> {
            Err(SolverError::Backend("out of memory".to_owned()))
        }
    }

    #[test]
    fn test_solver_failure_is_fatal() {
        let table = parse("a go\nb stop\n");
        let mut compressor = Compressor::new(&table, Failing);
        assert!(matches!(
            compressor.compress(),
            Err(CompressError::Solver { k: 1, ref action, .. }) if action == "go"
        ));
    }

    /// Claims that setting every variable to 1 is optimal.
    struct AllOnes;

    impl Solver for AllOnes {
        fn solve(&self, program: &IntegerProgram<'_>) -> Result<SolveOutcome, SolverError> {
            let values = vec![1; program.variables().len()];
            Ok(SolveOutcome::Optimal(Assignment::new(values, 0)))
        }
    }

    /// Returns an optimum without any values.
    struct Empty;

    impl Solver for Empty {
        fn solve(&self, _: &IntegerProgram<'_>) -> Result<SolveOutcome, SolverError> {
            Ok(SolveOutcome::Optimal(Assignment::new(Vec::new(), 0)))
        }
    }

    #[test]
    fn test_invalid_assignments_are_errors() {
        let table = parse("a x go\nb y stop\n");

        let mut compressor = Compressor::new(&table, AllOnes);
        match compressor.compress_action("go") {
            Err(CompressError::ConflictingFacts {
                action,
                k,
                index,
                position,
            }) => {
                assert_eq!(action, "go");
                assert_eq!((k, index, position), (1, 0, 0));
            }
            other => panic!("expected conflicting facts, got {:?}", other),
        }

        let mut compressor = Compressor::new(&table, Empty);
        match compressor.compress_action("stop") {
            Err(CompressError::AssignmentLength {
                expected, actual, ..
            }) => {
                // 4 facts + 2 states + size
                assert_eq!((expected, actual), (7, 0));
            }
            other => panic!("expected a length mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_dump_file_name() {
        assert_eq!(dump_file_name("go", 1), "go_1.lp");
        assert_eq!(dump_file_name("turn-left_2", 3), "turn-left_2_3.lp");
        assert_eq!(dump_file_name("a/b", 1), "a_b_1.lp");
        assert_eq!(dump_file_name("../up", 2), "___up_2.lp");
    }

    #[test]
    fn test_lp_dump_with_path_separator_in_action() {
        let dir = std::env::temp_dir().join(format!(
            "state-compress-lp-slash-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let dir = Utf8PathBuf::try_from(dir).unwrap();

        let table = parse("a x a/b\nb x c\n");
        let mut compressor = Compressor::new(&table, MicrolpSolver).with_lp_dump_dir(dir.clone());
        compressor.compress().unwrap();

        assert!(dir.join("a_b_1.lp").exists());
        assert!(dir.join("c_1.lp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_lp_dump() {
        let dir = std::env::temp_dir().join(format!("state-compress-lp-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let dir = Utf8PathBuf::try_from(dir).unwrap();

        let table = parse("a x go\na y stop\nb x stop\n");
        let mut compressor = Compressor::new(&table, MicrolpSolver).with_lp_dump_dir(dir.clone());
        compressor.compress_action("stop").unwrap();

        let first = fs::read_to_string(dir.join("stop_1.lp")).unwrap();
        assert!(first.starts_with("Minimize\n obj: + 1 size_0\n"));
        assert!(dir.join("stop_2.lp").exists());
        assert!(!dir.join("stop_3.lp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn proptest_compression_is_optimal(table: DecisionTable) {
            let solution = compress(&table);
            for entry in solution.compressed() {
                check_sound_and_complete(&table, entry);
                prop_assert!(entry.pattern_count() <= entry.state_count);
                prop_assert_eq!(
                    (entry.pattern_count(), entry.fact_count()),
                    brute_force_optimum(&table, &entry.action),
                    "action {} is optimal",
                    &entry.action,
                );
            }
        }
    }
}
