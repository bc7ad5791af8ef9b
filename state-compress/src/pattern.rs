// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Partial states: patterns that specify some facts and leave the other positions as wildcards.

use crate::table::{Fact, State};
use std::{borrow::Cow, fmt};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartialState {
    index: usize,
    width: usize,
    facts: Vec<Fact>,
}

impl PartialState {
    /// Creates partial state `index` over `width` positions. Facts are kept in fact order.
    ///
    /// Panics if a fact lies outside `0..width` or two facts share a position.
    pub fn new(index: usize, width: usize, facts: impl IntoIterator<Item = Fact>) -> Self {
        let mut facts: Vec<Fact> = facts.into_iter().collect();
        facts.sort_unstable();
        for fact in &facts {
            assert!(
                fact.position < width,
                "fact {} must be in range 0..{}",
                fact,
                width
            );
        }
        assert!(
            facts.windows(2).all(|w| w[0].position != w[1].position),
            "a partial state specifies at most one value per position"
        );
        Self {
            index,
            width,
            facts,
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The number of positions, specified or not.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// The specified facts, in fact order.
    #[inline]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// The number of specified facts.
    #[inline]
    pub fn size(&self) -> usize {
        self.facts.len()
    }

    /// The specified value at `position`, or `None` for a wildcard.
    pub fn value(&self, position: usize) -> Option<&str> {
        self.facts
            .binary_search_by_key(&position, |fact| fact.position)
            .ok()
            .map(|ix| self.facts[ix].value.as_str())
    }

    /// Whether every specified fact is present in `state`.
    pub fn matches(&self, state: &State) -> bool {
        self.facts.iter().all(|fact| state.contains(fact))
    }

    #[inline]
    pub fn display<'a>(&'a self, null_fact_token: &'a str) -> PartialStateDisplay<'a> {
        PartialStateDisplay::new(self, null_fact_token)
    }
}

/// Renders a partial state as one token per position, wildcards as the null-fact token.
#[derive(Clone, Debug)]
pub struct PartialStateDisplay<'a> {
    partial_state: &'a PartialState,
    null_fact_token: Cow<'a, str>,
    separator: Cow<'a, str>,
}

impl<'a> PartialStateDisplay<'a> {
    pub fn new(partial_state: &'a PartialState, null_fact_token: impl Into<Cow<'a, str>>) -> Self {
        Self {
            partial_state,
            null_fact_token: null_fact_token.into(),
            separator: Cow::Borrowed(" "),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<Cow<'a, str>>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl<'a> fmt::Display for PartialStateDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut facts = self.partial_state.facts().iter().peekable();
        for position in 0..self.partial_state.width() {
            if position > 0 {
                write!(f, "{}", self.separator)?;
            }
            match facts.next_if(|fact| fact.position == position) {
                Some(fact) => write!(f, "{}", fact.value)?,
                None => write!(f, "{}", self.null_fact_token)?,
            }
        }
        Ok(())
    }
}
