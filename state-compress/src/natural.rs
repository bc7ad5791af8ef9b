// Copyright (c) The state-compress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Natural ("human") ordering of action labels, so that `a2` sorts before `a10`.

use std::cmp::Ordering;

/// Compares two strings, treating runs of ASCII digits as numbers.
///
/// Strings that compare equal under this ordering but differ textually (e.g. `a01` and `a1`) fall
/// back to plain byte order, so the ordering is total.
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut a_chunks = Chunks::new(a);
    let mut b_chunks = Chunks::new(b);
    loop {
        let ordering = match (a_chunks.next(), b_chunks.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Chunk::Digits(x)), Some(Chunk::Digits(y))) => compare_digits(x, y),
            (Some(Chunk::Digits(_)), Some(Chunk::Text(_))) => Ordering::Less,
            (Some(Chunk::Text(_)), Some(Chunk::Digits(_))) => Ordering::Greater,
            (Some(Chunk::Text(x)), Some(Chunk::Text(y))) => x.cmp(y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

/// Sorts labels in natural order.
pub fn sort<S: AsRef<str>>(labels: &mut [S]) {
    labels.sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let is_digit = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != is_digit)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if is_digit {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_compare_numerically() {
        let mut labels = vec!["a10", "a2", "b", "a1", "a02"];
        sort(&mut labels);
        assert_eq!(labels, ["a1", "a02", "a2", "a10", "b"]);
    }

    #[test]
    fn test_digits_before_text() {
        assert_eq!(compare("1", "a"), Ordering::Less);
        assert_eq!(compare("go", "go1"), Ordering::Less);
        assert_eq!(compare("stop", "go"), Ordering::Greater);
        assert_eq!(compare("x", "x"), Ordering::Equal);
    }
}
