// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Match failures and parse-time faults.

use std::fmt;

use ometa_ir::Value;
use thiserror::Error;

/// Where matching gave up and what would have been accepted there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    pub position: usize,
    pub expected: Vec<String>,
}

impl MatchFailure {
    pub fn new(position: usize, expected: impl Into<String>) -> Self {
        Self {
            position,
            expected: vec![expected.into()],
        }
    }

    /// Keep the failure that got furthest; union expectations on a tie.
    pub fn merge(mut self, other: MatchFailure) -> Self {
        if other.position > self.position {
            other
        } else if other.position == self.position {
            for e in other.expected {
                if !self.expected.contains(&e) {
                    self.expected.push(e);
                }
            }
            self
        } else {
            self
        }
    }
}

impl fmt::Display for MatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected.as_slice() {
            [] => write!(f, "match failed at position {}", self.position),
            [one] => write!(f, "expected {} at position {}", one, self.position),
            many => write!(f, "expected one of {} at position {}", many.join(", "), self.position),
        }
    }
}

/// Errors raised while running a grammar.
///
/// `Backtrack` is ordinary PEG failure: the drivers catch it to try the
/// next alternative. Every other variant is a fault that aborts the parse.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("{0}")]
    Backtrack(MatchFailure),

    #[error("no rule named `{0}`")]
    UnknownRule(String),

    #[error("`super.{rule}` in grammar `{grammar}`: no ancestor defines it")]
    Dispatch { grammar: String, rule: String },

    #[error("host code failed in rule `{rule}`: {message}")]
    Host { rule: String, message: String },

    #[error("bad arguments to `{rule}`: {message}")]
    BadArguments { rule: String, message: String },

    #[error("rule nesting exceeded {0} levels; check for left recursion")]
    RecursionLimit(usize),
}

impl ParseError {
    pub fn fail(position: usize, expected: impl Into<String>) -> Self {
        ParseError::Backtrack(MatchFailure::new(position, expected))
    }

    pub fn is_backtrack(&self) -> bool {
        matches!(self, ParseError::Backtrack(_))
    }

    pub fn failure(&self) -> Option<&MatchFailure> {
        match self {
            ParseError::Backtrack(f) => Some(f),
            _ => None,
        }
    }
}

/// Result of one matching attempt.
pub type Outcome = Result<Value, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_furthest() {
        let a = MatchFailure::new(2, "'a'");
        let b = MatchFailure::new(5, "'b'");
        assert_eq!(a.clone().merge(b.clone()), b);
        assert_eq!(b.clone().merge(a), b);
    }

    #[test]
    fn merge_unions_on_tie() {
        let merged = MatchFailure::new(1, "'a'")
            .merge(MatchFailure::new(1, "'b'"))
            .merge(MatchFailure::new(1, "'a'"));
        assert_eq!(merged.expected, ["'a'", "'b'"]);
        assert_eq!(merged.to_string(), "expected one of 'a', 'b' at position 1");
    }
}
