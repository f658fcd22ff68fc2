// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The base-runtime contract compiled grammars are attached to.

use ometa_ir::Value;

use crate::{Input, MatchFailure, Outcome, ParseError};

/// A deferred, re-invocable unit of matching logic.
pub type Thunk<'t> = dyn FnMut(&mut Input) -> Outcome + 't;

/// Primitive operations a compiled grammar delegates to.
///
/// Drivers only catch [`ParseError::Backtrack`]; faults pass through
/// untouched. Every driver leaves the input where it found it on failure.
pub trait BaseRuntime: Send + Sync {
    /// Name shown in listings.
    fn name(&self) -> &str;

    /// Whether `name` is a primitive rule of this runtime.
    fn has_rule(&self, name: &str) -> bool;

    /// Run a primitive rule. Arguments are passed directly, not pushed.
    fn apply_rule(&self, name: &str, args: &[Value], input: &mut Input) -> Outcome;

    /// Match one item equal to `wanted`. A string literal against
    /// character input matches its characters in sequence. The empty
    /// string matches anywhere, end of input included, and consumes
    /// nothing.
    fn exactly(&self, wanted: &Value, input: &mut Input) -> Outcome {
        if matches!(wanted, Value::Str(s) if s.is_empty()) {
            return Ok(wanted.clone());
        }
        let start = input.mark();
        let position = input.position();
        if let (Value::Str(s), Some(Value::Char(_))) = (wanted, input.peek()) {
            for c in s.chars() {
                match input.next() {
                    Some(Value::Char(got)) if got == c => {}
                    _ => {
                        input.reset(start);
                        return Err(ParseError::fail(position, wanted.to_string()));
                    }
                }
            }
            return Ok(wanted.clone());
        }
        match input.peek() {
            Some(item) if item == wanted => {
                input.next();
                Ok(wanted.clone())
            }
            _ => Err(ParseError::fail(position, wanted.to_string())),
        }
    }

    /// Ordered choice over `count` alternatives; the input is rewound
    /// before each attempt and the first success wins.
    fn choice(
        &self,
        input: &mut Input,
        count: usize,
        alternative: &mut dyn FnMut(&mut Input, usize) -> Outcome,
    ) -> Outcome {
        let start = input.mark();
        let mut failure: Option<MatchFailure> = None;
        for i in 0..count {
            match alternative(input, i) {
                Ok(value) => return Ok(value),
                Err(ParseError::Backtrack(f)) => {
                    input.reset(start.clone());
                    failure = Some(match failure {
                        Some(prev) => prev.merge(f),
                        None => f,
                    });
                }
                Err(fault) => return Err(fault),
            }
        }
        Err(ParseError::Backtrack(
            failure.unwrap_or_else(|| MatchFailure::new(input.position(), "an alternative")),
        ))
    }

    /// Zero or more: never fails.
    fn many(&self, input: &mut Input, body: &mut Thunk<'_>) -> Outcome {
        repeat(input, body, Vec::new())
    }

    /// One or more: the first match is element 0 of the result.
    fn many1(&self, input: &mut Input, body: &mut Thunk<'_>) -> Outcome {
        let start = input.mark();
        let first = match body(input) {
            Ok(value) => value,
            Err(e) => {
                if e.is_backtrack() {
                    input.reset(start);
                }
                return Err(e);
            }
        };
        repeat(input, body, vec![first])
    }

    /// Negative lookahead.
    fn not(&self, input: &mut Input, body: &mut Thunk<'_>) -> Outcome {
        let start = input.mark();
        let position = input.position();
        match body(input) {
            Ok(_) => {
                input.reset(start);
                Err(ParseError::fail(position, "no match"))
            }
            Err(ParseError::Backtrack(_)) => {
                input.reset(start);
                Ok(Value::None)
            }
            Err(fault) => Err(fault),
        }
    }

    /// Positive lookahead, yielding the body's value.
    fn lookahead(&self, input: &mut Input, body: &mut Thunk<'_>) -> Outcome {
        let start = input.mark();
        let result = body(input);
        if result.is_ok() || matches!(result, Err(ParseError::Backtrack(_))) {
            input.reset(start);
        }
        result
    }

    /// Succeeds without a value when the body's value is truthy.
    fn pred(&self, input: &mut Input, body: &mut Thunk<'_>) -> Outcome {
        let start = input.mark();
        let position = input.position();
        let result = body(input);
        match result {
            Ok(value) => {
                input.reset(start);
                if value.is_truthy() {
                    Ok(Value::None)
                } else {
                    Err(ParseError::fail(position, "predicate to hold"))
                }
            }
            Err(ParseError::Backtrack(f)) => {
                input.reset(start);
                Err(ParseError::Backtrack(f))
            }
            Err(fault) => Err(fault),
        }
    }

    /// Match the body against the contents of the next item, which must be
    /// a list (or a string, matched per character), and require the nested
    /// contents to be exhausted. Yields the item.
    fn list_pattern(&self, input: &mut Input, body: &mut Thunk<'_>) -> Outcome {
        let start = input.mark();
        let position = input.position();
        let (item, contents) = match input.peek() {
            Some(Value::List(items)) => (Value::List(items.clone()), items.clone()),
            Some(Value::Str(s)) => (Value::Str(s.clone()), Value::chars(s).into()),
            _ => return Err(ParseError::fail(position, "a list")),
        };
        input.next();
        let after = input.mark();
        input.enter(contents);
        let matched = body(input).and_then(|_| {
            if input.at_end() {
                Ok(())
            } else {
                Err(ParseError::fail(input.position(), "end of list"))
            }
        });
        match matched {
            Ok(()) => {
                input.reset(after);
                Ok(item)
            }
            Err(e) => {
                input.reset(start);
                Err(e)
            }
        }
    }
}

fn repeat(input: &mut Input, body: &mut Thunk<'_>, mut collected: Vec<Value>) -> Outcome {
    loop {
        let start = input.mark();
        let before = input.consumed();
        match body(input) {
            Ok(value) => {
                collected.push(value);
                // A body that succeeds without consuming would repeat forever.
                if input.consumed() == before {
                    break;
                }
            }
            Err(ParseError::Backtrack(_)) => {
                input.reset(start);
                break;
            }
            Err(fault) => return Err(fault),
        }
    }
    Ok(Value::list(collected))
}
