// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Persistent input streams.
//!
//! A stream is either a window over shared items or an argument pushed in
//! front of another stream. Marks are plain clones, so rewinding after a
//! failed alternative costs nothing.

use std::sync::Arc;

use ometa_ir::Value;

#[derive(Debug, Clone)]
enum Stream {
    Items { data: Arc<[Value]>, index: usize },
    Arg { value: Value, rest: Arc<Stream> },
}

impl Stream {
    fn position(&self) -> usize {
        match self {
            Stream::Items { index, .. } => *index,
            Stream::Arg { rest, .. } => rest.position(),
        }
    }

    fn head(&self) -> Option<&Value> {
        match self {
            Stream::Items { data, index } => data.get(*index),
            Stream::Arg { value, .. } => Some(value),
        }
    }
}

/// A saved input state.
#[derive(Debug, Clone)]
pub struct Mark {
    stream: Stream,
    consumed: usize,
}

/// The input a parser consumes.
#[derive(Debug, Clone)]
pub struct Input {
    stream: Stream,
    /// Items taken so far; restored with marks, used to detect progress.
    consumed: usize,
}

impl Input {
    pub fn new(items: impl Into<Arc<[Value]>>) -> Self {
        Self {
            stream: Stream::Items {
                data: items.into(),
                index: 0,
            },
            consumed: 0,
        }
    }

    /// Offset into the current item window. Pushed arguments do not count.
    pub fn position(&self) -> usize {
        self.stream.position()
    }

    /// Monotonic count of items taken, arguments included.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn peek(&self) -> Option<&Value> {
        self.stream.head()
    }

    pub fn at_end(&self) -> bool {
        self.peek().is_none()
    }

    pub fn next(&mut self) -> Option<Value> {
        let (value, rest) = match &self.stream {
            Stream::Items { data, index } => {
                let value = data.get(*index)?.clone();
                (
                    value,
                    Stream::Items {
                        data: data.clone(),
                        index: index + 1,
                    },
                )
            }
            Stream::Arg { value, rest } => (value.clone(), rest.as_ref().clone()),
        };
        self.stream = rest;
        self.consumed += 1;
        Some(value)
    }

    pub fn mark(&self) -> Mark {
        Mark {
            stream: self.stream.clone(),
            consumed: self.consumed,
        }
    }

    pub fn reset(&mut self, mark: Mark) {
        self.stream = mark.stream;
        self.consumed = mark.consumed;
    }

    /// Push rule arguments so the first argument is read first.
    pub fn push_args(&mut self, args: &[Value]) {
        for value in args.iter().rev() {
            self.stream = Stream::Arg {
                value: value.clone(),
                rest: Arc::new(self.stream.clone()),
            };
        }
    }

    /// Switch to a nested item window. Restore the outer one with a mark
    /// taken beforehand.
    pub fn enter(&mut self, items: Arc<[Value]>) {
        self.stream = Stream::Items { data: items, index: 0 };
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::new(Value::chars(text))
    }
}

impl From<Vec<Value>> for Input {
    fn from(items: Vec<Value>) -> Self {
        Input::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_rewinds_position_and_progress() {
        let mut input = Input::from("ab");
        let start = input.mark();
        assert_eq!(input.next(), Some(Value::Char('a')));
        assert_eq!(input.position(), 1);
        input.reset(start);
        assert_eq!(input.position(), 0);
        assert_eq!(input.consumed(), 0);
    }

    #[test]
    fn pushed_args_come_first_in_order() {
        let mut input = Input::from("z");
        input.push_args(&[Value::Int(1), Value::Int(2)]);
        assert_eq!(input.next(), Some(Value::Int(1)));
        assert_eq!(input.next(), Some(Value::Int(2)));
        assert_eq!(input.position(), 0);
        assert_eq!(input.next(), Some(Value::Char('z')));
        assert!(input.at_end());
        assert_eq!(input.consumed(), 3);
    }

    #[test]
    fn nested_window_restores_through_mark() {
        let nested: Arc<[Value]> = Arc::from(vec![Value::Int(7)]);
        let mut input = Input::new(vec![Value::List(nested.clone()), Value::Int(9)]);
        input.next();
        let after = input.mark();
        input.enter(nested);
        assert_eq!(input.next(), Some(Value::Int(7)));
        assert!(input.at_end());
        input.reset(after);
        assert_eq!(input.next(), Some(Value::Int(9)));
    }
}
