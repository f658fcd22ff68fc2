// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The stock base runtime and its primitive rules.

use std::sync::Arc;

use ometa_ir::Value;

use crate::{BaseRuntime, Input, Outcome, ParseError};

const PRIMITIVES: &[&str] = &[
    "anything",
    "end",
    "char",
    "letter",
    "digit",
    "letterOrDigit",
    "space",
    "spaces",
    "exactly",
    "token",
];

/// Base runtime with the usual OMeta primitive rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardRuntime;

impl StandardRuntime {
    pub fn shared() -> Arc<dyn BaseRuntime> {
        Arc::new(StandardRuntime)
    }

    fn char_where(input: &mut Input, expected: &str, test: fn(char) -> bool) -> Outcome {
        let position = input.position();
        match input.peek() {
            Some(Value::Char(c)) if test(*c) => {
                let c = *c;
                input.next();
                Ok(Value::Char(c))
            }
            _ => Err(ParseError::fail(position, expected)),
        }
    }

    fn skip_spaces(input: &mut Input) {
        while let Some(Value::Char(c)) = input.peek() {
            if !c.is_whitespace() {
                break;
            }
            input.next();
        }
    }
}

fn single_arg<'a>(rule: &str, args: &'a [Value]) -> Result<&'a Value, ParseError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(ParseError::BadArguments {
            rule: rule.to_string(),
            message: format!("expected 1 argument, got {}", args.len()),
        }),
    }
}

impl BaseRuntime for StandardRuntime {
    fn name(&self) -> &str {
        "standard"
    }

    fn has_rule(&self, name: &str) -> bool {
        PRIMITIVES.contains(&name)
    }

    fn apply_rule(&self, name: &str, args: &[Value], input: &mut Input) -> Outcome {
        let position = input.position();
        match name {
            "anything" => input
                .next()
                .ok_or_else(|| ParseError::fail(position, "anything")),
            "end" => {
                if input.at_end() {
                    Ok(Value::None)
                } else {
                    Err(ParseError::fail(position, "end of input"))
                }
            }
            "char" => Self::char_where(input, "a character", |_| true),
            "letter" => Self::char_where(input, "a letter", char::is_alphabetic),
            "digit" => Self::char_where(input, "a digit", |c| c.is_ascii_digit()),
            "letterOrDigit" => Self::char_where(input, "a letter or digit", char::is_alphanumeric),
            "space" => Self::char_where(input, "whitespace", char::is_whitespace),
            "spaces" => {
                Self::skip_spaces(input);
                Ok(Value::None)
            }
            "exactly" => {
                let wanted = single_arg(name, args)?;
                self.exactly(wanted, input)
            }
            "token" => {
                let wanted = single_arg(name, args)?;
                let start = input.mark();
                Self::skip_spaces(input);
                match self.exactly(wanted, input) {
                    Ok(v) => Ok(v),
                    Err(e) => {
                        input.reset(start);
                        Err(e)
                    }
                }
            }
            _ => Err(ParseError::UnknownRule(name.to_string())),
        }
    }
}
