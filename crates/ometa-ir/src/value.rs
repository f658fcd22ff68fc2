// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Values flowing through grammars.
//!
//! The same domain covers `Exactly` literals, input items, rule results
//! and host-expression bindings.

use std::fmt;
use std::sync::Arc;

/// A value matched, produced or bound by a grammar.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// The explicit absent value (failed optional, `Not`, actions).
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Char(char),
    Str(Arc<str>),
    List(Arc<[Value]>),
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: impl Into<Arc<[Value]>>) -> Self {
        Value::List(items.into())
    }

    /// Split a string into one `Char` item per character.
    pub fn chars(s: &str) -> Vec<Value> {
        s.chars().map(Value::Char).collect()
    }

    /// Name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Char(_) => "char",
            Value::Str(_) => "str",
            Value::List(_) => "list",
        }
    }

    /// Host truthiness: absent, `false`, zero and empty containers are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Char(_) => true,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            Value::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Equality that treats a one-character string and a char as equal.
    ///
    /// Character input yields `Char` items while host code spells
    /// characters as string literals, so comparisons go through here.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Char(_), Value::Str(_)) | (Value::Str(_), Value::Char(_)) => {
                self.as_char().is_some() && self.as_char() == other.as_char()
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
            }
            _ => self == other,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_host_rules() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(!Value::list(Vec::<Value>::new()).is_truthy());
        assert!(Value::Char('0').is_truthy());
        assert!(Value::Int(-3).is_truthy());
    }

    #[test]
    fn single_char_string_loosely_equals_char() {
        assert!(Value::Char('a').loose_eq(&Value::str("a")));
        assert!(!Value::Char('a').loose_eq(&Value::str("ab")));
        assert!(Value::str("a") != Value::Char('a'));
    }

    #[test]
    fn display_nests_lists() {
        let v = Value::from(vec![Value::Int(1), Value::Char('x'), Value::from(Vec::<Value>::new())]);
        assert_eq!(v.to_string(), "[1, 'x', []]");
    }
}
