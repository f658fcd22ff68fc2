// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Name scopes seen by host code.

use indexmap::IndexMap;
use ometa_ir::Value;

/// Globals shared by every rule of one grammar. Immutable once the
/// grammar is built.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: IndexMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style define.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.define(name, value);
        self
    }

    pub fn define(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Bindings of one rule invocation. Created fresh on every call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locals {
    bindings: IndexMap<String, Value>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// A rule invocation's scope as it stood when the invocation returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeSnapshot {
    /// Grammar that defined the rule.
    pub grammar: String,
    pub locals: Locals,
    pub matched: bool,
}

/// Last-invocation scopes per rule name, kept by one parser.
///
/// Invocations are ordered by when they started. The entry for a rule is
/// the latest-started invocation that has returned, so for recursive
/// rules the innermost call wins.
#[derive(Debug, Clone, Default)]
pub struct ScopeTrace {
    last: IndexMap<String, (u64, ScopeSnapshot)>,
    started: u64,
}

impl ScopeTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Order stamp for an invocation that is starting now.
    pub(crate) fn begin(&mut self) -> u64 {
        self.started += 1;
        self.started
    }

    pub(crate) fn record(&mut self, rule: &str, order: u64, snapshot: ScopeSnapshot) {
        match self.last.get_mut(rule) {
            Some((seen, _)) if *seen > order => {}
            Some(entry) => *entry = (order, snapshot),
            None => {
                self.last.insert(rule.to_string(), (order, snapshot));
            }
        }
    }

    pub fn get(&self, rule: &str) -> Option<&ScopeSnapshot> {
        self.last.get(rule).map(|(_, snapshot)| snapshot)
    }

    /// Value of `name` in the last invocation of `rule`.
    pub fn binding(&self, rule: &str, name: &str) -> Option<&Value> {
        self.get(rule)?.locals.get(name)
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(n: i64) -> ScopeSnapshot {
        let mut locals = Locals::new();
        locals.set("n", Value::Int(n));
        ScopeSnapshot {
            grammar: "g".into(),
            locals,
            matched: true,
        }
    }

    #[test]
    fn trace_keeps_last_invocation() {
        let mut trace = ScopeTrace::new();
        for n in 1..=3 {
            let order = trace.begin();
            trace.record("digit", order, snapshot(n));
        }
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.binding("digit", "n"), Some(&Value::Int(3)));
        assert_eq!(trace.binding("digit", "m"), None);
    }

    #[test]
    fn later_started_invocation_wins_over_later_return() {
        let mut trace = ScopeTrace::new();
        let outer = trace.begin();
        let inner = trace.begin();
        trace.record("nest", inner, snapshot(2));
        trace.record("nest", outer, snapshot(1));
        assert_eq!(trace.binding("nest", "n"), Some(&Value::Int(2)));
    }

    #[test]
    fn environment_builder_keeps_order() {
        let env = Environment::new().with("b", 2i64).with("a", 1i64);
        assert_eq!(env.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(env.get("a"), Some(&Value::Int(1)));
    }
}
