// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Assembled grammar units and the parsers that run them.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;
use ometa_ir::{Dispatch, Value};
use ometa_runtime::{BaseRuntime, Input, Outcome, ParseError};

use crate::config::CompilerConfig;
use crate::exec::Machine;
use crate::rule::CompiledRule;
use crate::scope::{Environment, ScopeTrace};

/// A compiled grammar: its own rules, a parent, a base runtime and the
/// globals its host code sees. Immutable after assembly.
pub struct Grammar {
    pub(crate) name: String,
    pub(crate) parent: Option<GrammarHandle>,
    pub(crate) base: Arc<dyn BaseRuntime>,
    pub(crate) globals: Arc<Environment>,
    pub(crate) rules: IndexMap<String, CompiledRule>,
    pub(crate) config: CompilerConfig,
    pub(crate) listing: Option<String>,
}

impl Grammar {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&GrammarHandle> {
        self.parent.as_ref()
    }

    pub(crate) fn parent_grammar(&self) -> Option<&Grammar> {
        self.parent.as_deref()
    }

    pub fn base_runtime(&self) -> &dyn BaseRuntime {
        self.base.as_ref()
    }

    pub(crate) fn shared_base(&self) -> Arc<dyn BaseRuntime> {
        Arc::clone(&self.base)
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Rules defined by this grammar itself, in declaration order.
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn rule(&self, name: &str) -> Option<&CompiledRule> {
        self.rules.get(name)
    }

    /// Find `name` here or in the nearest ancestor defining it, with the
    /// grammar that owns the definition.
    pub fn resolve(&self, name: &str) -> Option<(&Grammar, &CompiledRule)> {
        let mut current = Some(self);
        while let Some(grammar) = current {
            if let Some(rule) = grammar.rules.get(name) {
                return Some((grammar, rule));
            }
            current = grammar.parent_grammar();
        }
        None
    }

    /// Whether applying `name` here would find a rule or a primitive.
    pub fn responds_to(&self, name: &str) -> bool {
        self.resolve(name).is_some() || self.base.has_rule(name)
    }

    /// Lowered steps of every rule, when the listing was kept.
    pub fn listing(&self) -> Option<&str> {
        self.listing.as_deref()
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("base", &self.base.name())
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Shared handle to an assembled grammar. Cheap to clone and safe to use
/// from many threads at once.
#[derive(Clone, Debug)]
pub struct GrammarHandle(Arc<Grammar>);

impl GrammarHandle {
    pub(crate) fn new(grammar: Grammar) -> Self {
        Self(Arc::new(grammar))
    }

    /// A parser over `input`. Each parser owns its input and scope trace.
    pub fn parser(&self, input: impl Into<Input>) -> Parser {
        Parser {
            grammar: self.clone(),
            input: input.into(),
            trace: ScopeTrace::new(),
        }
    }

    /// Whether both handles point at the same assembled grammar.
    pub fn ptr_eq(&self, other: &GrammarHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for GrammarHandle {
    type Target = Grammar;

    fn deref(&self) -> &Grammar {
        &self.0
    }
}

/// Runs rules of one grammar against one input.
#[derive(Debug)]
pub struct Parser {
    grammar: GrammarHandle,
    input: Input,
    trace: ScopeTrace,
}

impl Parser {
    /// Apply `rule` at the current position. On failure the input is left
    /// where it was.
    pub fn apply(&mut self, rule: &str) -> Outcome {
        self.apply_with(rule, &[])
    }

    pub fn apply_with(&mut self, rule: &str, args: &[Value]) -> Outcome {
        let start = self.input.mark();
        let grammar: &Grammar = &self.grammar;
        let mut machine = Machine::new(grammar, &mut self.trace);
        let result = machine.apply(grammar, rule, Dispatch::Local, args, &mut self.input);
        if result.is_err() {
            self.input.reset(start);
        }
        result
    }

    /// Apply `rule` and require the whole input to be consumed.
    pub fn apply_complete(&mut self, rule: &str) -> Outcome {
        let start = self.input.mark();
        let value = self.apply(rule)?;
        if self.input.at_end() {
            Ok(value)
        } else {
            let position = self.input.position();
            self.input.reset(start);
            Err(ParseError::fail(position, "end of input"))
        }
    }

    pub fn grammar(&self) -> &GrammarHandle {
        &self.grammar
    }

    pub fn position(&self) -> usize {
        self.input.position()
    }

    pub fn at_end(&self) -> bool {
        self.input.at_end()
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Scope of the last invocation of each rule run by this parser.
    pub fn trace(&self) -> &ScopeTrace {
        &self.trace
    }
}
