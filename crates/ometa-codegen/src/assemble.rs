// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Grammar assembly.
//!
//! Lowers every rule of a `Grammar` tree, wires the result to its parent
//! and base runtime, and registers it. Assembly is all-or-nothing: the
//! first error aborts it and the registry is left untouched.

use std::fmt::Write as _;
use std::sync::Arc;

use indexmap::IndexMap;
use ometa_ir::{Node, Value};
use ometa_runtime::{BaseRuntime, StandardRuntime};

use crate::config::CompilerConfig;
use crate::error::{BuildError, LoweringError};
use crate::grammar::{Grammar, GrammarHandle};
use crate::host::{ActionEvaluator, ExprEvaluator};
use crate::lower::lower_rule;
use crate::registry::GrammarRegistry;
use crate::rule::CompiledRule;
use crate::scope::Environment;

/// Builds one named grammar against a registry.
///
/// ```ignore
/// let handle = GrammarAssembler::new(&registry, "calc")
///     .parent("base")
///     .global("ten", 10i64)
///     .assemble(&tree)?;
/// ```
pub struct GrammarAssembler<'r> {
    registry: &'r GrammarRegistry,
    name: String,
    parent: Option<String>,
    base: Option<Arc<dyn BaseRuntime>>,
    globals: Environment,
    evaluator: Arc<dyn ActionEvaluator>,
    config: CompilerConfig,
}

impl<'r> GrammarAssembler<'r> {
    pub fn new(registry: &'r GrammarRegistry, name: impl Into<String>) -> Self {
        Self {
            registry,
            name: name.into(),
            parent: None,
            base: None,
            globals: Environment::new(),
            evaluator: Arc::new(ExprEvaluator),
            config: CompilerConfig::default(),
        }
    }

    /// Extend the registered grammar `name`.
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// Base runtime for primitives and combinators. Defaults to the
    /// parent's, or [`StandardRuntime`] without a parent.
    pub fn base(mut self, runtime: Arc<dyn BaseRuntime>) -> Self {
        self.base = Some(runtime);
        self
    }

    pub fn globals(mut self, globals: Environment) -> Self {
        self.globals = globals;
        self
    }

    pub fn global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.define(name, value);
        self
    }

    pub fn evaluator(mut self, evaluator: Arc<dyn ActionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn assemble(self, tree: &Node) -> Result<GrammarHandle, BuildError> {
        let rules = match tree {
            Node::Grammar { rules } => rules,
            other => return Err(BuildError::NotAGrammar(other.kind())),
        };

        let parent = match &self.parent {
            Some(parent) => Some(self.registry.get(parent).ok_or_else(|| {
                BuildError::UnknownParent {
                    grammar: self.name.clone(),
                    parent: parent.clone(),
                }
            })?),
            None => None,
        };

        let base = match (&self.base, &parent) {
            (Some(base), _) => Arc::clone(base),
            (None, Some(parent)) => parent.shared_base(),
            (None, None) => StandardRuntime::shared(),
        };

        let mut compiled: IndexMap<String, CompiledRule> = IndexMap::new();
        for (name, body) in rules {
            if compiled.contains_key(name) {
                return Err(BuildError::Lowering {
                    rule: name.clone(),
                    source: LoweringError::DuplicateRule,
                });
            }
            let lowered = lower_rule(name, body, self.evaluator.as_ref(), &self.globals)?;
            for target in &lowered.parent_calls {
                let resolves = match &parent {
                    Some(p) => p.resolve(target).is_some() || base.has_rule(target),
                    None => false,
                };
                if !resolves {
                    return Err(BuildError::DispatchResolution {
                        grammar: self.name.clone(),
                        rule: name.clone(),
                        target: target.clone(),
                    });
                }
            }
            compiled.insert(name.clone(), CompiledRule::new(lowered));
        }

        let listing = self
            .config
            .keep_listing
            .then(|| render_listing(&self.name, parent.as_ref(), base.as_ref(), &compiled));

        tracing::debug!(
            grammar = %self.name,
            parent = ?self.parent,
            base = base.name(),
            rules = compiled.len(),
            "assembled grammar"
        );

        let handle = GrammarHandle::new(Grammar {
            name: self.name,
            parent,
            base,
            globals: Arc::new(self.globals),
            rules: compiled,
            config: self.config,
            listing,
        });
        self.registry.register(handle.clone());
        Ok(handle)
    }
}

fn render_listing(
    name: &str,
    parent: Option<&GrammarHandle>,
    base: &dyn BaseRuntime,
    rules: &IndexMap<String, CompiledRule>,
) -> String {
    let mut out = String::new();
    let _ = write!(out, "grammar {}", name);
    if let Some(parent) = parent {
        let _ = write!(out, " < {}", parent.name());
    }
    let _ = writeln!(out, " [{}]", base.name());
    for rule in rules.values() {
        let _ = writeln!(out, "{}", rule);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ometa_ir::build::*;

    #[test]
    fn rejects_non_grammar_trees() {
        let registry = GrammarRegistry::new();
        let err = GrammarAssembler::new(&registry, "g")
            .assemble(&exactly('a'))
            .unwrap_err();
        assert!(matches!(err, BuildError::NotAGrammar(_)));
    }

    #[test]
    fn unknown_parent_is_a_build_error() {
        let registry = GrammarRegistry::new();
        let tree = GrammarBuilder::new().rule("a", exactly('a')).finish();
        let err = GrammarAssembler::new(&registry, "child")
            .parent("missing")
            .assemble(&tree)
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownParent { ref parent, .. } if parent == "missing"));
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_build_registers_nothing() {
        let registry = GrammarRegistry::new();
        let tree = GrammarBuilder::new()
            .rule("ok", exactly('a'))
            .rule("bad", or_(vec![]))
            .finish();
        let err = GrammarAssembler::new(&registry, "g").assemble(&tree).unwrap_err();
        assert_eq!(err.rule(), Some("bad"));
        assert!(!registry.contains("g"));
    }

    #[test]
    fn duplicate_rules_are_rejected() {
        let registry = GrammarRegistry::new();
        let tree = GrammarBuilder::new()
            .rule("a", exactly('a'))
            .rule("a", exactly('b'))
            .finish();
        let err = GrammarAssembler::new(&registry, "g").assemble(&tree).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Lowering { source: LoweringError::DuplicateRule, .. }
        ));
    }

    #[test]
    fn super_without_target_in_parent_chain_is_rejected() {
        let registry = GrammarRegistry::new();
        let base = GrammarBuilder::new().rule("letter", exactly('x')).finish();
        GrammarAssembler::new(&registry, "base").assemble(&base).unwrap();

        let child = GrammarBuilder::new()
            .rule("word", super_apply("word", vec![]))
            .finish();
        let err = GrammarAssembler::new(&registry, "child")
            .parent("base")
            .assemble(&child)
            .unwrap_err();
        assert!(matches!(err, BuildError::DispatchResolution { ref target, .. } if target == "word"));

        // Primitives of the base runtime count as inherited rules.
        let child = GrammarBuilder::new()
            .rule("digit", super_apply("digit", vec![]))
            .finish();
        GrammarAssembler::new(&registry, "child")
            .parent("base")
            .assemble(&child)
            .unwrap();

        let err = GrammarAssembler::new(&registry, "orphan")
            .assemble(&child)
            .unwrap_err();
        assert!(matches!(err, BuildError::DispatchResolution { .. }));
    }

    #[test]
    fn base_runtime_is_inherited_from_parent() {
        let registry = GrammarRegistry::new();
        let tree = GrammarBuilder::new().rule("a", exactly('a')).finish();
        let parent = GrammarAssembler::new(&registry, "p").assemble(&tree).unwrap();
        let child = GrammarAssembler::new(&registry, "c")
            .parent("p")
            .assemble(&tree)
            .unwrap();
        assert!(Arc::ptr_eq(&parent.shared_base(), &child.shared_base()));
    }

    #[test]
    fn listing_is_kept_unless_disabled() {
        let registry = GrammarRegistry::new();
        let tree = GrammarBuilder::new().rule("a", exactly('a')).finish();
        let g = GrammarAssembler::new(&registry, "g").assemble(&tree).unwrap();
        let listing = g.listing().unwrap();
        assert!(listing.starts_with("grammar g [standard]\nrule a {"), "{}", listing);
        assert_eq!(registry.listing("g").as_deref(), Some(listing));

        let quiet = GrammarAssembler::new(&registry, "q")
            .config(CompilerConfig::default().with_listing(false))
            .assemble(&tree)
            .unwrap();
        assert!(quiet.listing().is_none());
    }
}
