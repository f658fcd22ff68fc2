// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Host code: the expressions and statements embedded in grammar trees.
//!
//! Source text is compiled once, when a rule is lowered, through an
//! [`ActionEvaluator`]. Compilation checks every name against the scope
//! visible at that point of the rule, so unbound names are build errors.
//! The compiled [`HostProgram`] then runs against the live scope of each
//! rule invocation.

mod eval;
mod lexer;
mod parser;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use ometa_ir::{Bindings, NativeHost, Value};

use crate::scope::{Environment, Locals};

pub use eval::ExprEvaluator;

/// Names visible at one point of a rule body, known at build time.
pub struct StaticScope<'a> {
    locals: IndexSet<String>,
    globals: &'a Environment,
}

impl<'a> StaticScope<'a> {
    pub fn new(globals: &'a Environment) -> Self {
        Self {
            locals: IndexSet::new(),
            globals,
        }
    }

    /// Whether `name` resolves here: a local bound earlier in the rule, a
    /// grammar global, or `self`.
    pub fn is_bound(&self, name: &str) -> bool {
        name == "self" || self.locals.contains(name) || self.globals.contains(name)
    }

    pub fn bind(&mut self, name: impl Into<String>) {
        self.locals.insert(name.into());
    }
}

/// Live scope handed to host code while a rule runs.
pub struct HostContext<'a> {
    pub grammar: &'a str,
    pub rule: &'a str,
    /// Input position when the host code started.
    pub position: usize,
    pub globals: &'a Environment,
    pub locals: &'a mut Locals,
}

impl Bindings for HostContext<'_> {
    /// `self` names the grammar that owns the running rule and cannot be
    /// shadowed. Locals shadow globals.
    fn lookup(&self, name: &str) -> Option<Value> {
        if name == "self" {
            return Some(Value::str(self.grammar));
        }
        self.locals.get(name).or_else(|| self.globals.get(name)).cloned()
    }
}

/// Compiled host code.
pub trait HostProgram: fmt::Debug + Send + Sync {
    /// Text shown in listings.
    fn source(&self) -> &str;

    fn run(&self, ctx: &mut HostContext<'_>) -> Result<Value, String>;
}

/// Compiles host source text. Grammars hold one evaluator for all their
/// rules, so implementations are shared across threads.
pub trait ActionEvaluator: Send + Sync {
    /// An expression yielding a value.
    fn compile_expr(&self, source: &str, scope: &StaticScope<'_>)
        -> Result<Arc<dyn HostProgram>, String>;

    /// A statement run for effect. Names it binds go into `scope`.
    fn compile_action(
        &self,
        source: &str,
        scope: &mut StaticScope<'_>,
    ) -> Result<Arc<dyn HostProgram>, String>;
}

/// A native callback seen through the [`HostProgram`] interface.
#[derive(Debug)]
pub(crate) struct NativeProgram(pub(crate) NativeHost);

impl HostProgram for NativeProgram {
    fn source(&self) -> &str {
        self.0.label()
    }

    fn run(&self, ctx: &mut HostContext<'_>) -> Result<Value, String> {
        self.0.call(&*ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_shadow_globals() {
        let globals = Environment::new().with("x", 1i64).with("y", 2i64);
        let mut locals = Locals::new();
        locals.set("x", Value::Int(10));
        let ctx = HostContext {
            grammar: "g",
            rule: "r",
            position: 0,
            globals: &globals,
            locals: &mut locals,
        };
        assert_eq!(ctx.lookup("x"), Some(Value::Int(10)));
        assert_eq!(ctx.lookup("y"), Some(Value::Int(2)));
        assert_eq!(ctx.lookup("self"), Some(Value::str("g")));
        assert_eq!(ctx.lookup("z"), None);
    }

    #[test]
    fn self_is_never_shadowed() {
        let globals = Environment::new().with("self", 5i64);
        let mut locals = Locals::new();
        locals.set("self", Value::Int(6));
        let ctx = HostContext {
            grammar: "g",
            rule: "r",
            position: 0,
            globals: &globals,
            locals: &mut locals,
        };
        assert_eq!(ctx.lookup("self"), Some(Value::str("g")));
    }

    #[test]
    fn static_scope_sees_globals_and_earlier_binds() {
        let globals = Environment::new().with("base", 10i64);
        let mut scope = StaticScope::new(&globals);
        assert!(scope.is_bound("base"));
        assert!(scope.is_bound("self"));
        assert!(!scope.is_bound("c"));
        scope.bind("c");
        assert!(scope.is_bound("c"));
    }

    #[test]
    fn native_program_reads_bindings() {
        let program = NativeProgram(NativeHost::new("double", |b: &dyn Bindings| {
            match b.lookup("n") {
                Some(Value::Int(n)) => Ok(Value::Int(n * 2)),
                _ => Err("n is not an int".to_string()),
            }
        }));
        let globals = Environment::new();
        let mut locals = Locals::new();
        locals.set("n", Value::Int(21));
        let mut ctx = HostContext {
            grammar: "g",
            rule: "r",
            position: 0,
            globals: &globals,
            locals: &mut locals,
        };
        assert_eq!(program.run(&mut ctx), Ok(Value::Int(42)));
        assert_eq!(program.source(), "double");
    }
}
