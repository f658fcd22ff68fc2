// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! OMeta grammar compiler.
//!
//! Each rule of a grammar tree is lowered into a flat sequence of typed
//! steps ending in one value. Backtracking combinators get their operands
//! as thunks: nested step blocks the base runtime drivers invoke, and
//! re-invoke, on demand. The assembler wraps lowered rules into a grammar
//! unit attached to a base runtime and a parent chain, and registers it.
//!
//! ```text
//! Node::Grammar ──lower──► LoweredRule ──► CompiledRule ──► Grammar ──► GrammarRegistry
//!                                                            │
//!                                                            └─ parser(input).apply(rule)
//! ```

mod assemble;
mod config;
mod display;
mod error;
mod exec;
mod grammar;
pub mod host;
pub mod lower;
mod registry;
mod rule;
mod scope;
pub mod step;
pub mod symbol;

pub use assemble::GrammarAssembler;
pub use config::CompilerConfig;
pub use error::{BuildError, LoweringError};
pub use grammar::{Grammar, GrammarHandle, Parser};
pub use host::{ActionEvaluator, ExprEvaluator};
pub use lower::{lower_rule, LoweredRule};
pub use registry::GrammarRegistry;
pub use rule::CompiledRule;
pub use scope::{Environment, Locals, ScopeSnapshot, ScopeTrace};
