// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Backtracking runtime for compiled OMeta grammars.
//!
//! Compiled rules drive a [`BaseRuntime`] for everything that is not rule
//! dispatch: literal matching, the combinator drivers that invoke thunks,
//! and the primitive rules (`anything`, `digit`, ...) every grammar
//! inherits. [`StandardRuntime`] is the stock implementation.

mod error;
mod input;
mod runtime;
mod standard;

pub use error::{MatchFailure, Outcome, ParseError};
pub use input::{Input, Mark};
pub use runtime::{BaseRuntime, Thunk};
pub use standard::StandardRuntime;
