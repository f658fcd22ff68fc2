// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Build-time errors.
//!
//! Anything here aborts the whole grammar build; nothing is registered.
//! Match failures at parse time are `ometa_runtime::ParseError`.

use ometa_ir::NodeKind;
use thiserror::Error;

/// A rule body that cannot be lowered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoweringError {
    #[error("Or needs at least one alternative")]
    EmptyChoice,

    #[error("Bind `{0}` wraps an empty sequence")]
    EmptyBind(String),

    #[error("{0} node cannot appear inside a rule body")]
    UnexpectedNode(NodeKind),

    #[error("rule is defined more than once")]
    DuplicateRule,

    #[error("`{0}` is reserved and cannot be bound")]
    ReservedName(String),
}

#[derive(Debug, Clone, Error)]
pub enum BuildError {
    #[error("rule `{rule}`: {source}")]
    Lowering {
        rule: String,
        #[source]
        source: LoweringError,
    },

    #[error("rule `{rule}`: host code in {node} does not compile: {message}")]
    HostExpression {
        rule: String,
        node: String,
        message: String,
    },

    #[error("rule `{rule}` calls `super.{target}`, but no parent of grammar `{grammar}` defines it")]
    DispatchResolution {
        grammar: String,
        rule: String,
        target: String,
    },

    #[error("grammar `{grammar}` extends `{parent}`, which is not registered")]
    UnknownParent { grammar: String, parent: String },

    #[error("expected a Grammar node, found {0}")]
    NotAGrammar(NodeKind),
}

impl BuildError {
    /// The rule the error was raised for, if it concerns one.
    pub fn rule(&self) -> Option<&str> {
        match self {
            BuildError::Lowering { rule, .. }
            | BuildError::HostExpression { rule, .. }
            | BuildError::DispatchResolution { rule, .. } => Some(rule),
            BuildError::UnknownParent { .. } | BuildError::NotAGrammar(_) => None,
        }
    }
}
