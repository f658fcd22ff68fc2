// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lowered rule steps.
//!
//! A rule body lowers to a [`Block`]: straight-line steps, each storing its
//! value in a fresh slot, and a result operand. Operands of backtracking
//! combinators are never inlined; they are [`ThunkDef`]s the combinator
//! step refers to by id.

use std::sync::Arc;

use ometa_ir::{Dispatch, Value};

use crate::host::HostProgram;
use crate::symbol::{Slot, ThunkId};

/// A step input: a slot written by an earlier step, or the absent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Slot(Slot),
    Absent,
}

#[derive(Debug, Clone)]
pub enum Step {
    /// Invoke a rule with evaluated arguments.
    Apply {
        dst: Slot,
        rule: String,
        dispatch: Dispatch,
        args: Vec<Operand>,
    },
    Exactly {
        dst: Slot,
        literal: Value,
    },
    /// Ordered choice over thunked alternatives.
    Choice {
        dst: Slot,
        alternatives: Vec<ThunkId>,
    },
    Many {
        dst: Slot,
        body: ThunkId,
    },
    Many1 {
        dst: Slot,
        body: ThunkId,
    },
    Not {
        dst: Slot,
        body: ThunkId,
    },
    Lookahead {
        dst: Slot,
        body: ThunkId,
    },
    Predicate {
        dst: Slot,
        body: ThunkId,
    },
    ListPattern {
        dst: Slot,
        body: ThunkId,
    },
    /// Store a value under a name in the invocation's local scope.
    Bind {
        name: String,
        value: Operand,
    },
    /// Run host code for effect.
    Action {
        code: Arc<dyn HostProgram>,
    },
    /// Evaluate host code for a value.
    Eval {
        dst: Slot,
        name: String,
        code: Arc<dyn HostProgram>,
    },
}

impl Step {
    /// The slot this step writes, if any.
    pub fn dst(&self) -> Option<Slot> {
        match self {
            Step::Apply { dst, .. }
            | Step::Exactly { dst, .. }
            | Step::Choice { dst, .. }
            | Step::Many { dst, .. }
            | Step::Many1 { dst, .. }
            | Step::Not { dst, .. }
            | Step::Lookahead { dst, .. }
            | Step::Predicate { dst, .. }
            | Step::ListPattern { dst, .. }
            | Step::Eval { dst, .. } => Some(*dst),
            Step::Bind { .. } | Step::Action { .. } => None,
        }
    }

    /// Thunks this step hands to a combinator driver.
    pub fn thunks(&self) -> Vec<ThunkId> {
        match self {
            Step::Choice { alternatives, .. } => alternatives.clone(),
            Step::Many { body, .. }
            | Step::Many1 { body, .. }
            | Step::Not { body, .. }
            | Step::Lookahead { body, .. }
            | Step::Predicate { body, .. }
            | Step::ListPattern { body, .. } => vec![*body],
            _ => Vec::new(),
        }
    }
}

/// Straight-line steps and the operand holding their value.
#[derive(Debug, Clone)]
pub struct Block {
    pub steps: Vec<Step>,
    pub result: Operand,
}

impl Block {
    pub fn absent() -> Self {
        Self {
            steps: Vec::new(),
            result: Operand::Absent,
        }
    }
}

/// A deferred block, stored at `id.index()` in its rule's thunk table.
#[derive(Debug, Clone)]
pub struct ThunkDef {
    pub id: ThunkId,
    pub block: Block,
}
