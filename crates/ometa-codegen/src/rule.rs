// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Invocable rules.

use std::fmt;

use ometa_runtime::{Input, Outcome};

use crate::exec::{Activation, Machine};
use crate::grammar::Grammar;
use crate::lower::LoweredRule;
use crate::step::Block;
use crate::symbol::ThunkId;

/// A lowered rule ready to run. Every invocation gets a fresh frame and a
/// fresh local scope; nothing carries over between calls.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    lowered: LoweredRule,
}

impl CompiledRule {
    pub fn new(lowered: LoweredRule) -> Self {
        Self { lowered }
    }

    pub fn name(&self) -> &str {
        &self.lowered.name
    }

    pub fn lowered(&self) -> &LoweredRule {
        &self.lowered
    }

    pub(crate) fn thunk_block(&self, id: ThunkId) -> &Block {
        &self.lowered.thunk(id).block
    }

    /// Run the rule with `owner` as its defining grammar. Arguments have
    /// already been pushed onto `input` by the caller.
    pub(crate) fn invoke<'a>(
        &'a self,
        machine: &mut Machine<'a>,
        owner: &'a Grammar,
        input: &mut Input,
    ) -> Outcome {
        let order = machine.begin();
        let mut activation = Activation::new(owner, self, self.lowered.slot_count, order);
        let result = machine.run_block(&mut activation, &self.lowered.body, input);
        machine.record(activation, result.is_ok());
        result
    }
}

impl fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lowered)
    }
}
