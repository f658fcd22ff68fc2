// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Step execution.
//!
//! A [`Machine`] runs rules for one parser call. Rule dispatch happens
//! here; literal matching and every combinator go to the base runtime of
//! the grammar being run, with thunk blocks passed in as closures.

use ometa_ir::{Dispatch, Value};
use ometa_runtime::{BaseRuntime, Input, Outcome, ParseError};

use crate::grammar::Grammar;
use crate::host::{HostContext, HostProgram};
use crate::rule::CompiledRule;
use crate::scope::{Locals, ScopeSnapshot, ScopeTrace};
use crate::step::{Block, Operand, Step};
use crate::symbol::Slot;

/// One live rule invocation.
pub(crate) struct Activation<'a> {
    owner: &'a Grammar,
    rule: &'a CompiledRule,
    frame: Vec<Value>,
    locals: Locals,
    order: u64,
}

impl<'a> Activation<'a> {
    pub(crate) fn new(
        owner: &'a Grammar,
        rule: &'a CompiledRule,
        slots: usize,
        order: u64,
    ) -> Self {
        Self {
            owner,
            rule,
            frame: vec![Value::None; slots],
            locals: Locals::new(),
            order,
        }
    }

    fn read(&self, operand: &Operand) -> Value {
        match operand {
            Operand::Slot(slot) => self.frame[slot.index()].clone(),
            Operand::Absent => Value::None,
        }
    }

    fn write(&mut self, slot: Slot, value: Value) {
        self.frame[slot.index()] = value;
    }
}

pub(crate) struct Machine<'a> {
    /// The grammar the parser was created for; local dispatch starts here.
    receiver: &'a Grammar,
    trace: &'a mut ScopeTrace,
    depth: usize,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(receiver: &'a Grammar, trace: &'a mut ScopeTrace) -> Self {
        Self {
            receiver,
            trace,
            depth: 0,
        }
    }

    fn base(&self) -> &'a dyn BaseRuntime {
        let receiver: &'a Grammar = self.receiver;
        receiver.base_runtime()
    }

    /// Resolve and run a rule. `caller` is the grammar that defined the
    /// calling rule; parent dispatch starts at its parent.
    pub(crate) fn apply(
        &mut self,
        caller: &'a Grammar,
        name: &str,
        dispatch: Dispatch,
        args: &[Value],
        input: &mut Input,
    ) -> Outcome {
        let found = match dispatch {
            Dispatch::Local => self.receiver.resolve(name),
            Dispatch::Parent => caller.parent_grammar().and_then(|p| p.resolve(name)),
        };
        if let Some((owner, rule)) = found {
            return self.invoke(owner, rule, args, input);
        }

        let base = self.base();
        if base.has_rule(name) {
            self.enter()?;
            let result = base.apply_rule(name, args, input);
            self.depth -= 1;
            return result;
        }

        Err(match dispatch {
            Dispatch::Local => ParseError::UnknownRule(name.to_string()),
            Dispatch::Parent => ParseError::Dispatch {
                grammar: caller.name().to_string(),
                rule: name.to_string(),
            },
        })
    }

    fn invoke(
        &mut self,
        owner: &'a Grammar,
        rule: &'a CompiledRule,
        args: &[Value],
        input: &mut Input,
    ) -> Outcome {
        self.enter()?;
        if !args.is_empty() {
            input.push_args(args);
        }
        let result = rule.invoke(self, owner, input);
        self.depth -= 1;
        result
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        let limit = self.receiver.config().max_depth;
        if self.depth >= limit {
            return Err(ParseError::RecursionLimit(limit));
        }
        self.depth += 1;
        Ok(())
    }

    /// Order stamp for a rule invocation starting now.
    pub(crate) fn begin(&mut self) -> u64 {
        self.trace.begin()
    }

    pub(crate) fn record(&mut self, activation: Activation<'a>, matched: bool) {
        if !self.receiver.config().trace_scopes {
            return;
        }
        self.trace.record(
            activation.rule.name(),
            activation.order,
            ScopeSnapshot {
                grammar: activation.owner.name().to_string(),
                locals: activation.locals,
                matched,
            },
        );
    }

    pub(crate) fn run_block(
        &mut self,
        act: &mut Activation<'a>,
        block: &'a Block,
        input: &mut Input,
    ) -> Outcome {
        for step in &block.steps {
            self.run_step(act, step, input)?;
        }
        Ok(act.read(&block.result))
    }

    /// A thunk body counts against the depth limit like a rule call.
    fn run_thunk(
        &mut self,
        act: &mut Activation<'a>,
        block: &'a Block,
        input: &mut Input,
    ) -> Outcome {
        self.enter()?;
        let result = self.run_block(act, block, input);
        self.depth -= 1;
        result
    }

    fn run_step(&mut self, act: &mut Activation<'a>, step: &'a Step, input: &mut Input) -> Outcome {
        let base = self.base();
        let rule = act.rule;
        let value = match step {
            Step::Apply {
                rule: target,
                dispatch,
                args,
                ..
            } => {
                let args: Vec<Value> = args.iter().map(|a| act.read(a)).collect();
                self.apply(act.owner, target, *dispatch, &args, input)?
            }
            Step::Exactly { literal, .. } => base.exactly(literal, input)?,
            Step::Choice { alternatives, .. } => {
                base.choice(input, alternatives.len(), &mut |inp: &mut Input, i: usize| {
                    self.run_thunk(act, rule.thunk_block(alternatives[i]), inp)
                })?
            }
            Step::Many { body, .. } => {
                let block = rule.thunk_block(*body);
                base.many(input, &mut |inp: &mut Input| self.run_thunk(act, block, inp))?
            }
            Step::Many1 { body, .. } => {
                let block = rule.thunk_block(*body);
                base.many1(input, &mut |inp: &mut Input| self.run_thunk(act, block, inp))?
            }
            Step::Not { body, .. } => {
                let block = rule.thunk_block(*body);
                base.not(input, &mut |inp: &mut Input| self.run_thunk(act, block, inp))?
            }
            Step::Lookahead { body, .. } => {
                let block = rule.thunk_block(*body);
                base.lookahead(input, &mut |inp: &mut Input| self.run_thunk(act, block, inp))?
            }
            Step::Predicate { body, .. } => {
                let block = rule.thunk_block(*body);
                base.pred(input, &mut |inp: &mut Input| self.run_thunk(act, block, inp))?
            }
            Step::ListPattern { body, .. } => {
                let block = rule.thunk_block(*body);
                base.list_pattern(input, &mut |inp: &mut Input| self.run_thunk(act, block, inp))?
            }
            Step::Bind { name, value } => {
                let value = act.read(value);
                act.locals.set(name.clone(), value.clone());
                return Ok(value);
            }
            Step::Action { code } => {
                Self::run_host(act, code.as_ref(), input)?;
                return Ok(Value::None);
            }
            Step::Eval { code, .. } => Self::run_host(act, code.as_ref(), input)?,
        };
        if let Some(dst) = step.dst() {
            act.write(dst, value.clone());
        }
        Ok(value)
    }

    fn run_host(
        act: &mut Activation<'a>,
        code: &dyn HostProgram,
        input: &Input,
    ) -> Outcome {
        let mut ctx = HostContext {
            grammar: act.owner.name(),
            rule: act.rule.name(),
            position: input.position(),
            globals: act.owner.globals(),
            locals: &mut act.locals,
        };
        code.run(&mut ctx).map_err(|message| ParseError::Host {
            rule: act.rule.name().to_string(),
            message,
        })
    }
}
