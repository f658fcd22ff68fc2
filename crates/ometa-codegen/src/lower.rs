// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Rule lowering: grammar tree to straight-line steps plus thunks.
//!
//! Each node lowers to an [`Operand`] naming its value. Non-backtracking
//! nodes emit their steps inline, in evaluation order. The operand of a
//! backtracking combinator is lowered into a separate thunk block, so the
//! base runtime driver decides when, and how often, it runs.

use std::sync::Arc;

use ometa_ir::{Dispatch, HostCode, Node};

use crate::error::{BuildError, LoweringError};
use crate::host::{ActionEvaluator, HostProgram, NativeProgram, StaticScope};
use crate::scope::Environment;
use crate::step::{Block, Operand, Step, ThunkDef};
use crate::symbol::{SymbolAllocator, ThunkId};

/// One rule, lowered.
#[derive(Debug, Clone)]
pub struct LoweredRule {
    pub name: String,
    pub body: Block,
    /// Indexed by `ThunkId::index`.
    pub thunks: Vec<ThunkDef>,
    pub slot_count: usize,
    /// Targets of parent-dispatched applies, in first-use order.
    pub parent_calls: Vec<String>,
}

impl LoweredRule {
    pub fn thunk(&self, id: ThunkId) -> &ThunkDef {
        &self.thunks[id.index()]
    }

    /// Steps in the body and every thunk.
    pub fn step_count(&self) -> usize {
        self.body.steps.len() + self.thunks.iter().map(|t| t.block.steps.len()).sum::<usize>()
    }
}

/// Lower one rule body.
///
/// `node` is the rule's `Rule` node or a bare body. Host code is compiled
/// through `evaluator` as it is reached, so it sees exactly the names bound
/// before it in evaluation order.
pub fn lower_rule(
    name: &str,
    node: &Node,
    evaluator: &dyn ActionEvaluator,
    globals: &Environment,
) -> Result<LoweredRule, BuildError> {
    let body = match node {
        Node::Rule { body } => body.as_ref(),
        other => other,
    };

    let mut lowerer = RuleLowerer {
        rule: name,
        evaluator,
        symbols: SymbolAllocator::new(),
        scope: StaticScope::new(globals),
        steps: Vec::new(),
        thunks: Vec::new(),
        parent_calls: Vec::new(),
    };
    let result = lowerer.lower(body)?;

    let lowered = LoweredRule {
        name: name.to_string(),
        body: Block {
            steps: lowerer.steps,
            result,
        },
        thunks: lowerer.thunks,
        slot_count: lowerer.symbols.slot_count(),
        parent_calls: lowerer.parent_calls,
    };
    tracing::trace!(
        rule = name,
        steps = lowered.step_count(),
        thunks = lowered.thunks.len(),
        "lowered rule"
    );
    Ok(lowered)
}

struct RuleLowerer<'a> {
    rule: &'a str,
    evaluator: &'a dyn ActionEvaluator,
    symbols: SymbolAllocator,
    scope: StaticScope<'a>,
    /// Steps of the block being built; swapped out while a thunk is lowered.
    steps: Vec<Step>,
    thunks: Vec<ThunkDef>,
    parent_calls: Vec<String>,
}

impl<'a> RuleLowerer<'a> {
    fn lower(&mut self, node: &Node) -> Result<Operand, BuildError> {
        match node {
            Node::Grammar { .. } | Node::Rule { .. } => {
                Err(self.error(LoweringError::UnexpectedNode(node.kind())))
            }

            Node::Apply {
                rule,
                dispatch,
                args,
            } => {
                let args = args
                    .iter()
                    .map(|arg| self.lower(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                if *dispatch == Dispatch::Parent && !self.parent_calls.contains(rule) {
                    self.parent_calls.push(rule.clone());
                }
                let dst = self.symbols.slot("apply");
                self.steps.push(Step::Apply {
                    dst,
                    rule: rule.clone(),
                    dispatch: *dispatch,
                    args,
                });
                Ok(Operand::Slot(dst))
            }

            Node::Exactly(literal) => {
                let dst = self.symbols.slot("exactly");
                self.steps.push(Step::Exactly {
                    dst,
                    literal: literal.clone(),
                });
                Ok(Operand::Slot(dst))
            }

            Node::Or(alternatives) => match alternatives.as_slice() {
                [] => Err(self.error(LoweringError::EmptyChoice)),
                [only] => self.lower(only),
                _ => {
                    let alternatives = alternatives
                        .iter()
                        .map(|alt| self.lower_thunk("or", alt))
                        .collect::<Result<Vec<_>, _>>()?;
                    let dst = self.symbols.slot("or");
                    self.steps.push(Step::Choice { dst, alternatives });
                    Ok(Operand::Slot(dst))
                }
            },

            Node::Optional(expr) => {
                let present = self.lower_thunk("optional", expr)?;
                let absent = self.push_thunk("optional", Block::absent());
                let dst = self.symbols.slot("optional");
                self.steps.push(Step::Choice {
                    dst,
                    alternatives: vec![present, absent],
                });
                Ok(Operand::Slot(dst))
            }

            Node::Many(expr) => {
                let body = self.lower_thunk("many", expr)?;
                let dst = self.symbols.slot("many");
                self.steps.push(Step::Many { dst, body });
                Ok(Operand::Slot(dst))
            }

            Node::Many1(expr) => {
                let body = self.lower_thunk("many1", expr)?;
                let dst = self.symbols.slot("many1");
                self.steps.push(Step::Many1 { dst, body });
                Ok(Operand::Slot(dst))
            }

            Node::Not(expr) => {
                let body = self.lower_thunk("not", expr)?;
                let dst = self.symbols.slot("not");
                self.steps.push(Step::Not { dst, body });
                Ok(Operand::Slot(dst))
            }

            Node::Lookahead(expr) => {
                let body = self.lower_thunk("lookahead", expr)?;
                let dst = self.symbols.slot("lookahead");
                self.steps.push(Step::Lookahead { dst, body });
                Ok(Operand::Slot(dst))
            }

            Node::Predicate(expr) => {
                let body = self.lower_thunk("pred", expr)?;
                let dst = self.symbols.slot("pred");
                self.steps.push(Step::Predicate { dst, body });
                Ok(Operand::Slot(dst))
            }

            Node::ListPattern(expr) => {
                let body = self.lower_thunk("list", expr)?;
                let dst = self.symbols.slot("list");
                self.steps.push(Step::ListPattern { dst, body });
                Ok(Operand::Slot(dst))
            }

            Node::And(items) => {
                let mut result = Operand::Absent;
                for item in items {
                    result = self.lower(item)?;
                }
                Ok(result)
            }

            Node::Bind { name, expr } => {
                if matches!(expr.as_ref(), Node::And(items) if items.is_empty()) {
                    return Err(self.error(LoweringError::EmptyBind(name.clone())));
                }
                if name == "self" {
                    return Err(self.error(LoweringError::ReservedName(name.clone())));
                }
                let value = self.lower(expr)?;
                self.steps.push(Step::Bind {
                    name: name.clone(),
                    value,
                });
                self.scope.bind(name.clone());
                Ok(value)
            }

            Node::Action(code) => {
                let code = self.compile(node, code, None)?;
                self.steps.push(Step::Action { code });
                Ok(Operand::Absent)
            }

            Node::HostExpr { name, code } => {
                let program = self.compile(node, code, Some(name))?;
                let dst = self.symbols.slot("expr");
                self.steps.push(Step::Eval {
                    dst,
                    name: name.clone(),
                    code: program,
                });
                Ok(Operand::Slot(dst))
            }
        }
    }

    /// Lower `node` into its own block and register it as a thunk.
    fn lower_thunk(&mut self, kind: &'static str, node: &Node) -> Result<ThunkId, BuildError> {
        let outer = std::mem::take(&mut self.steps);
        let result = self.lower(node);
        let steps = std::mem::replace(&mut self.steps, outer);
        let result = result?;
        Ok(self.push_thunk(kind, Block { steps, result }))
    }

    fn push_thunk(&mut self, kind: &'static str, block: Block) -> ThunkId {
        let id = self.symbols.thunk(kind);
        self.thunks.push(ThunkDef { id, block });
        id
    }

    /// Compile host code. `expr_name` is set for value-producing nodes.
    fn compile(
        &mut self,
        node: &Node,
        code: &HostCode,
        expr_name: Option<&String>,
    ) -> Result<Arc<dyn HostProgram>, BuildError> {
        let compiled = match code {
            HostCode::Native(native) => return Ok(Arc::new(NativeProgram(native.clone()))),
            HostCode::Source(source) => match expr_name {
                Some(_) => self.evaluator.compile_expr(source, &self.scope),
                None => self.evaluator.compile_action(source, &mut self.scope),
            },
        };
        compiled.map_err(|message| BuildError::HostExpression {
            rule: self.rule.to_string(),
            node: node.to_string(),
            message,
        })
    }

    fn error(&self, source: LoweringError) -> BuildError {
        BuildError::Lowering {
            rule: self.rule.to_string(),
            source,
        }
    }
}
