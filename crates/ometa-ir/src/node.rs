// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Grammar operator nodes.

use std::fmt;

use crate::{HostCode, Value};

/// Reserved rule name that turns a tagged apply into parent dispatch.
pub const SUPER_TAG: &str = "super";

/// How an `Apply` resolves its target rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dispatch {
    /// Resolve from the grammar being run, most derived first.
    Local,
    /// Resolve in the parent chain of the grammar owning the calling rule.
    Parent,
}

/// A grammar operator. Trees are built once and never mutated.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    /// One grammar unit's rules, in declaration order.
    Grammar { rules: Vec<(String, Node)> },
    /// A rule body
    Rule { body: Box<Node> },
    /// Rule invocation with evaluated arguments
    Apply {
        rule: String,
        dispatch: Dispatch,
        args: Vec<Node>,
    },
    /// Match one input item equal to the literal
    Exactly(Value),
    /// Zero or more
    Many(Box<Node>),
    /// One or more
    Many1(Box<Node>),
    /// Zero or one, never fails
    Optional(Box<Node>),
    /// Ordered choice
    Or(Vec<Node>),
    /// Negative lookahead
    Not(Box<Node>),
    /// Positive lookahead
    Lookahead(Box<Node>),
    /// Sequence; value is the last element's
    And(Vec<Node>),
    /// Store the value of `expr` in the rule's local scope
    Bind { name: String, expr: Box<Node> },
    /// Host-truthiness gate
    Predicate(Box<Node>),
    /// Host statement, run for effect
    Action(HostCode),
    /// Match against a nested list item
    ListPattern(Box<Node>),
    /// Host expression evaluated for a value
    HostExpr { name: String, code: HostCode },
}

/// Node discriminant, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Grammar,
    Rule,
    Apply,
    Exactly,
    Many,
    Many1,
    Optional,
    Or,
    Not,
    Lookahead,
    And,
    Bind,
    Predicate,
    Action,
    ListPattern,
    HostExpr,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Grammar { .. } => NodeKind::Grammar,
            Node::Rule { .. } => NodeKind::Rule,
            Node::Apply { .. } => NodeKind::Apply,
            Node::Exactly(_) => NodeKind::Exactly,
            Node::Many(_) => NodeKind::Many,
            Node::Many1(_) => NodeKind::Many1,
            Node::Optional(_) => NodeKind::Optional,
            Node::Or(_) => NodeKind::Or,
            Node::Not(_) => NodeKind::Not,
            Node::Lookahead(_) => NodeKind::Lookahead,
            Node::And(_) => NodeKind::And,
            Node::Bind { .. } => NodeKind::Bind,
            Node::Predicate(_) => NodeKind::Predicate,
            Node::Action(_) => NodeKind::Action,
            Node::ListPattern(_) => NodeKind::ListPattern,
            Node::HostExpr { .. } => NodeKind::HostExpr,
        }
    }

    /// Whether lowering this node (not its children) needs a thunk.
    pub fn needs_thunk(&self) -> bool {
        match self {
            Node::Or(alts) => alts.len() > 1,
            Node::Many(_)
            | Node::Many1(_)
            | Node::Optional(_)
            | Node::Not(_)
            | Node::Lookahead(_)
            | Node::Predicate(_)
            | Node::ListPattern(_) => true,
            _ => false,
        }
    }

    /// Direct children, in evaluation order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Grammar { rules } => rules.iter().map(|(_, body)| body).collect(),
            Node::Rule { body } => vec![body],
            Node::Apply { args, .. } => args.iter().collect(),
            Node::Many(e)
            | Node::Many1(e)
            | Node::Optional(e)
            | Node::Not(e)
            | Node::Lookahead(e)
            | Node::Predicate(e)
            | Node::ListPattern(e) => vec![e],
            Node::Bind { expr, .. } => vec![expr],
            Node::Or(items) | Node::And(items) => items.iter().collect(),
            Node::Exactly(_) | Node::Action(_) | Node::HostExpr { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Grammar => "Grammar",
            NodeKind::Rule => "Rule",
            NodeKind::Apply => "Apply",
            NodeKind::Exactly => "Exactly",
            NodeKind::Many => "Many",
            NodeKind::Many1 => "Many1",
            NodeKind::Optional => "Optional",
            NodeKind::Or => "Or",
            NodeKind::Not => "Not",
            NodeKind::Lookahead => "Lookahead",
            NodeKind::And => "And",
            NodeKind::Bind => "Bind",
            NodeKind::Predicate => "Predicate",
            NodeKind::Action => "Action",
            NodeKind::ListPattern => "ListPattern",
            NodeKind::HostExpr => "HostExpr",
        };
        write!(f, "{}", name)
    }
}

/// Short rendering used in error messages: the kind plus its inline data.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Apply { rule, dispatch: Dispatch::Local, .. } => write!(f, "Apply({})", rule),
            Node::Apply { rule, dispatch: Dispatch::Parent, .. } => write!(f, "Apply(super.{})", rule),
            Node::Exactly(v) => write!(f, "Exactly({})", v),
            Node::Bind { name, .. } => write!(f, "Bind({})", name),
            Node::Action(code) => write!(f, "Action({:?})", code.describe()),
            Node::HostExpr { name, code } => write!(f, "HostExpr({}, {:?})", name, code.describe()),
            Node::Or(alts) => write!(f, "Or[{}]", alts.len()),
            Node::And(items) => write!(f, "And[{}]", items.len()),
            other => write!(f, "{}", other.kind()),
        }
    }
}
