// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Unchecked constructors for grammar trees.
//!
//! Nothing here validates shape. An empty `or_` or `bind` over an empty
//! sequence is accepted and reported when the rule is lowered.

use crate::{Dispatch, HostCode, Node, Value, SUPER_TAG};

pub fn rule(body: Node) -> Node {
    Node::Rule { body: Box::new(body) }
}

pub fn apply(rule: impl Into<String>, args: Vec<Node>) -> Node {
    Node::Apply {
        rule: rule.into(),
        dispatch: Dispatch::Local,
        args,
    }
}

/// Invoke `rule` as defined by the parent grammar chain.
pub fn super_apply(rule: impl Into<String>, args: Vec<Node>) -> Node {
    Node::Apply {
        rule: rule.into(),
        dispatch: Dispatch::Parent,
        args,
    }
}

/// Tagged form emitted by grammar-source parsers: `rule_name` is either a
/// rule name or [`SUPER_TAG`], in which case `code_name` is the rule
/// dispatched to the parent.
pub fn apply_tagged(rule_name: &str, code_name: &str, args: Vec<Node>) -> Node {
    if rule_name == SUPER_TAG {
        super_apply(code_name, args)
    } else {
        apply(rule_name, args)
    }
}

pub fn exactly(literal: impl Into<Value>) -> Node {
    Node::Exactly(literal.into())
}

pub fn many(expr: Node) -> Node {
    Node::Many(Box::new(expr))
}

pub fn many1(expr: Node) -> Node {
    Node::Many1(Box::new(expr))
}

pub fn optional(expr: Node) -> Node {
    Node::Optional(Box::new(expr))
}

pub fn or_(alternatives: Vec<Node>) -> Node {
    Node::Or(alternatives)
}

pub fn not_(expr: Node) -> Node {
    Node::Not(Box::new(expr))
}

pub fn lookahead(expr: Node) -> Node {
    Node::Lookahead(Box::new(expr))
}

pub fn sequence(items: Vec<Node>) -> Node {
    Node::And(items)
}

pub fn bind(expr: Node, name: impl Into<String>) -> Node {
    Node::Bind {
        name: name.into(),
        expr: Box::new(expr),
    }
}

pub fn pred(expr: Node) -> Node {
    Node::Predicate(Box::new(expr))
}

pub fn action(code: impl Into<HostCode>) -> Node {
    Node::Action(code.into())
}

pub fn list_pattern(expr: Node) -> Node {
    Node::ListPattern(Box::new(expr))
}

pub fn host_expr(name: impl Into<String>, code: impl Into<HostCode>) -> Node {
    Node::HostExpr {
        name: name.into(),
        code: code.into(),
    }
}

/// Collects rules in declaration order into a `Grammar` node.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    rules: Vec<(String, Node)>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; `body` is wrapped in `Rule` unless it already is one.
    pub fn rule(mut self, name: impl Into<String>, body: Node) -> Self {
        let body = match body {
            Node::Rule { .. } => body,
            other => rule(other),
        };
        self.rules.push((name.into(), body));
        self
    }

    pub fn finish(self) -> Node {
        Node::Grammar { rules: self.rules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeKind;

    #[test]
    fn tagged_apply_with_super_targets_parent() {
        match apply_tagged(SUPER_TAG, "digit", vec![]) {
            Node::Apply { rule, dispatch, .. } => {
                assert_eq!(rule, "digit");
                assert_eq!(dispatch, Dispatch::Parent);
            }
            other => panic!("expected Apply, got {}", other),
        }
        match apply_tagged("digit", "digit", vec![]) {
            Node::Apply { dispatch, .. } => assert_eq!(dispatch, Dispatch::Local),
            other => panic!("expected Apply, got {}", other),
        }
    }

    #[test]
    fn empty_shapes_are_accepted() {
        assert_eq!(or_(vec![]).kind(), NodeKind::Or);
        assert_eq!(bind(sequence(vec![]), "x").kind(), NodeKind::Bind);
    }

    #[test]
    fn grammar_builder_keeps_order_and_wraps_rules() {
        let g = GrammarBuilder::new()
            .rule("b", exactly('b'))
            .rule("a", rule(exactly('a')))
            .finish();
        let Node::Grammar { rules } = g else { panic!("expected grammar") };
        let names: Vec<_> = rules.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert!(rules.iter().all(|(_, body)| body.kind() == NodeKind::Rule));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn trees_serialize_to_json() {
        let tree = sequence(vec![bind(apply("digit", vec![]), "d"), host_expr("r", "d + 1")]);
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.contains("\"digit\""));
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), NodeKind::And);
    }
}
