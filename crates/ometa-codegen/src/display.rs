// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Textual listings of lowered rules.

use std::fmt;

use ometa_ir::Dispatch;

use crate::lower::LoweredRule;
use crate::step::{Block, Operand, Step};

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Slot(slot) => write!(f, "{}", slot),
            Operand::Absent => write!(f, "absent"),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Apply {
                dst,
                rule,
                dispatch,
                args,
            } => {
                let prefix = match dispatch {
                    Dispatch::Local => "",
                    Dispatch::Parent => "super.",
                };
                write!(f, "{} = apply {}{}(", dst, prefix, rule)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Step::Exactly { dst, literal } => write!(f, "{} = exactly {}", dst, literal),
            Step::Choice { dst, alternatives } => {
                write!(f, "{} = choice [", dst)?;
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", alt)?;
                }
                write!(f, "]")
            }
            Step::Many { dst, body } => write!(f, "{} = many {}", dst, body),
            Step::Many1 { dst, body } => write!(f, "{} = many1 {}", dst, body),
            Step::Not { dst, body } => write!(f, "{} = not {}", dst, body),
            Step::Lookahead { dst, body } => write!(f, "{} = lookahead {}", dst, body),
            Step::Predicate { dst, body } => write!(f, "{} = pred {}", dst, body),
            Step::ListPattern { dst, body } => write!(f, "{} = list {}", dst, body),
            Step::Bind { name, value } => write!(f, "bind {} = {}", name, value),
            Step::Action { code } => write!(f, "action {{ {} }}", code.source()),
            Step::Eval { dst, name, code } => {
                write!(f, "{} = eval {} {{ {} }}", dst, name, code.source())
            }
        }
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, indent: &str) -> fmt::Result {
    for step in &block.steps {
        writeln!(f, "{}{}", indent, step)?;
    }
    writeln!(f, "{}return {}", indent, block.result)
}

impl fmt::Display for LoweredRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rule {} {{", self.name)?;
        write_block(f, &self.body, "  ")?;
        for thunk in &self.thunks {
            writeln!(f, "  {}:", thunk.id)?;
            write_block(f, &thunk.block, "    ")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use crate::host::ExprEvaluator;
    use crate::lower::lower_rule;
    use crate::scope::Environment;
    use ometa_ir::build::*;

    #[test]
    fn listing_shows_body_then_thunks() {
        let lowered = lower_rule(
            "digit",
            &rule(or_(vec![exactly('0'), exactly('1')])),
            &ExprEvaluator,
            &Environment::new(),
        )
        .unwrap();
        let expected = "\
rule digit {
  %or2 = choice [or#0, or#1]
  return %or2
  or#0:
    %exactly0 = exactly '0'
    return %exactly0
  or#1:
    %exactly1 = exactly '1'
    return %exactly1
}";
        assert_eq!(lowered.to_string(), expected);
    }

    #[test]
    fn parent_dispatch_is_marked() {
        let lowered = lower_rule(
            "digit",
            &super_apply("digit", vec![]),
            &ExprEvaluator,
            &Environment::new(),
        )
        .unwrap();
        assert!(lowered.to_string().contains("%apply0 = apply super.digit()"));
    }
}
