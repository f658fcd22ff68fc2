// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The default action evaluator: a small expression language over
//! [`Value`].
//!
//! Literals are integers, quoted strings, `True`/`False`/`None` and
//! `[a, b]` lists. Operators follow Python precedence: `or`, `and`, `not`,
//! comparisons, then arithmetic. `==` treats a one-character string and a
//! character as equal. Statements are `name = expr` or a bare expression.

use std::sync::Arc;

use ometa_ir::{Bindings, Value};

use super::lexer::tokenize;
use super::parser::{BinOp, Expr, Parser, Stmt, UnaryOp};
use super::{ActionEvaluator, HostContext, HostProgram, StaticScope};

/// Builtin functions with their accepted argument counts.
const BUILTINS: &[(&str, usize, usize)] = &[
    ("int", 1, 1),
    ("str", 1, 1),
    ("len", 1, 1),
    ("chr", 1, 1),
    ("ord", 1, 1),
    ("join", 1, 2),
    ("list", 0, usize::MAX),
];

const METHODS: &[&str] = &["is_digit", "is_alpha", "is_alnum", "is_space", "upper", "lower"];

const SELF_ATTRS: &[&str] = &["pos", "rule", "grammar"];

/// Longest string `text * n` may build, in bytes.
const MAX_REPEAT_LEN: usize = 1 << 24;
const REPEAT_TOO_LARGE: &str = "string repetition too large";

#[derive(Debug, Default, Clone, Copy)]
pub struct ExprEvaluator;

impl ActionEvaluator for ExprEvaluator {
    fn compile_expr(
        &self,
        source: &str,
        scope: &StaticScope<'_>,
    ) -> Result<Arc<dyn HostProgram>, String> {
        let expr = Parser::new(tokenize(source)?).parse_expr_only()?;
        check(&expr, scope)?;
        Ok(Arc::new(Compiled {
            source: source.to_string(),
            stmt: Stmt::Expr(expr),
        }))
    }

    fn compile_action(
        &self,
        source: &str,
        scope: &mut StaticScope<'_>,
    ) -> Result<Arc<dyn HostProgram>, String> {
        let stmt = Parser::new(tokenize(source)?).parse_stmt()?;
        match &stmt {
            Stmt::Assign { name, value } => {
                if name == "self" {
                    return Err("cannot assign to `self`".to_string());
                }
                check(value, scope)?;
                scope.bind(name.clone());
            }
            Stmt::Expr(expr) => check(expr, scope)?,
        }
        Ok(Arc::new(Compiled {
            source: source.to_string(),
            stmt,
        }))
    }
}

#[derive(Debug)]
struct Compiled {
    source: String,
    stmt: Stmt,
}

impl HostProgram for Compiled {
    fn source(&self) -> &str {
        &self.source
    }

    fn run(&self, ctx: &mut HostContext<'_>) -> Result<Value, String> {
        match &self.stmt {
            Stmt::Assign { name, value } => {
                let value = eval(value, ctx)?;
                ctx.locals.set(name.clone(), value);
                Ok(Value::None)
            }
            Stmt::Expr(expr) => eval(expr, ctx),
        }
    }
}

/// Reject names, calls and attributes that cannot resolve.
fn check(expr: &Expr, scope: &StaticScope<'_>) -> Result<(), String> {
    match expr {
        Expr::Lit(_) => Ok(()),
        Expr::Name(name) => {
            if scope.is_bound(name) {
                Ok(())
            } else {
                Err(format!("name `{}` is not bound at this point", name))
            }
        }
        Expr::List(items) => items.iter().try_for_each(|e| check(e, scope)),
        Expr::Unary { operand, .. } => check(operand, scope),
        Expr::Binary { left, right, .. } => {
            check(left, scope)?;
            check(right, scope)
        }
        Expr::Call { func, args } => {
            let (_, min, max) = BUILTINS
                .iter()
                .find(|(name, _, _)| name == func)
                .ok_or_else(|| format!("unknown function `{}`", func))?;
            if args.len() < *min || args.len() > *max {
                return Err(format!("`{}` does not take {} arguments", func, args.len()));
            }
            args.iter().try_for_each(|e| check(e, scope))
        }
        Expr::Method {
            receiver,
            method,
            args,
        } => {
            if !METHODS.contains(&method.as_str()) {
                return Err(format!("unknown method `{}`", method));
            }
            if !args.is_empty() {
                return Err(format!("`{}` takes no arguments", method));
            }
            check(receiver, scope)
        }
        Expr::Attr { receiver, attr } => match receiver.as_ref() {
            Expr::Name(name) if name == "self" => {
                if SELF_ATTRS.contains(&attr.as_str()) {
                    Ok(())
                } else {
                    Err(format!("`self` has no attribute `{}`", attr))
                }
            }
            _ => Err(format!("attribute `{}` is only available on `self`", attr)),
        },
        Expr::Index { receiver, index } => {
            check(receiver, scope)?;
            check(index, scope)
        }
    }
}

fn eval(expr: &Expr, ctx: &HostContext<'_>) -> Result<Value, String> {
    match expr {
        Expr::Lit(v) => Ok(v.clone()),
        Expr::Name(name) => ctx
            .lookup(name)
            .ok_or_else(|| format!("name `{}` was never bound", name)),
        Expr::List(items) => {
            let values = items
                .iter()
                .map(|e| eval(e, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::list(values))
        }
        Expr::Unary { op, operand } => {
            let v = eval(operand, ctx)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                UnaryOp::Neg => match v {
                    Value::Int(n) => n
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| "integer overflow".to_string()),
                    other => Err(format!("cannot negate {}", other.type_name())),
                },
            }
        }
        Expr::Binary { op: BinOp::Or, left, right } => {
            let l = eval(left, ctx)?;
            if l.is_truthy() {
                Ok(l)
            } else {
                eval(right, ctx)
            }
        }
        Expr::Binary { op: BinOp::And, left, right } => {
            let l = eval(left, ctx)?;
            if l.is_truthy() {
                eval(right, ctx)
            } else {
                Ok(l)
            }
        }
        Expr::Binary { op, left, right } => {
            let l = eval(left, ctx)?;
            let r = eval(right, ctx)?;
            binary(*op, &l, &r)
        }
        Expr::Call { func, args } => {
            let args = args
                .iter()
                .map(|e| eval(e, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            call_builtin(func, &args)
        }
        Expr::Method { receiver, method, .. } => {
            let v = eval(receiver, ctx)?;
            call_method(method, &v)
        }
        Expr::Attr { attr, .. } => match attr.as_str() {
            "pos" => Ok(Value::Int(ctx.position as i64)),
            "rule" => Ok(Value::str(ctx.rule)),
            "grammar" => Ok(Value::str(ctx.grammar)),
            other => Err(format!("`self` has no attribute `{}`", other)),
        },
        Expr::Index { receiver, index } => {
            let v = eval(receiver, ctx)?;
            let i = eval(index, ctx)?;
            index_value(&v, &i)
        }
    }
}

fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::Char(c) => Some(c.to_string()),
        Value::Str(s) => Some(s.to_string()),
        _ => None,
    }
}

fn binary(op: BinOp, l: &Value, r: &Value) -> Result<Value, String> {
    match op {
        BinOp::Eq => return Ok(Value::Bool(l.loose_eq(r))),
        BinOp::Ne => return Ok(Value::Bool(!l.loose_eq(r))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => return compare(op, l, r),
        _ => {}
    }
    match (op, l, r) {
        (_, Value::Int(a), Value::Int(b)) => arith(op, *a, *b),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::list(a.iter().chain(b.iter()).cloned().collect::<Vec<_>>()))
        }
        (BinOp::Add, _, _) => match (text_of(l), text_of(r)) {
            (Some(a), Some(b)) => Ok(Value::from(a + &b)),
            _ => Err(format!("cannot add {} and {}", l.type_name(), r.type_name())),
        },
        (BinOp::Mul, Value::Str(_) | Value::Char(_), Value::Int(n)) => {
            let text = text_of(l).unwrap_or_default();
            let count = usize::try_from((*n).max(0)).map_err(|_| REPEAT_TOO_LARGE.to_string())?;
            match text.len().checked_mul(count) {
                Some(total) if total <= MAX_REPEAT_LEN => Ok(Value::from(text.repeat(count))),
                _ => Err(REPEAT_TOO_LARGE.to_string()),
            }
        }
        _ => Err(format!(
            "unsupported operands {} and {}",
            l.type_name(),
            r.type_name()
        )),
    }
}

fn arith(op: BinOp, a: i64, b: i64) -> Result<Value, String> {
    let result = match op {
        BinOp::Add => a.checked_add(b),
        BinOp::Sub => a.checked_sub(b),
        BinOp::Mul => a.checked_mul(b),
        BinOp::Div | BinOp::Mod if b == 0 => return Err("division by zero".to_string()),
        BinOp::Div => a.checked_div_euclid(b),
        BinOp::Mod => a.checked_rem_euclid(b),
        _ => None,
    };
    result
        .map(Value::Int)
        .ok_or_else(|| "integer overflow".to_string())
}

fn compare(op: BinOp, l: &Value, r: &Value) -> Result<Value, String> {
    let ordering = match (l, r) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        _ => match (text_of(l), text_of(r)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => {
                return Err(format!(
                    "cannot compare {} and {}",
                    l.type_name(),
                    r.type_name()
                ))
            }
        },
    };
    Ok(Value::Bool(match op {
        BinOp::Lt => ordering.is_lt(),
        BinOp::Le => ordering.is_le(),
        BinOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    }))
}

fn call_builtin(func: &str, args: &[Value]) -> Result<Value, String> {
    match (func, args) {
        ("int", [v]) => match v {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
            _ => {
                let text = text_of(v).ok_or_else(|| format!("int() of {}", v.type_name()))?;
                text.trim()
                    .parse()
                    .map(Value::Int)
                    .map_err(|_| format!("int() of {:?}", text))
            }
        },
        ("str", [v]) => Ok(match v {
            Value::Str(_) => v.clone(),
            Value::Char(c) => Value::from(c.to_string()),
            other => Value::from(other.to_string()),
        }),
        ("len", [v]) => match v {
            Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
            Value::List(items) => Ok(Value::Int(items.len() as i64)),
            Value::Char(_) => Ok(Value::Int(1)),
            other => Err(format!("len() of {}", other.type_name())),
        },
        ("chr", [Value::Int(n)]) => u32::try_from(*n)
            .ok()
            .and_then(char::from_u32)
            .map(Value::Char)
            .ok_or_else(|| format!("chr() of {}", n)),
        ("ord", [v]) => v
            .as_char()
            .map(|c| Value::Int(c as i64))
            .ok_or_else(|| format!("ord() of {}", v.type_name())),
        ("join", [items, rest @ ..]) => {
            let sep = match rest.first() {
                Some(s) => text_of(s).ok_or_else(|| "join() separator must be text".to_string())?,
                None => String::new(),
            };
            let items = items
                .as_list()
                .ok_or_else(|| format!("join() of {}", items.type_name()))?;
            let parts: Vec<String> = items
                .iter()
                .map(|v| text_of(v).unwrap_or_else(|| v.to_string()))
                .collect();
            Ok(Value::from(parts.join(&sep)))
        }
        ("list", items) => Ok(Value::list(items.to_vec())),
        _ => Err(format!("bad call to `{}`", func)),
    }
}

fn call_method(method: &str, v: &Value) -> Result<Value, String> {
    let text = text_of(v).ok_or_else(|| format!("`{}` on {}", method, v.type_name()))?;
    let all = |test: fn(&char) -> bool| !text.is_empty() && text.chars().all(|c| test(&c));
    Ok(match method {
        "is_digit" => Value::Bool(all(char::is_ascii_digit)),
        "is_alpha" => Value::Bool(all(|c| c.is_alphabetic())),
        "is_alnum" => Value::Bool(all(|c| c.is_alphanumeric())),
        "is_space" => Value::Bool(all(|c| c.is_whitespace())),
        "upper" => case_mapped(v, text.to_uppercase()),
        "lower" => case_mapped(v, text.to_lowercase()),
        other => return Err(format!("unknown method `{}`", other)),
    })
}

/// Characters stay characters when the mapping keeps them single.
fn case_mapped(original: &Value, mapped: String) -> Value {
    if matches!(original, Value::Char(_)) {
        let mut chars = mapped.chars();
        if let (Some(c), None) = (chars.next(), chars.clone().next()) {
            return Value::Char(c);
        }
    }
    Value::from(mapped)
}

fn index_value(v: &Value, i: &Value) -> Result<Value, String> {
    let n = i
        .as_int()
        .ok_or_else(|| format!("index must be int, got {}", i.type_name()))?;
    let items: Vec<Value> = match v {
        Value::List(items) => items.to_vec(),
        Value::Str(s) => Value::chars(s),
        other => return Err(format!("cannot index {}", other.type_name())),
    };
    let len = items.len() as i64;
    let at = if n < 0 { len + n } else { n };
    if at < 0 || at >= len {
        return Err(format!("index {} out of range", n));
    }
    Ok(items[at as usize].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{Environment, Locals};

    fn run(src: &str, locals: &[(&str, Value)]) -> Result<Value, String> {
        let globals = Environment::new().with("ten", 10i64);
        let mut scope = StaticScope::new(&globals);
        let mut live = Locals::new();
        for (name, value) in locals {
            scope.bind(*name);
            live.set(*name, value.clone());
        }
        let program = ExprEvaluator.compile_expr(src, &scope)?;
        let mut ctx = HostContext {
            grammar: "calc",
            rule: "num",
            position: 3,
            globals: &globals,
            locals: &mut live,
        };
        program.run(&mut ctx)
    }

    #[test]
    fn digit_conversion() {
        assert_eq!(run("int(c) + 1", &[("c", Value::Char('3'))]), Ok(Value::Int(4)));
        assert_eq!(run("c.is_digit()", &[("c", Value::Char('3'))]), Ok(Value::Bool(true)));
        assert_eq!(run("c.is_digit()", &[("c", Value::Char('x'))]), Ok(Value::Bool(false)));
    }

    #[test]
    fn char_equals_one_char_string() {
        assert_eq!(run("c == 'a'", &[("c", Value::Char('a'))]), Ok(Value::Bool(true)));
        assert_eq!(run("c != 'a'", &[("c", Value::Char('b'))]), Ok(Value::Bool(true)));
    }

    #[test]
    fn globals_and_self_attributes() {
        assert_eq!(run("ten * 2", &[]), Ok(Value::Int(20)));
        assert_eq!(run("self.pos", &[]), Ok(Value::Int(3)));
        assert_eq!(run("self.rule", &[]), Ok(Value::str("num")));
    }

    #[test]
    fn join_and_indexing() {
        let ds = Value::from(Value::chars("42"));
        assert_eq!(run("int(join(ds))", &[("ds", ds.clone())]), Ok(Value::Int(42)));
        assert_eq!(run("ds[-1]", &[("ds", ds.clone())]), Ok(Value::Char('2')));
        assert_eq!(run("len(ds)", &[("ds", ds)]), Ok(Value::Int(2)));
        assert_eq!(run("join(['a', 'b'], '-')", &[]), Ok(Value::str("a-b")));
    }

    #[test]
    fn boolean_operators_short_circuit() {
        assert_eq!(run("None or 5", &[]), Ok(Value::Int(5)));
        assert_eq!(run("0 and 1 / 0", &[]), Ok(Value::Int(0)));
        assert_eq!(run("not []", &[]), Ok(Value::Bool(true)));
    }

    #[test]
    fn unbound_names_fail_at_compile_time() {
        let globals = Environment::new();
        let scope = StaticScope::new(&globals);
        let err = ExprEvaluator.compile_expr("x + 1", &scope).unwrap_err();
        assert!(err.contains("`x`"), "{}", err);
    }

    #[test]
    fn unknown_functions_and_arity_fail_at_compile_time() {
        let globals = Environment::new();
        let scope = StaticScope::new(&globals);
        assert!(ExprEvaluator.compile_expr("frob(1)", &scope).is_err());
        assert!(ExprEvaluator.compile_expr("int(1, 2)", &scope).is_err());
        assert!(ExprEvaluator.compile_expr("'a'.shout()", &scope).is_err());
        assert!(ExprEvaluator.compile_expr("self.input", &scope).is_err());
    }

    #[test]
    fn assignment_binds_for_later_code() {
        let globals = Environment::new();
        let mut scope = StaticScope::new(&globals);
        let assign = ExprEvaluator.compile_action("n = 6 * 7", &mut scope).unwrap();
        assert!(scope.is_bound("n"));
        let read = ExprEvaluator.compile_expr("n", &scope).unwrap();

        let mut locals = Locals::new();
        let mut ctx = HostContext {
            grammar: "g",
            rule: "r",
            position: 0,
            globals: &globals,
            locals: &mut locals,
        };
        assert_eq!(assign.run(&mut ctx), Ok(Value::None));
        assert_eq!(read.run(&mut ctx), Ok(Value::Int(42)));
    }

    #[test]
    fn runtime_errors_are_reported() {
        assert!(run("1 / 0", &[]).is_err());
        assert!(run("int('x')", &[]).is_err());
        assert!(run("[1][3]", &[]).is_err());
    }

    #[test]
    fn string_repetition_is_bounded() {
        assert_eq!(run("'ab' * 3", &[]), Ok(Value::str("ababab")));
        assert_eq!(run("'ab' * -1", &[]), Ok(Value::str("")));
        assert_eq!(
            run("'ab' * 9223372036854775807", &[]),
            Err("string repetition too large".to_string())
        );
    }

    #[test]
    fn self_cannot_be_assigned() {
        let globals = Environment::new();
        let mut scope = StaticScope::new(&globals);
        let err = ExprEvaluator.compile_action("self = 1", &mut scope).unwrap_err();
        assert!(err.contains("self"), "{}", err);
    }
}
