// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Pratt parser for host expressions and statements.

use ometa_ir::Value;

use super::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Lit(Value),
    Name(String),
    List(Vec<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Builtin function call; only plain names are callable.
    Call {
        func: String,
        args: Vec<Expr>,
    },
    Method {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Attr {
        receiver: Box<Expr>,
        attr: String,
    },
    Index {
        receiver: Box<Expr>,
        index: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    Assign { name: String, value: Expr },
    Expr(Expr),
}

const NOT_BP: u8 = 5;
const NEG_BP: u8 = 13;
const POSTFIX_BP: u8 = 15;

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// A whole expression, nothing after it.
    pub(crate) fn parse_expr_only(mut self) -> Result<Expr, String> {
        let expr = self.parse_expr_bp(0)?;
        self.expect_end()?;
        Ok(expr)
    }

    /// `name = expr` or a bare expression.
    pub(crate) fn parse_stmt(mut self) -> Result<Stmt, String> {
        let stmt = match (self.current(), self.tokens.get(self.pos + 1)) {
            (Token::Ident(name), Some(Token::Assign)) => {
                let name = name.clone();
                self.pos += 2;
                Stmt::Assign {
                    name,
                    value: self.parse_expr_bp(0)?,
                }
            }
            _ => Stmt::Expr(self.parse_expr_bp(0)?),
        };
        self.expect_end()?;
        Ok(stmt)
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn expect(&mut self, token: Token) -> Result<(), String> {
        if self.check(&token) {
            self.advance();
            Ok(())
        } else {
            Err(format!(
                "expected {}, found {}",
                token.describe(),
                self.current().describe()
            ))
        }
    }

    fn expect_end(&self) -> Result<(), String> {
        match self.current() {
            Token::Eof => Ok(()),
            other => Err(format!("unexpected {} after expression", other.describe())),
        }
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, String> {
        let mut lhs = self.parse_prefix()?;

        loop {
            if self.postfix_starts() {
                if POSTFIX_BP < min_bp {
                    break;
                }
                lhs = self.parse_postfix(lhs)?;
                continue;
            }

            if let Some((l_bp, r_bp, op)) = self.infix_bp() {
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let rhs = self.parse_expr_bp(r_bp)?;
                lhs = Expr::Binary {
                    op,
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                };
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Token::Int(n) => Ok(Expr::Lit(Value::Int(n))),
            Token::Str(s) => Ok(Expr::Lit(Value::from(s))),
            Token::Bool(b) => Ok(Expr::Lit(Value::Bool(b))),
            Token::NoneLit => Ok(Expr::Lit(Value::None)),
            Token::Ident(name) => {
                if self.check(&Token::LParen) {
                    self.advance();
                    let args = self.parse_args(Token::RParen)?;
                    Ok(Expr::Call { func: name, args })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Token::Minus => Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.parse_expr_bp(NEG_BP)?),
            }),
            Token::Not => Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(self.parse_expr_bp(NOT_BP)?),
            }),
            Token::LParen => {
                let inner = self.parse_expr_bp(0)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => Ok(Expr::List(self.parse_args(Token::RBracket)?)),
            other => Err(format!("expected an expression, found {}", other.describe())),
        }
    }

    fn postfix_starts(&self) -> bool {
        matches!(self.current(), Token::Dot | Token::LBracket)
    }

    fn parse_postfix(&mut self, lhs: Expr) -> Result<Expr, String> {
        match self.advance() {
            Token::Dot => {
                let name = match self.advance() {
                    Token::Ident(name) => name,
                    other => {
                        return Err(format!("expected a name after '.', found {}", other.describe()))
                    }
                };
                if self.check(&Token::LParen) {
                    self.advance();
                    let args = self.parse_args(Token::RParen)?;
                    Ok(Expr::Method {
                        receiver: Box::new(lhs),
                        method: name,
                        args,
                    })
                } else {
                    Ok(Expr::Attr {
                        receiver: Box::new(lhs),
                        attr: name,
                    })
                }
            }
            _ => {
                let index = self.parse_expr_bp(0)?;
                self.expect(Token::RBracket)?;
                Ok(Expr::Index {
                    receiver: Box::new(lhs),
                    index: Box::new(index),
                })
            }
        }
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    fn parse_args(&mut self, close: Token) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        while !self.check(&close) {
            args.push(self.parse_expr_bp(0)?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(close)?;
        Ok(args)
    }

    fn infix_bp(&self) -> Option<(u8, u8, BinOp)> {
        let entry = match self.current() {
            Token::Or => (1, 2, BinOp::Or),
            Token::And => (3, 4, BinOp::And),
            Token::EqEq => (7, 8, BinOp::Eq),
            Token::NotEq => (7, 8, BinOp::Ne),
            Token::Lt => (7, 8, BinOp::Lt),
            Token::LtEq => (7, 8, BinOp::Le),
            Token::Gt => (7, 8, BinOp::Gt),
            Token::GtEq => (7, 8, BinOp::Ge),
            Token::Plus => (9, 10, BinOp::Add),
            Token::Minus => (9, 10, BinOp::Sub),
            Token::Star => (11, 12, BinOp::Mul),
            Token::Slash => (11, 12, BinOp::Div),
            Token::Percent => (11, 12, BinOp::Mod),
            _ => return None,
        };
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::lexer::tokenize;

    fn expr(src: &str) -> Expr {
        Parser::new(tokenize(src).unwrap()).parse_expr_only().unwrap()
    }

    fn name(n: &str) -> Box<Expr> {
        Box::new(Expr::Name(n.into()))
    }

    #[test]
    fn multiplication_binds_tighter() {
        assert_eq!(
            expr("a + b * c"),
            Expr::Binary {
                op: BinOp::Add,
                left: name("a"),
                right: Box::new(Expr::Binary {
                    op: BinOp::Mul,
                    left: name("b"),
                    right: name("c"),
                }),
            }
        );
    }

    #[test]
    fn not_is_looser_than_comparison() {
        assert_eq!(
            expr("not a == b"),
            Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(Expr::Binary {
                    op: BinOp::Eq,
                    left: name("a"),
                    right: name("b"),
                }),
            }
        );
    }

    #[test]
    fn method_calls_chain() {
        assert_eq!(
            expr("c.lower().is_alpha()"),
            Expr::Method {
                receiver: Box::new(Expr::Method {
                    receiver: name("c"),
                    method: "lower".into(),
                    args: vec![],
                }),
                method: "is_alpha".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn assignment_statement() {
        let stmt = Parser::new(tokenize("n = int(d) * 10").unwrap())
            .parse_stmt()
            .unwrap();
        assert!(matches!(stmt, Stmt::Assign { ref name, .. } if name == "n"));
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        assert!(Parser::new(tokenize("a b").unwrap()).parse_expr_only().is_err());
        assert!(Parser::new(tokenize("f(a,").unwrap()).parse_expr_only().is_err());
    }
}
