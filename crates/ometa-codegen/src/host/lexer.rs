// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tokenizer for host expressions.

use logos::Logos;

/// Raw token type for logos; literal values are parsed in a second pass.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("True")]
    #[token("true")]
    True,
    #[token("False")]
    #[token("false")]
    False,
    #[token("None")]
    #[token("none")]
    NoneLit,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[regex(r"[0-9]+")]
    Int,
    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    Str,
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    And,
    Or,
    Not,
    Bool(bool),
    NoneLit,
    EqEq,
    NotEq,
    LtEq,
    GtEq,
    Lt,
    Gt,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Int(i64),
    Str(String),
    Ident(String),
    Eof,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Int(n) => n.to_string(),
            Token::Str(s) => format!("{:?}", s),
            Token::Ident(name) => format!("`{}`", name),
            Token::Bool(true) => "True".to_string(),
            Token::Bool(false) => "False".to_string(),
            Token::Eof => "end of code".to_string(),
            other => format!("{:?}", other),
        }
    }
}

/// Tokenize host source. The result always ends with `Token::Eof`.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let slice = lexer.slice();
        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                let ch = source[span.start..].chars().next().unwrap_or('?');
                return Err(format!("unexpected character '{}' at offset {}", ch, span.start));
            }
        };
        tokens.push(convert(raw, slice)?);
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

fn convert(raw: RawToken, slice: &str) -> Result<Token, String> {
    Ok(match raw {
        RawToken::And => Token::And,
        RawToken::Or => Token::Or,
        RawToken::Not => Token::Not,
        RawToken::True => Token::Bool(true),
        RawToken::False => Token::Bool(false),
        RawToken::NoneLit => Token::NoneLit,
        RawToken::EqEq => Token::EqEq,
        RawToken::NotEq => Token::NotEq,
        RawToken::LtEq => Token::LtEq,
        RawToken::GtEq => Token::GtEq,
        RawToken::Lt => Token::Lt,
        RawToken::Gt => Token::Gt,
        RawToken::Assign => Token::Assign,
        RawToken::Plus => Token::Plus,
        RawToken::Minus => Token::Minus,
        RawToken::Star => Token::Star,
        RawToken::Slash => Token::Slash,
        RawToken::Percent => Token::Percent,
        RawToken::Dot => Token::Dot,
        RawToken::Comma => Token::Comma,
        RawToken::LParen => Token::LParen,
        RawToken::RParen => Token::RParen,
        RawToken::LBracket => Token::LBracket,
        RawToken::RBracket => Token::RBracket,
        RawToken::Int => Token::Int(
            slice
                .parse()
                .map_err(|_| format!("integer literal {} is out of range", slice))?,
        ),
        RawToken::Str => Token::Str(unescape(&slice[1..slice.len() - 1])?),
        RawToken::Ident => Token::Ident(slice.to_string()),
    })
}

fn unescape(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '\'' | '"')) => out.push(c),
            Some(other) => return Err(format!("unknown escape '\\{}'", other)),
            None => return Err("dangling escape".to_string()),
        }
    }
    Ok(out)
}
