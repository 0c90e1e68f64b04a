//! Tokenizer for infix formulas.
//!
//! Splits formula text into parentheses, the four operators, numeric
//! literals (with optional exponent), and identifier-style variables.
//! Whitespace only delimits tokens. Anything else is rejected.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use super::formula::FormulaFormatError;

/// One of the four binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    fn from_char(c: char) -> Option<Operator> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }

    pub fn is_multiplicative(self) -> bool {
        matches!(self, Operator::Mul | Operator::Div)
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }
}

/// A validated token as stored in a parsed formula.
///
/// Numbers hold their parsed value and variables hold their normalized name,
/// so the `Display` form of a token sequence is already canonical.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,
    Op(Operator),
    Number(f64),
    Variable(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::Op(op) => write!(f, "{}", op.symbol()),
            Token::Number(n) => write!(f, "{}", n),
            Token::Variable(name) => f.write_str(name),
        }
    }
}

/// Token class produced by the tokenizer, before any grammar checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RawKind {
    LeftParen,
    RightParen,
    Op(Operator),
    Number,
    Variable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RawToken<'a> {
    pub kind: RawKind,
    pub text: &'a str,
}

/// Split `input` into raw tokens, dropping whitespace.
pub(crate) fn tokenize(input: &str) -> Result<Vec<RawToken<'_>>, FormulaFormatError> {
    let re = token_re();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(caps) = re.captures(rest) else {
            // Report the offending run up to the next whitespace.
            let bad = rest.split_whitespace().next().unwrap_or(rest);
            return Err(FormulaFormatError::InvalidToken(bad.to_string()));
        };
        let whole = caps.get(0).map_or("", |m| m.as_str());
        pos += whole.len();

        let kind = if caps.name("space").is_some() {
            continue;
        } else if caps.name("lparen").is_some() {
            RawKind::LeftParen
        } else if caps.name("rparen").is_some() {
            RawKind::RightParen
        } else if caps.name("number").is_some() {
            RawKind::Number
        } else if caps.name("var").is_some() {
            RawKind::Variable
        } else {
            match whole.chars().next().and_then(Operator::from_char) {
                Some(op) => RawKind::Op(op),
                None => return Err(FormulaFormatError::InvalidToken(whole.to_string())),
            }
        };
        tokens.push(RawToken { kind, text: whole });
    }

    Ok(tokens)
}

fn token_re() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?:(?<space>\s+)",
            r"|(?<lparen>\()",
            r"|(?<rparen>\))",
            r"|(?<op>[+\-*/])",
            r"|(?<var>[A-Za-z_][A-Za-z0-9_]*)",
            r"|(?<number>(?:[0-9]+\.[0-9]*|\.[0-9]+|[0-9]+)(?:[eE][+\-]?[0-9]+)?))",
        ))
        .expect("formula token regex must compile")
    })
}
