//! Parsed infix formulas.
//!
//! A [`Formula`] is built once from text, validated against the expression
//! grammar, and stored as an immutable canonical token sequence. Variables
//! are normalized at construction time, numbers are kept as parsed values,
//! so two formulas compare equal exactly when their canonical strings do.
//!
//! # Examples
//!
//! ```
//! use recalc_engine::engine::{Formula, FormulaValue};
//!
//! let f = Formula::with_rules("x + y * 2", |v: &str| v.to_uppercase(), |_: &str| true).unwrap();
//! assert_eq!(f.to_string(), "X+Y*2");
//! assert_eq!(f.variables(), vec!["X", "Y"]);
//!
//! let value = f.evaluate(|_| Ok(3.0)).unwrap();
//! assert_eq!(value, FormulaValue::Number(9.0));
//! ```

use indexmap::IndexSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

use super::cell_name::is_valid_cell_name;
use super::eval::evaluate_tokens;
use super::token::{RawKind, Token, tokenize};

/// Syntax problems found while constructing a [`Formula`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaFormatError {
    #[error("Invalid token '{0}': only numbers, variables, parentheses and + - * / are allowed")]
    InvalidToken(String),

    #[error("Empty expression")]
    Empty,

    #[error("Unexpected value '{0}': a value may only follow an operator, '(' or nothing")]
    UnexpectedValue(String),

    #[error("Unexpected operator '{0}': an operator must follow a value or ')'")]
    UnexpectedOperator(String),

    #[error("Unexpected '{0}'")]
    UnexpectedParen(char),

    #[error("Closing parenthesis without a matching '('")]
    UnmatchedClose,

    #[error("Unbalanced parentheses: {open} '(' but {close} ')'")]
    Unbalanced { open: usize, close: usize },

    #[error("Expression ends with '{0}': it must end with a value or ')'")]
    BadEnding(String),

    #[error("Numeric literal '{0}' is out of range")]
    NumberOutOfRange(String),

    #[error("Variable '{raw}' normalizes to '{normalized}', which is not a legal variable")]
    IllegalVariable { raw: String, normalized: String },

    #[error("Variable '{0}' is not valid")]
    RejectedVariable(String),
}

/// An evaluation failure stored as a value rather than raised.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
#[error("{reason}")]
pub struct FormulaError {
    pub reason: String,
}

impl FormulaError {
    pub fn new(reason: impl Into<String>) -> FormulaError {
        FormulaError {
            reason: reason.into(),
        }
    }
}

/// Raised by a lookup function when a variable has no numeric value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Undefined variable: {0}")]
pub struct UndefinedVariable(pub String);

/// The outcome of evaluating a formula: a finite number or an evaluation error.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Error(FormulaError),
}

/// A validated infix expression over numbers, variables, parentheses and `+ - * /`.
#[derive(Clone, Debug)]
pub struct Formula {
    tokens: Vec<Token>,
    canonical: String,
}

impl Formula {
    /// Parse with the identity normalizer and a validator that accepts every variable.
    pub fn new(input: &str) -> Result<Formula, FormulaFormatError> {
        Formula::with_rules(input, |v: &str| v.to_string(), |_: &str| true)
    }

    /// Parse `input`, normalizing every variable with `normalize` and requiring
    /// `is_valid(normalize(v))` for each of them.
    pub fn with_rules<N, V>(
        input: &str,
        normalize: N,
        is_valid: V,
    ) -> Result<Formula, FormulaFormatError>
    where
        N: Fn(&str) -> String,
        V: Fn(&str) -> bool,
    {
        let mut tokens: Vec<Token> = Vec::new();
        let mut open = 0usize;
        let mut close = 0usize;

        for raw in tokenize(input)? {
            let prev = tokens.last();
            let after_value = matches!(
                prev,
                Some(Token::Number(_) | Token::Variable(_) | Token::RightParen)
            );

            match raw.kind {
                RawKind::Number | RawKind::Variable => {
                    if after_value {
                        return Err(FormulaFormatError::UnexpectedValue(raw.text.to_string()));
                    }
                    tokens.push(if raw.kind == RawKind::Number {
                        parse_number(raw.text)?
                    } else {
                        admit_variable(raw.text, &normalize, &is_valid)?
                    });
                }
                RawKind::Op(op) => {
                    if !after_value {
                        return Err(FormulaFormatError::UnexpectedOperator(raw.text.to_string()));
                    }
                    tokens.push(Token::Op(op));
                }
                RawKind::LeftParen => {
                    if after_value {
                        return Err(FormulaFormatError::UnexpectedParen('('));
                    }
                    open += 1;
                    tokens.push(Token::LeftParen);
                }
                RawKind::RightParen => {
                    close += 1;
                    if close > open {
                        return Err(FormulaFormatError::UnmatchedClose);
                    }
                    if !after_value {
                        return Err(FormulaFormatError::UnexpectedParen(')'));
                    }
                    tokens.push(Token::RightParen);
                }
            }
        }

        match tokens.last() {
            None => return Err(FormulaFormatError::Empty),
            Some(last @ (Token::Op(_) | Token::LeftParen)) => {
                return Err(FormulaFormatError::BadEnding(last.to_string()));
            }
            Some(_) => {}
        }
        if open != close {
            return Err(FormulaFormatError::Unbalanced { open, close });
        }

        let canonical = tokens.iter().map(Token::to_string).collect();
        Ok(Formula { tokens, canonical })
    }

    /// Evaluate against `lookup`, which maps a normalized variable to its value.
    ///
    /// Arithmetic failures (division by zero, overflow) come back as
    /// [`FormulaValue::Error`]. A failed lookup is returned as `Err` so the
    /// caller decides what an undefined variable means.
    pub fn evaluate<F>(&self, lookup: F) -> Result<FormulaValue, UndefinedVariable>
    where
        F: FnMut(&str) -> Result<f64, UndefinedVariable>,
    {
        evaluate_tokens(&self.tokens, lookup)
    }

    /// Normalized variables in first-occurrence order, each listed once.
    pub fn variables(&self) -> Vec<&str> {
        let seen: IndexSet<&str> = self
            .tokens
            .iter()
            .filter_map(|token| match token {
                Token::Variable(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        seen.into_iter().collect()
    }

    /// The canonical serialization (no whitespace, normalized variables).
    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

fn parse_number(text: &str) -> Result<Token, FormulaFormatError> {
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Token::Number(n)),
        _ => Err(FormulaFormatError::NumberOutOfRange(text.to_string())),
    }
}

fn admit_variable<N, V>(
    raw: &str,
    normalize: &N,
    is_valid: &V,
) -> Result<Token, FormulaFormatError>
where
    N: Fn(&str) -> String,
    V: Fn(&str) -> bool,
{
    let normalized = normalize(raw);
    if !is_valid_cell_name(&normalized) {
        return Err(FormulaFormatError::IllegalVariable {
            raw: raw.to_string(),
            normalized,
        });
    }
    if !is_valid(&normalized) {
        return Err(FormulaFormatError::RejectedVariable(normalized));
    }
    Ok(Token::Variable(normalized))
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Formula {}

impl Hash for Formula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl FromStr for Formula {
    type Err = FormulaFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::collections::hash_map::DefaultHasher;

    fn upper(v: &str) -> String {
        v.to_uppercase()
    }

    fn letter_digit(v: &str) -> bool {
        let b = v.as_bytes();
        b.len() == 2 && b[0].is_ascii_alphabetic() && b[1].is_ascii_digit()
    }

    fn hash_of(f: &Formula) -> u64 {
        let mut h = DefaultHasher::new();
        f.hash(&mut h);
        h.finish()
    }

    fn lookup_in<'a>(
        values: &'a HashMap<&'a str, f64>,
    ) -> impl FnMut(&str) -> Result<f64, UndefinedVariable> + 'a {
        move |name: &str| {
            values
                .get(name)
                .copied()
                .ok_or_else(|| UndefinedVariable(name.to_string()))
        }
    }

    #[test]
    fn test_normalizer_and_validator() {
        assert!(Formula::with_rules("x2+y3", upper, letter_digit).is_ok());
        assert_eq!(
            Formula::with_rules("x+y3", upper, letter_digit),
            Err(FormulaFormatError::RejectedVariable("X".to_string()))
        );
        assert!(Formula::with_rules("2x+y3", upper, letter_digit).is_err());
    }

    #[test]
    fn test_normalizer_must_produce_legal_variable() {
        let err =
            Formula::with_rules("a1", |_: &str| "1bad".to_string(), |_: &str| true).unwrap_err();
        assert!(matches!(err, FormulaFormatError::IllegalVariable { .. }));
    }

    #[test]
    fn test_canonical_string() {
        assert_eq!(Formula::with_rules("x + y", upper, |_: &str| true).unwrap().to_string(), "X+Y");
        assert_eq!(Formula::new("x + Y").unwrap().to_string(), "x+Y");
        assert_eq!(Formula::new("2.000 * (a1)").unwrap().to_string(), "2*(a1)");
        assert_eq!(Formula::new("1e3 / 2.5E-1").unwrap().to_string(), "1000/0.25");
    }

    #[test]
    fn test_equality() {
        let a = Formula::with_rules("x1+y2", upper, |_: &str| true).unwrap();
        assert_eq!(a, Formula::new("X1  +  Y2").unwrap());
        assert_ne!(Formula::new("x1+y2").unwrap(), Formula::new("X1+Y2").unwrap());
        assert_ne!(Formula::new("x1+y2").unwrap(), Formula::new("y2+x1").unwrap());
        assert_eq!(Formula::new("2.0 + x7").unwrap(), Formula::new("2.000 + x7").unwrap());
        assert_eq!(
            hash_of(&Formula::new("2.0 + x7").unwrap()),
            hash_of(&Formula::new("2.000+x7").unwrap())
        );
    }

    #[test]
    fn test_variables_first_occurrence_once() {
        let f = Formula::with_rules("x+y*z", upper, |_: &str| true).unwrap();
        assert_eq!(f.variables(), vec!["X", "Y", "Z"]);
        let f = Formula::with_rules("x+X*z", upper, |_: &str| true).unwrap();
        assert_eq!(f.variables(), vec!["X", "Z"]);
        let f = Formula::new("x+X*z").unwrap();
        assert_eq!(f.variables(), vec!["x", "X", "z"]);
        assert!(Formula::new("1+2").unwrap().variables().is_empty());
    }

    #[test]
    fn test_variables_in_wide_formula() {
        let names: Vec<String> = (0..5_000).map(|i| format!("v{i}")).collect();
        let text = format!("{}+{}", names.join("+"), names.join("+"));
        let f = Formula::new(&text).unwrap();
        assert_eq!(f.variables(), names);
    }

    #[test]
    fn test_grammar_violations() {
        use FormulaFormatError::*;
        let cases: Vec<(&str, FormulaFormatError)> = vec![
            ("", Empty),
            ("   ", Empty),
            ("+1", UnexpectedOperator("+".into())),
            ("1 2", UnexpectedValue("2".into())),
            ("(1)2", UnexpectedValue("2".into())),
            ("a b", UnexpectedValue("b".into())),
            ("1 + * 2", UnexpectedOperator("*".into())),
            ("(*2)", UnexpectedOperator("*".into())),
            ("1)", UnmatchedClose),
            ("(1))(", UnmatchedClose),
            ("(1", Unbalanced { open: 1, close: 0 }),
            ("((1)", Unbalanced { open: 2, close: 1 }),
            ("1+", BadEnding("+".into())),
            ("1+(", BadEnding("(".into())),
            ("()", UnexpectedParen(')')),
            ("2(3)", UnexpectedParen('(')),
            ("(1+)", UnexpectedParen(')')),
            ("1e400", NumberOutOfRange("1e400".into())),
            ("1 # 2", InvalidToken("#".into())),
        ];
        for (input, expected) in cases {
            assert_eq!(Formula::new(input), Err(expected), "input {input:?}");
        }
    }

    #[test]
    fn test_errors_have_readable_messages() {
        let err = Formula::new("(1").unwrap_err();
        assert_eq!(err.to_string(), "Unbalanced parentheses: 1 '(' but 0 ')'");
    }

    #[test]
    fn test_evaluate_precedence() {
        let empty = HashMap::new();
        let cases = [
            ("1+2*3", 7.0),
            ("(1+2)*3", 9.0),
            ("8/4/2", 1.0),
            ("2-3+4", 3.0),
            ("10-2*3-1", 3.0),
            ("2*(3+4)*5", 70.0),
            ("((2))", 2.0),
            ("110+30", 140.0),
            ("100/10", 10.0),
            ("1-(2-(3-4))", -2.0),
            ("6/(1+2)/2", 1.0),
        ];
        for (input, expected) in cases {
            let f = Formula::new(input).unwrap();
            assert_eq!(
                f.evaluate(lookup_in(&empty)).unwrap(),
                FormulaValue::Number(expected),
                "input {input}"
            );
        }
    }

    #[test]
    fn test_evaluate_with_variables() {
        let values = HashMap::from([("x", 2.0), ("X", 4.0)]);
        let f = Formula::with_rules("x+7", upper, |_: &str| true).unwrap();
        assert_eq!(f.evaluate(lookup_in(&values)).unwrap(), FormulaValue::Number(11.0));
        let f = Formula::new("x+7").unwrap();
        assert_eq!(f.evaluate(lookup_in(&values)).unwrap(), FormulaValue::Number(9.0));
    }

    #[test]
    fn test_divide_by_zero_is_a_value() {
        let empty = HashMap::new();
        let f = Formula::new("5/0").unwrap();
        match f.evaluate(lookup_in(&empty)).unwrap() {
            FormulaValue::Error(e) => assert_eq!(e.reason, "divide by zero"),
            other => panic!("expected error, got {other:?}"),
        }
        let f = Formula::new("1 + 2/(3-3)").unwrap();
        assert!(matches!(f.evaluate(lookup_in(&empty)), Ok(FormulaValue::Error(_))));
    }

    #[test]
    fn test_overflow_is_an_error_value() {
        let empty = HashMap::new();
        let f = Formula::new("1e308 * 10").unwrap();
        assert!(matches!(f.evaluate(lookup_in(&empty)), Ok(FormulaValue::Error(_))));
    }

    #[test]
    fn test_undefined_variable_propagates() {
        let values = HashMap::from([("a", 1.0)]);
        let f = Formula::new("a + b").unwrap();
        assert_eq!(
            f.evaluate(lookup_in(&values)),
            Err(UndefinedVariable("b".to_string()))
        );
    }

    #[test]
    fn test_from_str_uses_canonical_form() {
        let f: Formula = "a1 + 2.50".parse().unwrap();
        assert_eq!(f.as_str(), "a1+2.5");
        assert_eq!(f.as_str().parse::<Formula>().unwrap(), f);
        assert!("1 +".parse::<Formula>().is_err());
    }

    fn formula_text() -> impl Strategy<Value = String> {
        let leaf = prop_oneof![
            "[a-zA-Z_][a-zA-Z0-9_]{0,3}".prop_map(|s| s),
            (0u32..10_000u32, 0u32..100u32).prop_map(|(a, b)| format!("{a}.{b}")),
            (1u32..100u32, 0i32..20i32).prop_map(|(m, e)| format!("{m}e{e}")),
        ];
        leaf.prop_recursive(4, 32, 2, |inner| {
            (
                inner.clone(),
                prop_oneof![Just('+'), Just('-'), Just('*'), Just('/')],
                inner,
                any::<bool>(),
            )
                .prop_map(|(l, op, r, paren)| {
                    if paren {
                        format!("( {l} {op} {r} )")
                    } else {
                        format!("{l}{op} {r}")
                    }
                })
        })
    }

    proptest! {
        #[test]
        fn prop_canonical_form_reparses_equal(text in formula_text()) {
            let f = Formula::with_rules(&text, upper, |_: &str| true).unwrap();
            let again = Formula::with_rules(f.as_str(), upper, |_: &str| true).unwrap();
            prop_assert_eq!(&again, &f);
            prop_assert_eq!(again.to_string(), f.to_string());
        }

        #[test]
        fn prop_evaluation_is_pure(text in formula_text(), seed in 1.0f64..100.0) {
            let f = Formula::new(&text).unwrap();
            let before = f.to_string();
            let first = f.evaluate(|_| Ok(seed));
            let second = f.evaluate(|_| Ok(seed));
            prop_assert_eq!(first, second);
            prop_assert_eq!(f.to_string(), before);
        }
    }
}
