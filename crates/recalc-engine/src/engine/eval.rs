//! Two-stack evaluation of a validated token sequence.
//!
//! `*` and `/` are applied as soon as their right operand arrives; `+` and
//! `-` wait until another `+`/`-`, a closing parenthesis, or the end of the
//! input forces them. Parentheses only bound sub-expressions.

use super::formula::{FormulaError, FormulaValue, UndefinedVariable};
use super::token::{Operator, Token};

#[derive(Clone, Copy, Debug, PartialEq)]
enum StackOp {
    Op(Operator),
    Paren,
}

enum Fault {
    Value(FormulaError),
    Lookup(UndefinedVariable),
}

impl From<FormulaError> for Fault {
    fn from(e: FormulaError) -> Self {
        Fault::Value(e)
    }
}

impl From<UndefinedVariable> for Fault {
    fn from(e: UndefinedVariable) -> Self {
        Fault::Lookup(e)
    }
}

/// Evaluate `tokens` with `lookup` resolving variables.
pub(crate) fn evaluate_tokens<F>(
    tokens: &[Token],
    lookup: F,
) -> Result<FormulaValue, UndefinedVariable>
where
    F: FnMut(&str) -> Result<f64, UndefinedVariable>,
{
    match run(tokens, lookup) {
        Ok(n) => Ok(FormulaValue::Number(n)),
        Err(Fault::Value(e)) => Ok(FormulaValue::Error(e)),
        Err(Fault::Lookup(e)) => Err(e),
    }
}

fn run<F>(tokens: &[Token], mut lookup: F) -> Result<f64, Fault>
where
    F: FnMut(&str) -> Result<f64, UndefinedVariable>,
{
    let mut values: Vec<f64> = Vec::new();
    let mut ops: Vec<StackOp> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(n) => push_value(&mut values, &mut ops, *n)?,
            Token::Variable(name) => {
                let n = lookup(name)?;
                push_value(&mut values, &mut ops, n)?;
            }
            Token::Op(op) if op.is_multiplicative() => ops.push(StackOp::Op(*op)),
            Token::Op(op) => {
                if top_is_additive(&ops) {
                    apply_top(&mut values, &mut ops)?;
                }
                ops.push(StackOp::Op(*op));
            }
            Token::LeftParen => ops.push(StackOp::Paren),
            Token::RightParen => {
                if top_is_additive(&ops) {
                    apply_top(&mut values, &mut ops)?;
                }
                if ops.pop() != Some(StackOp::Paren) {
                    return Err(malformed().into());
                }
                if top_is_multiplicative(&ops) {
                    apply_top(&mut values, &mut ops)?;
                }
            }
        }
    }

    if !ops.is_empty() {
        apply_top(&mut values, &mut ops)?;
    }

    match (values.pop(), values.is_empty(), ops.is_empty()) {
        (Some(n), true, true) if n.is_finite() => Ok(n),
        (Some(_), true, true) => Err(FormulaError::new("result is not a finite number").into()),
        _ => Err(malformed().into()),
    }
}

fn push_value(values: &mut Vec<f64>, ops: &mut Vec<StackOp>, n: f64) -> Result<(), FormulaError> {
    if top_is_multiplicative(ops) {
        values.push(n);
        apply_top(values, ops)
    } else {
        values.push(n);
        Ok(())
    }
}

fn apply_top(values: &mut Vec<f64>, ops: &mut Vec<StackOp>) -> Result<(), FormulaError> {
    let (Some(StackOp::Op(op)), Some(rhs), Some(lhs)) = (ops.pop(), values.pop(), values.pop())
    else {
        return Err(malformed());
    };
    values.push(calculate(op, lhs, rhs)?);
    Ok(())
}

fn calculate(op: Operator, lhs: f64, rhs: f64) -> Result<f64, FormulaError> {
    match op {
        Operator::Add => Ok(lhs + rhs),
        Operator::Sub => Ok(lhs - rhs),
        Operator::Mul => Ok(lhs * rhs),
        Operator::Div if rhs == 0.0 => Err(FormulaError::new("divide by zero")),
        Operator::Div => Ok(lhs / rhs),
    }
}

fn top_is_additive(ops: &[StackOp]) -> bool {
    matches!(ops.last(), Some(StackOp::Op(op)) if !op.is_multiplicative())
}

fn top_is_multiplicative(ops: &[StackOp]) -> bool {
    matches!(ops.last(), Some(StackOp::Op(op)) if op.is_multiplicative())
}

fn malformed() -> FormulaError {
    FormulaError::new("malformed expression")
}
