//! Cell data structures for the spreadsheet.
//!
//! This module provides the core data types for representing cells:
//! - [`CellContent`] - What the user entered (empty, text, number, or formula)
//! - [`CellValue`] - What the content evaluates to (text, number, or error)
//! - [`Cell`] - Stored content plus its cached value

use super::formula::{Formula, FormulaError, FormulaFormatError, FormulaValue};

/// The content stored in a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellContent {
    Empty,
    Text(String),
    Number(f64),
    Formula(Formula),
}

impl CellContent {
    /// Classify user input.
    /// - Empty string -> Empty
    /// - Parses as a finite number (surrounding whitespace ignored) -> Number
    /// - Starts with '=' -> Formula (without the '='), parsed with the given rules
    /// - Otherwise -> Text, kept verbatim
    pub fn from_input<N, V>(
        input: &str,
        normalize: N,
        is_valid: V,
    ) -> Result<CellContent, FormulaFormatError>
    where
        N: Fn(&str) -> String,
        V: Fn(&str) -> bool,
    {
        if input.is_empty() {
            return Ok(CellContent::Empty);
        }

        if let Ok(n) = input.trim().parse::<f64>() {
            if n.is_finite() {
                return Ok(CellContent::Number(n));
            }
        }

        if let Some(formula) = input.strip_prefix('=') {
            return Formula::with_rules(formula, normalize, is_valid).map(CellContent::Formula);
        }

        Ok(CellContent::Text(input.to_string()))
    }

    /// The string form that [`CellContent::from_input`] turns back into this content.
    pub fn to_input_string(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::Number(n) => n.to_string(),
            CellContent::Formula(f) => format!("={}", f),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }

    pub fn formula(&self) -> Option<&Formula> {
        match self {
            CellContent::Formula(f) => Some(f),
            _ => None,
        }
    }
}

/// The evaluated value of a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Error(FormulaError),
}

impl CellValue {
    /// The value of a cell that holds nothing.
    pub fn empty() -> CellValue {
        CellValue::Text(String::new())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Number(n) => CellValue::Number(n),
            FormulaValue::Error(e) => CellValue::Error(e),
        }
    }
}

/// A non-empty cell: its content and the value cached by the last recalculation.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub contents: CellContent,
    pub value: CellValue,
}

impl Cell {
    pub fn new_text(text: &str) -> Cell {
        Cell {
            contents: CellContent::Text(text.to_string()),
            value: CellValue::Text(text.to_string()),
        }
    }

    pub fn new_number(n: f64) -> Cell {
        Cell {
            contents: CellContent::Number(n),
            value: CellValue::Number(n),
        }
    }

    /// Create a formula cell with an already computed value.
    pub fn new_formula(formula: Formula, value: CellValue) -> Cell {
        Cell {
            contents: CellContent::Formula(formula),
            value,
        }
    }
}
