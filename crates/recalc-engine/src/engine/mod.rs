//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`Formula`] - Validated infix expressions with canonical form and evaluation
//! - [`DependencyGraph`] - Bidirectional "t depends on s" edge storage
//! - [`recalculation_order`] - Cycle-detecting topological visit over dependents
//! - [`CellContent`], [`CellValue`], [`Cell`] - Data structures for cell storage
//! - [`is_valid_cell_name`] - The cell/variable name grammar
//! - [`format_number`] - Format values for display

mod cell;
mod cell_name;
mod cycle;
mod eval;
mod format;
mod formula;
mod graph;
mod token;

pub use cell::{Cell, CellContent, CellValue};
pub use cell_name::{Normalizer, Validator, accept_all, identity_normalizer, is_valid_cell_name};
pub use cycle::{CycleError, recalculation_order};
pub use format::{format_number, format_value};
pub use formula::{Formula, FormulaError, FormulaFormatError, FormulaValue, UndefinedVariable};
pub use graph::DependencyGraph;
