//! Error types for Recalc core.

use thiserror::Error;

use recalc_engine::engine::{CycleError, FormulaFormatError};

/// Errors that can occur while editing, saving or loading a spreadsheet.
///
/// Every variant aborts the call that produced it and leaves the sheet as it
/// was. Evaluation problems are not errors: they are stored as cell values.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Invalid cell name: {0}")]
    InvalidName(String),

    #[error("Formula error: {0}")]
    FormulaFormat(#[from] FormulaFormatError),

    #[error("{0}")]
    CircularDependency(#[from] CycleError),

    #[error("Read/write error: {0}")]
    ReadWrite(String),

    #[error("No file path set")]
    NoFilePath,
}

pub type Result<T> = std::result::Result<T, SpreadsheetError>;
