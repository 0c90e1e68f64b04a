//! recalc-core - UI-agnostic spreadsheet model + storage.

pub mod error;
pub mod sheet;
pub mod storage;

pub use error::{Result, SpreadsheetError};
pub use sheet::{SheetOptions, Spreadsheet};

pub use recalc_engine::engine::{CellContent, CellValue};
