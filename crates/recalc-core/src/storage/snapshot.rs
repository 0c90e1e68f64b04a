//! JSON snapshot format
//!
//! ```json
//! {
//!   "version": "default",
//!   "cells": {
//!     "A1": { "contents": "5" },
//!     "B1": { "contents": "=A1*2" }
//!   }
//! }
//! ```
//!
//! Cells are written in the order the sheet first received them and replayed
//! in file order on load, so the cached values never need to be stored.

use crate::error::{Result, SpreadsheetError};
use crate::sheet::Spreadsheet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const MAX_SNAPSHOT_BYTES: u64 = 16 * 1_048_576; // 16 MiB

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    pub version: String,
    #[serde(default)]
    pub cells: IndexMap<String, SnapshotCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotCell {
    /// Input string that recreates the cell: numbers as literals, text as-is,
    /// formulas prefixed with `=`.
    pub contents: String,
}

impl Snapshot {
    pub fn from_sheet(sheet: &Spreadsheet) -> Snapshot {
        let cells = sheet
            .cells
            .iter()
            .map(|(name, cell)| {
                let contents = cell.contents.to_input_string();
                (name.clone(), SnapshotCell { contents })
            })
            .collect();
        Snapshot {
            version: sheet.version().to_string(),
            cells,
        }
    }
}

fn read_error(path: &Path, err: impl std::fmt::Display) -> SpreadsheetError {
    SpreadsheetError::ReadWrite(format!("{}: {}", path.display(), err))
}

fn read_snapshot_file(path: &Path) -> Result<String> {
    let meta = fs::metadata(path).map_err(|e| read_error(path, e))?;
    if meta.len() > MAX_SNAPSHOT_BYTES {
        return Err(read_error(
            path,
            format!(
                "snapshot too large ({} bytes, max {})",
                meta.len(),
                MAX_SNAPSHOT_BYTES
            ),
        ));
    }
    fs::read_to_string(path).map_err(|e| read_error(path, e))
}

/// Write a sheet to a snapshot file
pub fn write_snapshot(path: &Path, sheet: &Spreadsheet) -> Result<()> {
    let content = write_snapshot_content(sheet)?;
    fs::write(path, content).map_err(|e| read_error(path, e))
}

/// Write a sheet to a snapshot string
pub fn write_snapshot_content(sheet: &Spreadsheet) -> Result<String> {
    let mut content = serde_json::to_string_pretty(&Snapshot::from_sheet(sheet))
        .map_err(|e| SpreadsheetError::ReadWrite(e.to_string()))?;
    content.push('\n');
    Ok(content)
}

/// Parse a snapshot file
pub fn parse_snapshot(path: &Path) -> Result<Snapshot> {
    let content = read_snapshot_file(path)?;
    serde_json::from_str(&content).map_err(|e| read_error(path, e))
}

/// Parse snapshot content from a string
pub fn parse_snapshot_content(content: &str) -> Result<Snapshot> {
    serde_json::from_str(content)
        .map_err(|e| SpreadsheetError::ReadWrite(format!("Invalid snapshot: {e}")))
}

/// Version tag stored in a snapshot file.
pub fn read_snapshot_version(path: &Path) -> Result<String> {
    parse_snapshot(path).map(|snapshot| snapshot.version)
}
