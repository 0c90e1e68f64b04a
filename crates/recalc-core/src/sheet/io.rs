use super::{SheetOptions, Spreadsheet};
use crate::error::{Result, SpreadsheetError};
use crate::storage::{parse_snapshot, write_snapshot};
use log::{debug, warn};
use std::path::{Path, PathBuf};

impl Spreadsheet {
    /// Build a sheet from a snapshot file by replaying every saved cell in file order.
    ///
    /// Fails with [`SpreadsheetError::ReadWrite`] if the file is missing or
    /// malformed, its version differs from `options.version`, or any entry is
    /// rejected.
    pub fn from_file(path: &Path, options: SheetOptions) -> Result<Spreadsheet> {
        let snapshot = parse_snapshot(path)?;
        if snapshot.version != options.version {
            return Err(SpreadsheetError::ReadWrite(format!(
                "{}: version mismatch (file has {:?}, expected {:?})",
                path.display(),
                snapshot.version,
                options.version
            )));
        }

        let mut sheet = Spreadsheet::with_options(options);
        for (name, cell) in &snapshot.cells {
            sheet
                .set_contents_of_cell(name, &cell.contents)
                .map_err(|e| {
                    SpreadsheetError::ReadWrite(format!("{}: cell {}: {}", path.display(), name, e))
                })?;
        }

        debug!(
            "Loaded {} cells from {}",
            snapshot.cells.len(),
            path.display()
        );
        sheet.file_path = Some(path.to_path_buf());
        sheet.modified = false;
        Ok(sheet)
    }

    /// Replace this sheet with the contents of a snapshot file.
    /// The sheet is left unchanged if loading fails.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let loaded = Spreadsheet::from_file(path, self.options.clone()).inspect_err(|err| {
            warn!("Load failed: {err}");
        })?;
        *self = loaded;
        Ok(())
    }

    /// Save to `path` and make it the current file path.
    pub fn save_file(&mut self, path: &Path) -> Result<()> {
        write_snapshot(path, self)?;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save(&mut self) -> Result<PathBuf> {
        let Some(path) = self.file_path.clone() else {
            return Err(SpreadsheetError::NoFilePath);
        };
        self.save_file(&path)?;
        Ok(path)
    }
}
