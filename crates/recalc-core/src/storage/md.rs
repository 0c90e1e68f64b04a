//! Markdown export functionality

use crate::sheet::Spreadsheet;
use recalc_engine::engine::format_value;
use std::io::Write;
use std::path::Path;

/// Write the sheet to a markdown file
pub fn write_markdown(path: &Path, sheet: &Spreadsheet) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_markdown_to(&mut file, sheet)
}

/// Write the sheet as a markdown table of its non-empty cells
pub fn write_markdown_to<W: Write>(w: &mut W, sheet: &Spreadsheet) -> std::io::Result<()> {
    writeln!(w, "# Sheet")?;
    writeln!(w)?;

    if sheet.cells.is_empty() {
        writeln!(w, "*Empty spreadsheet*")?;
        return Ok(());
    }

    writeln!(w, "| Cell | Contents | Value |")?;
    writeln!(w, "|---|---|---|")?;
    for (name, cell) in &sheet.cells {
        writeln!(
            w,
            "| {} | {} | {} |",
            name,
            escape_markdown(&cell.contents.to_input_string()),
            escape_markdown(&format_value(&cell.value))
        )?;
    }

    Ok(())
}

/// Escape special markdown characters in cell content
fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}
