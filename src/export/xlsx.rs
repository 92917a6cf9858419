//! Spreadsheet writer.

use super::{ExportRow, HEADERS};
use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

pub const SHEET_NAME: &str = "Products";

const COLUMN_WIDTHS: [f64; 13] =
    [16.0, 50.0, 40.0, 10.0, 50.0, 16.0, 50.0, 16.0, 50.0, 16.0, 50.0, 50.0, 60.0];

/// Writes a header row plus one row per product into a single sheet.
pub fn write_rows(rows: &[ExportRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let wrap = Format::new().set_text_wrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
        sheet.set_column_width(col as u16, COLUMN_WIDTHS[col])?;
    }
    sheet.set_freeze_panes(1, 0)?;

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in row.cells().iter().enumerate() {
            if value.contains('\n') {
                sheet.write_string_with_format(r, col as u16, *value, &wrap)?;
            } else {
                sheet.write_string(r, col as u16, *value)?;
            }
        }
    }

    workbook.save(path).with_context(|| format!("Failed to save spreadsheet: {}", path.display()))?;

    Ok(())
}
