//! Spreadsheet artifact writer.
//!
//! The spreadsheet family is written as an OOXML workbook regardless of the
//! legacy `.xls` extension and MIME the download surface preserves.

use rust_xlsxwriter::{Format, Workbook};

use super::error::RenderError;
use crate::reports::ReportTable;

/// Renders the table as a single-sheet workbook.
pub(super) fn render(table: &ReportTable) -> Result<Vec<u8>, RenderError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    let to_err = |e: rust_xlsxwriter::XlsxError| RenderError::Spreadsheet(e.to_string());

    worksheet
        .write_string_with_format(0, 0, &table.title, &bold)
        .map_err(to_err)?;
    worksheet
        .write_string(1, 0, &table.subtitle)
        .map_err(to_err)?;

    let mut row_idx: u32 = 3;
    let mut col: u16 = 0;
    for heading in &table.columns {
        worksheet
            .write_string_with_format(row_idx, col, heading, &bold)
            .map_err(to_err)?;
        col += 1;
    }
    row_idx += 1;

    for row in &table.rows {
        let format = if row.len() == 1 { Some(&bold) } else { None };
        let mut col: u16 = 0;
        for cell in row {
            match format {
                Some(f) => worksheet
                    .write_string_with_format(row_idx, col, cell, f)
                    .map_err(to_err)?,
                None => worksheet.write_string(row_idx, col, cell).map_err(to_err)?,
            };
            col += 1;
        }
        row_idx += 1;
    }

    row_idx += 1;
    let mut col: u16 = 0;
    for cell in &table.footer {
        worksheet
            .write_string_with_format(row_idx, col, cell, &bold)
            .map_err(to_err)?;
        col += 1;
    }

    workbook.save_to_buffer().map_err(to_err)
}
