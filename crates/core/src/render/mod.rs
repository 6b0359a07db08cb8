//! Report artifact rendering.
//!
//! Turns a [`ReportTable`](crate::reports::ReportTable) into bytes for the
//! requested format family. Visual layout is intentionally minimal; the
//! contract is a readable tabular artifact, not document design.

mod error;
mod pdf;
mod xls;

pub use error::RenderError;

use crate::jobs::ReportFormat;
use crate::reports::ReportTable;

/// Renders a table in the requested format.
///
/// # Errors
///
/// Returns [`RenderError`] when the underlying writer fails.
pub fn render(table: &ReportTable, format: ReportFormat) -> Result<Vec<u8>, RenderError> {
    match format {
        ReportFormat::Pdf => pdf::render(table),
        ReportFormat::Xls => xls::render(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> ReportTable {
        ReportTable {
            title: "Trial Balance".to_string(),
            subtitle: "2025-01-01 to 2025-01-31".to_string(),
            columns: vec!["Account".to_string(), "Debit".to_string(), "Credit".to_string()],
            rows: vec![
                vec!["Assets".to_string()],
                vec!["1010".to_string(), "100.00".to_string(), "0.00".to_string()],
            ],
            footer: vec!["Total".to_string(), "100.00".to_string(), "100.00".to_string()],
        }
    }

    #[test]
    fn test_pdf_renders_with_magic_bytes() {
        let bytes = render(&sample_table(), ReportFormat::Pdf).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_xls_renders_non_empty() {
        let bytes = render(&sample_table(), ReportFormat::Xls).unwrap();
        // OOXML containers are zip archives.
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_pdf_handles_many_rows() {
        let mut table = sample_table();
        table.rows = (0..500)
            .map(|i| vec![format!("{i:04}"), "1.00".to_string(), "1.00".to_string()])
            .collect();
        let bytes = render(&table, ReportFormat::Pdf).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
