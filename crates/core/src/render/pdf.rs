//! PDF artifact writer.

// Page geometry below, not money.
#![allow(clippy::float_arithmetic)]

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};

use super::error::RenderError;
use crate::reports::ReportTable;

struct PageWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    layer: printpdf::PdfLayerReference,
    y: Mm,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, RenderError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(210.0), Mm(297.0), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            font,
            font_bold,
            layer,
            y: Mm(283.0),
        })
    }

    fn ensure_room(&mut self) {
        if self.y.0 < 14.0 {
            let (page, layer) = self.doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = Mm(283.0);
        }
    }

    fn advance(&mut self) {
        self.y = Mm(self.y.0 - 5.0);
    }

    fn heading(&mut self, text: &str) {
        self.ensure_room();
        self.layer
            .use_text(text, 12.0, Mm(12.0), self.y, &self.font_bold);
        self.advance();
    }

    fn bold_line(&mut self, text: &str) {
        self.ensure_room();
        self.layer
            .use_text(text, 8.0, Mm(12.0), self.y, &self.font_bold);
        self.advance();
    }

    fn line(&mut self, text: &str) {
        self.ensure_room();
        self.layer.use_text(text, 8.0, Mm(12.0), self.y, &self.font);
        self.advance();
    }

    fn blank(&mut self) {
        self.y = Mm(self.y.0 - 2.5);
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }
}

fn join_cells(cells: &[String]) -> String {
    cells
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("  |  ")
}

/// Renders the table as a simple line-oriented PDF.
pub(super) fn render(table: &ReportTable) -> Result<Vec<u8>, RenderError> {
    let mut writer = PageWriter::new(&table.title)?;

    writer.heading(&table.title);
    writer.line(&table.subtitle);
    writer.blank();
    writer.bold_line(&join_cells(&table.columns));

    for row in &table.rows {
        // Single-cell rows are section headings.
        if row.len() == 1 {
            writer.blank();
            writer.bold_line(&row[0]);
        } else {
            writer.line(&join_cells(row));
        }
    }

    writer.blank();
    writer.bold_line(&join_cells(&table.footer));

    writer.finish()
}
