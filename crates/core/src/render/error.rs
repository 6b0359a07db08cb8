//! Rendering error types.

use thiserror::Error;

/// Errors raised by the artifact writers.
#[derive(Debug, Error)]
pub enum RenderError {
    /// PDF writer failure.
    #[error("pdf rendering failed: {0}")]
    Pdf(String),

    /// Spreadsheet writer failure.
    #[error("spreadsheet rendering failed: {0}")]
    Spreadsheet(String),
}
