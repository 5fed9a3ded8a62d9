use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by PDF sources.
pub enum PdfError {
    /// The file could not be read or parsed as a PDF.
    #[error("failed to open PDF {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    /// Page index past the end of the document.
    #[error("page index {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    /// Embedded text could not be extracted.
    #[error("text extraction failed on page {index}: {reason}")]
    Text { index: usize, reason: String },

    /// The page content stream could not be decoded.
    #[error("content stream error on page {index}: {reason}")]
    Content { index: usize, reason: String },

    /// Rasterization failed.
    #[error("rasterization failed on page {index}: {reason}")]
    Render { index: usize, reason: String },

    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for PDF operations.
pub type PdfResult<T> = Result<T, PdfError>;
