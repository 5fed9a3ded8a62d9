use thiserror::Error;

use crate::pdf::PdfError;

#[derive(Debug, Error)]
/// Errors returned by the vision OCR path.
pub enum OcrError {
    /// No vision backend is configured.
    #[error("no vision OCR backend configured")]
    Unavailable,

    /// The page could not be rasterized.
    #[error("page render failed: {0}")]
    Render(#[from] PdfError),

    /// The raster could not be encoded as JPEG.
    #[error("image encoding failed: {0}")]
    Encode(String),

    /// Transport-level failure talking to the backend.
    #[error("vision request failed: {0}")]
    Request(String),

    /// Backend answered with a non-success status.
    #[error("vision backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Backend answered without any text.
    #[error("vision backend returned no text")]
    EmptyResponse,

    /// Backend answered with a body that is not a chat completion with text content.
    #[error("invalid vision response: {0}")]
    InvalidResponse(String),
}

impl OcrError {
    /// `false` only for [`OcrError::Unavailable`]; every other variant is a failed call.
    pub fn is_call_failure(&self) -> bool {
        !matches!(self, OcrError::Unavailable)
    }
}

impl From<reqwest::Error> for OcrError {
    fn from(err: reqwest::Error) -> Self {
        OcrError::Request(err.to_string())
    }
}

/// Convenience result type for OCR operations.
pub type OcrResult<T> = Result<T, OcrError>;
