//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::constants::OcrSettingsError;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric environment variable could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// OCR tuning values are outside their supported ranges.
    #[error("invalid OCR settings: {0}")]
    OcrSettings(#[from] OcrSettingsError),

    /// The heading keyword list ended up empty.
    #[error("heading keyword list is empty (check TENDERLENS_HEADING_KEYWORDS)")]
    EmptyHeadingKeywords,

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
