use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by the question catalog.
pub enum CatalogError {
    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Seed file is valid JSON but not an array.
    #[error("seed file must contain a JSON array of questions")]
    NotAnArray,

    /// Seed file does not exist.
    #[error("seed file not found: {path}")]
    SeedNotFound { path: PathBuf },

    /// `import_blank` on a catalog that already has questions.
    #[error("catalog is not empty ({count} questions); use a blank catalog")]
    NotBlank { count: usize },

    /// No question with this id.
    #[error("unknown question: {q_id}")]
    UnknownQuestion { q_id: String },
}

/// Convenience result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
