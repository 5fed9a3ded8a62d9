//! Tenderlens library crate (used by the CLI and integration tests).
//!
//! # Public API Surface
//!
//! ## Extraction
//! - [`SectionExtractor`], [`SearchSpec`], [`ExtractionOutcome`] - Criterion section lookup
//! - [`HeaderPatterns`], [`HeadingHeuristics`], [`SectionScanner`] - Header and terminator matching
//! - [`PageTextSource`], [`TextOrigin`] - Native text with cached OCR fallback
//!
//! ## Documents & OCR
//! - [`PdfSource`], [`LopdfDocument`], [`PdftoppmRasterizer`] - Page text, blocks, rasters
//! - [`VisionBackend`], [`OpenAiVisionClient`] - Vision model transcription
//! - [`TieredOcrCache`], [`MemoryOcrCache`], [`DiskOcrCache`] - OCR result cache
//! - [`PageFingerprint`], [`fingerprint_page`] - Content-derived cache keys
//!
//! ## Questions & Evaluation
//! - [`QuestionCatalog`], [`Question`] - Question seeds and persistence
//! - [`PromptTemplate`] - `{name}` placeholder rendering
//! - [`EvaluationSink`], [`AnswerRecord`], [`ScoringRequest`] - Downstream scoring contracts
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod extract;
pub mod hashing;
pub mod ocr;
pub mod pdf;
pub mod prompt;
pub mod sink;

pub use cache::{
    CacheError, CacheResult, CacheTier, CachedPage, DiskOcrCache, MemoryOcrCache, OcrCacheStore,
    TieredOcrCache,
};
pub use catalog::{CatalogError, CatalogResult, ImportReport, Question, QuestionCatalog};
pub use config::{ApiKey, Config, ConfigError};
pub use constants::{MIN_NATIVE_TEXT_CHARS, OcrSettings};
pub use extract::{
    DocumentText, ExtractionOutcome, ExtractionResult, HeaderPatterns, HeadingHeuristics,
    PageText, PageTextSource, SearchSpec, SectionExtractor, SectionScanner, TextOrigin,
    extract_section, is_toc_line,
};
pub use hashing::{PageFingerprint, fingerprint_page};
pub use ocr::{OcrError, OcrResult, OpenAiVisionClient, VisionBackend, ocr_page};
pub use pdf::{
    LopdfDocument, PageBlock, PageProbe, PdfError, PdfResult, PdfSource, PdftoppmRasterizer,
    is_scanned_page, probe_page,
};
pub use prompt::{PromptTemplate, Requirement, TemplateError, render_template};
pub use sink::{
    AnswerRecord, EvaluationSink, JsonlSink, MemorySink, ScoringRequest, SinkError, SinkResult,
};

#[cfg(any(test, feature = "mock"))]
pub use ocr::MockVisionBackend;
#[cfg(any(test, feature = "mock"))]
pub use pdf::{MemoryDocument, MemoryPage};
