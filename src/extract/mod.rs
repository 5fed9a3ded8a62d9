//! Criterion section extraction.
//!
//! [`SectionExtractor`] pulls page text through [`PageTextSource`] in document order and
//! feeds it to a [`SectionScanner`] built from the question's [`HeaderPatterns`]. Pages
//! after the terminator are never requested, so they never trigger OCR.

pub mod page_source;
pub mod patterns;
pub mod section;
pub mod types;


pub use page_source::{DocumentText, PageText, PageTextSource, TextOrigin};
pub use patterns::{HeaderPatterns, HeadingHeuristics, PatternError, is_toc_line};
pub use section::{SectionScanner, extract_section};
pub use types::{ExtractionOutcome, ExtractionResult, SearchSpec};

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::ocr::OcrResult;
use crate::pdf::{LopdfDocument, PdfError, PdfResult, PdfSource, PdftoppmRasterizer};

/// Locates one criterion section per call.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    pages: PageTextSource,
    heuristics: HeadingHeuristics,
    rasterizer: PdftoppmRasterizer,
}

impl SectionExtractor {
    pub fn new(pages: PageTextSource, heuristics: HeadingHeuristics) -> Self {
        Self {
            pages,
            heuristics,
            rasterizer: PdftoppmRasterizer::default(),
        }
    }

    /// Wires the page source, heading keywords and `pdftoppm` path from `config`.
    ///
    /// Fails only when the vision HTTP client cannot be built.
    pub fn from_config(config: &Config) -> OcrResult<Self> {
        let extractor = Self::new(
            PageTextSource::from_config(config)?,
            HeadingHeuristics::new(config.heading_keywords.iter().cloned()),
        )
        .with_rasterizer(
            PdftoppmRasterizer::new(config.pdftoppm_path.clone()).with_timeout(config.ocr_timeout),
        );
        Ok(extractor)
    }

    /// Rasterizer used by [`SectionExtractor::extract_path`].
    pub fn with_rasterizer(mut self, rasterizer: PdftoppmRasterizer) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn page_source(&self) -> &PageTextSource {
        &self.pages
    }

    pub fn heuristics(&self) -> &HeadingHeuristics {
        &self.heuristics
    }

    /// Extracts the section for `spec` from an open document.
    ///
    /// Per-page failures only drop that page's text; the outcome is never an error.
    #[instrument(skip(self, source, spec), fields(q_id = %spec.id, pages = source.page_count()))]
    pub async fn extract(
        &self,
        source: &dyn PdfSource,
        spec: &SearchSpec,
        document_id: Option<i64>,
    ) -> ExtractionOutcome {
        let patterns = match HeaderPatterns::build(spec, &self.heuristics) {
            Ok(patterns) => patterns,
            Err(e) => {
                warn!(error = %e, "Failed to build header patterns");
                return ExtractionOutcome::NotFound;
            }
        };

        let mut scanner = SectionScanner::new(&patterns);
        let mut pages_read = 0usize;

        for page_index in 0..source.page_count() {
            match self.pages.page_text(source, page_index, document_id).await {
                Ok(page) => scanner.feed_page(&page.text),
                Err(e) => {
                    warn!(page = page_index, error = %e, "Skipping unreadable page");
                }
            }
            pages_read += 1;

            if scanner.is_done() {
                debug!(page = page_index, "Terminator found, stopping scan");
                break;
            }
        }

        let outcome = scanner.finish();
        info!(outcome = outcome.label(), pages_read, "Extraction finished");
        outcome
    }

    /// Opens `path` and extracts the section for `spec`.
    ///
    /// A file that cannot be opened yields [`ExtractionOutcome::Unreadable`].
    #[instrument(skip(self, path, spec), fields(path = %path.display(), q_id = %spec.id))]
    pub async fn extract_path(
        &self,
        path: &Path,
        spec: &SearchSpec,
        document_id: Option<i64>,
    ) -> ExtractionOutcome {
        let document = match self.open(path).await {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "Document unreadable");
                return ExtractionOutcome::Unreadable {
                    reason: e.to_string(),
                };
            }
        };

        self.extract(&document, spec, document_id).await
    }

    /// Opens `path` off the async runtime with this extractor's rasterizer.
    pub async fn open(&self, path: &Path) -> PdfResult<LopdfDocument> {
        let owned = path.to_path_buf();
        let rasterizer = self.rasterizer.clone();
        tokio::task::spawn_blocking(move || LopdfDocument::open_with_rasterizer(owned, rasterizer))
            .await
            .map_err(|e| PdfError::Open {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
    }
}
