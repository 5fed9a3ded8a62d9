//! Hybrid per-page text: native text first, cached or fresh vision OCR for scanned pages.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CachedPage, DiskOcrCache, MemoryOcrCache, OcrCacheStore, TieredOcrCache};
use crate::config::Config;
use crate::constants::OcrSettings;
use crate::hashing::{PageFingerprint, fingerprint_page};
use crate::ocr::{OcrResult, OpenAiVisionClient, VisionBackend, ocr_page};
use crate::pdf::{PdfResult, PdfSource};

/// Where a page's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOrigin {
    /// Embedded text above the content threshold.
    Native,
    /// Scanned page answered from the OCR cache.
    Cache,
    /// Scanned page transcribed by the vision backend on this call.
    Ocr,
    /// Scanned page with no vision backend configured; contributes no text.
    OcrUnavailable,
    /// Scanned page whose vision call failed; contributes no text.
    OcrFailed,
}

impl TextOrigin {
    /// `true` when the page text is the product of OCR (fresh or cached).
    pub fn used_ocr(&self) -> bool {
        matches!(self, TextOrigin::Cache | TextOrigin::Ocr)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextOrigin::Native => "native",
            TextOrigin::Cache => "cache",
            TextOrigin::Ocr => "ocr",
            TextOrigin::OcrUnavailable => "ocr_unavailable",
            TextOrigin::OcrFailed => "ocr_failed",
        }
    }
}

/// Text of one page and its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_index: usize,
    pub text: String,
    pub origin: TextOrigin,
}

/// Every page of a document, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    pub pages: Vec<PageText>,
}

impl DocumentText {
    /// `true` if any page needed OCR.
    pub fn used_ocr(&self) -> bool {
        self.pages.iter().any(|p| p.origin.used_ocr())
    }

    /// Page texts joined with newlines.
    pub fn joined(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Resolves page text with cache-checked OCR fallback.
#[derive(Clone)]
pub struct PageTextSource {
    cache: Arc<dyn OcrCacheStore>,
    vision: Option<Arc<dyn VisionBackend>>,
    settings: OcrSettings,
}

impl std::fmt::Debug for PageTextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageTextSource")
            .field("vision", &self.vision.as_ref().map(|v| v.model().to_string()))
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PageTextSource {
    pub fn new(
        cache: Arc<dyn OcrCacheStore>,
        vision: Option<Arc<dyn VisionBackend>>,
        settings: OcrSettings,
    ) -> Self {
        Self {
            cache,
            vision,
            settings,
        }
    }

    /// Tiered cache at `config.cache_path` and, when an API key is set, the OpenAI client.
    pub fn from_config(config: &Config) -> OcrResult<Self> {
        let cache = TieredOcrCache::new(
            MemoryOcrCache::with_capacity(config.cache_capacity),
            DiskOcrCache::new(config.cache_path.clone()),
        );
        let vision = OpenAiVisionClient::from_config(config)?
            .map(|client| Arc::new(client) as Arc<dyn VisionBackend>);
        if vision.is_none() {
            warn!("OPENAI_API_KEY not set, scanned pages will contribute no text");
        }
        Ok(Self::new(Arc::new(cache), vision, config.ocr))
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    pub fn has_vision(&self) -> bool {
        self.vision.is_some()
    }

    /// Text of page `page_index`.
    ///
    /// Only page-range and native-extraction failures are errors. Every OCR problem degrades
    /// to empty text with [`TextOrigin::OcrUnavailable`] or [`TextOrigin::OcrFailed`].
    /// `document_id` is recorded on new cache entries.
    pub async fn page_text(
        &self,
        source: &dyn PdfSource,
        page_index: usize,
        document_id: Option<i64>,
    ) -> PdfResult<PageText> {
        source.check_page(page_index)?;

        let native = match source.native_text(page_index) {
            Ok(text) => text,
            Err(e) => {
                warn!(page = page_index, error = %e, "Native text extraction failed, treating page as scanned");
                String::new()
            }
        };

        if self.settings.has_native_content(&native) {
            return Ok(PageText {
                page_index,
                text: native,
                origin: TextOrigin::Native,
            });
        }

        // No fingerprint without block data; such pages skip the cache entirely.
        let fingerprint = match source.blocks(page_index) {
            Ok(blocks) => Some(fingerprint_page(page_index, &native, &blocks)),
            Err(e) => {
                warn!(page = page_index, error = %e, "Page blocks unreadable, bypassing OCR cache");
                None
            }
        };

        if let Some(fingerprint) = fingerprint
            && let Some(text) = self.lookup(page_index, fingerprint).await
        {
            return Ok(PageText {
                page_index,
                text,
                origin: TextOrigin::Cache,
            });
        }

        let Some(vision) = self.vision.as_deref() else {
            warn!(page = page_index, "Scanned page but no OCR backend configured");
            return Ok(PageText {
                page_index,
                text: String::new(),
                origin: TextOrigin::OcrUnavailable,
            });
        };

        match ocr_page(source, page_index, vision, &self.settings).await {
            Ok(text) => {
                info!(
                    page = page_index,
                    chars = text.chars().count(),
                    model = vision.model(),
                    "OCR successful"
                );
                if let Some(fingerprint) = fingerprint {
                    self.remember(fingerprint, &text, vision.model(), document_id)
                        .await;
                }
                Ok(PageText {
                    page_index,
                    text,
                    origin: TextOrigin::Ocr,
                })
            }
            Err(e) => {
                warn!(page = page_index, error = %e, "OCR call failed");
                Ok(PageText {
                    page_index,
                    text: String::new(),
                    origin: TextOrigin::OcrFailed,
                })
            }
        }
    }

    async fn lookup(&self, page_index: usize, fingerprint: PageFingerprint) -> Option<String> {
        match self.cache.get(&fingerprint).await {
            Ok(Some(hit)) => {
                debug!(page = page_index, fingerprint = %fingerprint, "OCR cache hit");
                Some(hit.text)
            }
            Ok(None) => {
                debug!(page = page_index, fingerprint = %fingerprint, "OCR cache miss");
                None
            }
            Err(e) => {
                warn!(page = page_index, fingerprint = %fingerprint, error = %e, "OCR cache read failed, treating as miss");
                None
            }
        }
    }

    async fn remember(
        &self,
        fingerprint: PageFingerprint,
        text: &str,
        model: &str,
        document_id: Option<i64>,
    ) {
        let entry = CachedPage::new(fingerprint, text, model, document_id);
        if let Err(e) = self.cache.put(&entry).await {
            warn!(fingerprint = %fingerprint, error = %e, "Failed to store OCR result");
        }
    }

    /// Text of every page, in page order.
    pub async fn document_text(
        &self,
        source: &dyn PdfSource,
        document_id: Option<i64>,
    ) -> PdfResult<DocumentText> {
        let mut pages = Vec::with_capacity(source.page_count());
        for page_index in 0..source.page_count() {
            pages.push(self.page_text(source, page_index, document_id).await?);
        }
        Ok(DocumentText { pages })
    }
}
