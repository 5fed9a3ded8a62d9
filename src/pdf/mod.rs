//! PDF document sources.
//!
//! The extraction core only sees [`PdfSource`]: page count, per-page native text, per-page
//! blocks (for fingerprinting and scanned-page detection) and per-page rasterization.
//! [`LopdfDocument`] is the production implementation; [`MemoryDocument`] backs tests.

pub mod content;
pub mod document;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod render;

#[cfg(test)]
mod tests;

pub use content::{ImageXObject, ImageXObjects, ScannedPage, scan_page};
pub use document::LopdfDocument;
pub use error::{PdfError, PdfResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MemoryDocument, MemoryPage};
pub use render::PdftoppmRasterizer;

use async_trait::async_trait;
use image::DynamicImage;

use crate::constants::MIN_NATIVE_TEXT_CHARS;

/// Axis-aligned rectangle in PDF user space (points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BlockRect {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// A structural block on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageBlock {
    /// A `BT`..`ET` text object.
    Text { rect: BlockRect },
    /// A placed raster image.
    Image {
        rect: BlockRect,
        pixel_width: u32,
        pixel_height: u32,
        /// BLAKE3 digest of the image data as stored in the file.
        content_digest: [u8; 32],
    },
}

impl PageBlock {
    #[inline]
    pub fn is_image(&self) -> bool {
        matches!(self, PageBlock::Image { .. })
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, PageBlock::Text { .. })
    }

    pub fn rect(&self) -> &BlockRect {
        match self {
            PageBlock::Text { rect } | PageBlock::Image { rect, .. } => rect,
        }
    }
}

#[async_trait]
/// Per-page access to a PDF document. Page indices are 0-based and in document order.
pub trait PdfSource: Send + Sync {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Embedded text of a page.
    fn native_text(&self, page_index: usize) -> PdfResult<String>;

    /// Text and image blocks of a page.
    fn blocks(&self, page_index: usize) -> PdfResult<Vec<PageBlock>>;

    /// Rasterizes a page at `dpi`.
    async fn render_page(&self, page_index: usize, dpi: u32) -> PdfResult<DynamicImage>;

    /// Returns `PageOutOfRange` unless `page_index < page_count()`.
    fn check_page(&self, page_index: usize) -> PdfResult<()> {
        let count = self.page_count();
        if page_index >= count {
            return Err(PdfError::PageOutOfRange {
                index: page_index,
                count,
            });
        }
        Ok(())
    }
}

/// Block counts and scanned-page verdict for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageProbe {
    pub page_index: usize,
    pub native_chars: usize,
    pub text_blocks: usize,
    pub image_blocks: usize,
    pub scanned: bool,
}

/// Reports whether a page looks image-only: little native text and at least one image block.
///
/// Diagnostic only. The OCR fallback decides on the text threshold alone.
pub fn is_scanned_page(source: &dyn PdfSource, page_index: usize) -> bool {
    probe_page(source, page_index)
        .map(|p| p.scanned)
        .unwrap_or(false)
}

/// Collects [`PageProbe`] data for one page.
pub fn probe_page(source: &dyn PdfSource, page_index: usize) -> PdfResult<PageProbe> {
    source.check_page(page_index)?;

    let native_chars = source
        .native_text(page_index)
        .map(|t| t.trim().chars().count())
        .unwrap_or(0);
    let blocks = source.blocks(page_index).unwrap_or_default();
    let text_blocks = blocks.iter().filter(|b| b.is_text()).count();
    let image_blocks = blocks.iter().filter(|b| b.is_image()).count();

    Ok(PageProbe {
        page_index,
        native_chars,
        text_blocks,
        image_blocks,
        scanned: native_chars <= MIN_NATIVE_TEXT_CHARS && image_blocks > 0,
    })
}
