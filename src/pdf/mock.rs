use async_trait::async_trait;
use image::DynamicImage;
use parking_lot::Mutex;

use super::error::{PdfError, PdfResult};
use super::{BlockRect, PageBlock, PdfSource};

/// One page of a [`MemoryDocument`].
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    pub text: String,
    pub blocks: Vec<PageBlock>,
    pub image: Option<DynamicImage>,
}

impl MemoryPage {
    /// A page with embedded text and a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blocks: vec![PageBlock::Text {
                rect: BlockRect {
                    x0: 72.0,
                    y0: 72.0,
                    x1: 523.0,
                    y1: 770.0,
                },
            }],
            image: None,
        }
    }

    /// An image-only page: no embedded text, one full-page image block and a blank raster.
    pub fn scanned(pixel_width: u32, pixel_height: u32) -> Self {
        let image = DynamicImage::new_rgb8(pixel_width.max(1), pixel_height.max(1));
        Self {
            text: String::new(),
            blocks: vec![PageBlock::Image {
                rect: BlockRect {
                    x0: 0.0,
                    y0: 0.0,
                    x1: 595.0,
                    y1: 842.0,
                },
                pixel_width,
                pixel_height,
                content_digest: raster_digest(&image),
            }],
            image: Some(image),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Replaces the raster; image blocks take its digest as their stored data.
    pub fn with_image(mut self, image: DynamicImage) -> Self {
        let digest = raster_digest(&image);
        for block in &mut self.blocks {
            if let PageBlock::Image { content_digest, .. } = block {
                *content_digest = digest;
            }
        }
        self.image = Some(image);
        self
    }
}

fn raster_digest(image: &DynamicImage) -> [u8; 32] {
    *blake3::hash(image.as_bytes()).as_bytes()
}

/// In-memory [`PdfSource`] that records which pages were rasterized.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    pages: Vec<MemoryPage>,
    renders: Mutex<Vec<usize>>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<MemoryPage>) -> Self {
        Self {
            pages,
            renders: Mutex::new(Vec::new()),
        }
    }

    /// Builds a text-only document, one page per entry.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(MemoryPage::text).collect())
    }

    /// Page indices passed to `render_page`, in call order.
    pub fn rendered_pages(&self) -> Vec<usize> {
        self.renders.lock().clone()
    }
}

#[async_trait]
impl PdfSource for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn native_text(&self, page_index: usize) -> PdfResult<String> {
        self.check_page(page_index)?;
        Ok(self.pages[page_index].text.clone())
    }

    fn blocks(&self, page_index: usize) -> PdfResult<Vec<PageBlock>> {
        self.check_page(page_index)?;
        Ok(self.pages[page_index].blocks.clone())
    }

    async fn render_page(&self, page_index: usize, _dpi: u32) -> PdfResult<DynamicImage> {
        self.check_page(page_index)?;
        self.renders.lock().push(page_index);
        self.pages[page_index]
            .image
            .clone()
            .ok_or_else(|| PdfError::Render {
                index: page_index,
                reason: "page has no raster".to_string(),
            })
    }
}
