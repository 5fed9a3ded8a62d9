//! Vision-LLM OCR for image-only pages.
//!
//! A page is rendered at the configured DPI, flattened to opaque RGB, JPEG-encoded and sent
//! to a [`VisionBackend`] with a verbatim-transcription instruction at temperature 0.

pub mod encode;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod vision;


pub use encode::{EncodedImage, encode_jpeg, flatten_to_rgb};
pub use error::{OcrError, OcrResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MOCK_VISION_MODEL, MockVisionBackend};
pub use vision::{OCR_INSTRUCTION, OpenAiVisionClient, VisionBackend};

use tracing::{debug, instrument};

use crate::constants::OcrSettings;
use crate::pdf::PdfSource;

/// Renders, encodes and transcribes one page.
#[instrument(skip(source, backend, settings), fields(model = backend.model()))]
pub async fn ocr_page(
    source: &dyn PdfSource,
    page_index: usize,
    backend: &dyn VisionBackend,
    settings: &OcrSettings,
) -> OcrResult<String> {
    let raster = source.render_page(page_index, settings.render_dpi).await?;
    let encoded = encode_jpeg(&raster, settings.jpeg_quality)?;

    debug!(
        page = page_index,
        width = encoded.width,
        height = encoded.height,
        jpeg_bytes = encoded.byte_len,
        "Encoded page for OCR"
    );

    let text = backend.transcribe(&encoded, settings.max_tokens).await?;
    if text.trim().is_empty() {
        return Err(OcrError::EmptyResponse);
    }
    Ok(text)
}
