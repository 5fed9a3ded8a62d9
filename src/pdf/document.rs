//! `lopdf`-backed [`PdfSource`].
//!
//! Native text and block geometry for every page are read once at open time from a single
//! content-stream walk, so the parsed object graph is dropped before any await point. Rasterization goes through
//! [`PdftoppmRasterizer`] against the original file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::DynamicImage;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use tracing::{debug, warn};

use super::content::{ImageXObject, ImageXObjects, ScannedPage, number, scan_page};
use super::error::{PdfError, PdfResult};
use super::render::PdftoppmRasterizer;
use super::{PageBlock, PdfSource};

/// Upper bound on `/Parent` hops when resolving inherited resources.
const MAX_PARENT_DEPTH: usize = 32;

#[derive(Debug, Clone)]
struct PageData {
    text: Result<String, String>,
    blocks: Result<Vec<PageBlock>, String>,
}

/// A PDF file opened with `lopdf`.
#[derive(Debug, Clone)]
pub struct LopdfDocument {
    path: PathBuf,
    pages: Vec<PageData>,
    rasterizer: PdftoppmRasterizer,
}

impl LopdfDocument {
    /// Opens and pre-reads `path` with the default rasterizer.
    pub fn open(path: impl AsRef<Path>) -> PdfResult<Self> {
        Self::open_with_rasterizer(path, PdftoppmRasterizer::default())
    }

    /// Opens and pre-reads `path`, rendering pages with `rasterizer`.
    pub fn open_with_rasterizer(
        path: impl AsRef<Path>,
        rasterizer: PdftoppmRasterizer,
    ) -> PdfResult<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = Document::load(&path).map_err(|e| PdfError::Open {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let pages: Vec<PageData> = doc
            .get_pages()
            .into_iter()
            .map(|(page_number, page_id)| read_page(&doc, page_number, page_id))
            .collect();

        debug!(path = %path.display(), pages = pages.len(), "Opened PDF");

        Ok(Self {
            path,
            pages,
            rasterizer,
        })
    }

    /// Path the document was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_page(doc: &Document, page_number: u32, page_id: ObjectId) -> PageData {
    match scan_content(doc, page_id) {
        Ok(page) => PageData {
            text: Ok(page.text),
            blocks: Ok(page.blocks),
        },
        Err(reason) => {
            warn!(page = page_number, %reason, "Failed to scan page content");
            PageData {
                text: Err(reason.clone()),
                blocks: Err(reason),
            }
        }
    }
}

fn scan_content(doc: &Document, page_id: ObjectId) -> Result<ScannedPage, String> {
    let raw = doc.get_page_content(page_id).map_err(|e| e.to_string())?;
    let content = Content::decode(&raw).map_err(|e| e.to_string())?;
    let images = image_xobjects(doc, page_id);
    let encodings = font_encodings(doc, page_id);

    Ok(scan_page(&content.operations, &images, |font, bytes| {
        encodings
            .get(font)
            .and_then(|encoding| Document::decode_text(encoding, bytes).ok())
            .unwrap_or_else(|| latin1(bytes))
    }))
}

/// Encodings of the page's fonts; fonts whose encoding cannot be read are left out.
fn font_encodings(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, Encoding<'_>> {
    let fonts = match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts,
        Err(e) => {
            debug!(error = %e, "Page fonts unavailable");
            return BTreeMap::new();
        }
    };

    fonts
        .into_iter()
        .filter_map(|(name, font)| match font.get_font_encoding(doc) {
            Ok(encoding) => Some((name, encoding)),
            Err(e) => {
                let font = String::from_utf8_lossy(&name);
                debug!(%font, error = %e, "Font encoding unavailable");
                None
            }
        })
        .collect()
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).and_then(|o| o.as_dict().ok())
}

/// Finds the page's `/Resources`, following `/Parent` for inherited resources.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Some(resources) = node
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve_dict(doc, o))
        {
            return Some(resources);
        }
        node = node
            .get(b"Parent")
            .ok()
            .and_then(|o| resolve_dict(doc, o))?;
    }
    None
}

fn image_xobjects(doc: &Document, page_id: ObjectId) -> ImageXObjects {
    let mut images = ImageXObjects::new();

    let Some(xobjects) = page_resources(doc, page_id)
        .and_then(|r| r.get(b"XObject").ok())
        .and_then(|o| resolve_dict(doc, o))
    else {
        return images;
    };

    for (name, obj) in xobjects.iter() {
        let Some(stream) = resolve(doc, obj).and_then(|o| o.as_stream().ok()) else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|n| n == b"Image");
        if !is_image {
            continue;
        }

        let dim = |key: &[u8]| -> u32 {
            stream
                .dict
                .get(key)
                .ok()
                .and_then(|o| resolve(doc, o))
                .and_then(number)
                .filter(|v| *v > 0.0)
                .map(|v| v as u32)
                .unwrap_or(0)
        };
        images.insert(
            name.clone(),
            ImageXObject::new(
                dim(b"Width".as_slice()),
                dim(b"Height".as_slice()),
                &stream.content,
            ),
        );
    }

    images
}

#[async_trait]
impl PdfSource for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn native_text(&self, page_index: usize) -> PdfResult<String> {
        self.check_page(page_index)?;
        self.pages[page_index]
            .text
            .clone()
            .map_err(|reason| PdfError::Text {
                index: page_index,
                reason,
            })
    }

    fn blocks(&self, page_index: usize) -> PdfResult<Vec<PageBlock>> {
        self.check_page(page_index)?;
        self.pages[page_index]
            .blocks
            .clone()
            .map_err(|reason| PdfError::Content {
                index: page_index,
                reason,
            })
    }

    async fn render_page(&self, page_index: usize, dpi: u32) -> PdfResult<DynamicImage> {
        self.check_page(page_index)?;
        self.rasterizer.render(&self.path, page_index, dpi).await
    }
}
