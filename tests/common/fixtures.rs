//! Fixture PDFs and wired-up extractors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tempfile::TempDir;

use tenderlens::cache::{DiskOcrCache, MemoryOcrCache, OcrCacheStore, TieredOcrCache};
use tenderlens::constants::OcrSettings;
use tenderlens::extract::{HeadingHeuristics, PageTextSource, SectionExtractor};
use tenderlens::ocr::{MockVisionBackend, VisionBackend};
use tenderlens::pdf::PdftoppmRasterizer;

pub const PAGE_WIDTH: i64 = 595;
pub const PAGE_HEIGHT: i64 = 842;

/// A binary that does not exist, so page rasterization always fails.
pub const MISSING_PDFTOPPM: &str = "/nonexistent/tenderlens-test/pdftoppm";

/// One page of a fixture PDF.
#[derive(Debug, Clone)]
pub enum FixturePage {
    /// Each entry becomes its own text object, i.e. one extracted line.
    Text(Vec<String>),
    /// All entries in a single text object, advanced with `T*` and `'`.
    Flowing(Vec<String>),
    /// A full-page grayscale image with no text.
    Scanned,
    /// Same layout as [`FixturePage::Scanned`], filled with the given gray level.
    ScannedShade(u8),
}

impl FixturePage {
    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FixturePage::Text(lines.into_iter().map(Into::into).collect())
    }

    /// Re-lays a text page as one flowing text object; other pages are unchanged.
    pub fn into_flowing(self) -> Self {
        match self {
            FixturePage::Text(lines) => FixturePage::Flowing(lines),
            other => other,
        }
    }
}

fn text_content(lines: &[String]) -> Content {
    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let y = PAGE_HEIGHT - 72 - (i as i64) * 14;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
        operations.push(Operation::new("Td", vec![56.into(), y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(line.as_str())],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

fn flowing_content(lines: &[String]) -> Content {
    let top = PAGE_HEIGHT - 72;
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 10.into()]),
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![56.into(), top.into()]),
    ];
    for (i, line) in lines.iter().enumerate() {
        let text = Object::string_literal(line.as_str());
        match i {
            0 => operations.push(Operation::new("Tj", vec![text])),
            i if i % 2 == 1 => {
                operations.push(Operation::new("T*", vec![]));
                operations.push(Operation::new("Tj", vec![text]));
            }
            _ => operations.push(Operation::new("'", vec![text])),
        }
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

fn scanned_content() -> Content {
    Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    PAGE_WIDTH.into(),
                    0.into(),
                    0.into(),
                    PAGE_HEIGHT.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
    }
}

fn add_page(doc: &mut Document, pages_id: ObjectId, font_id: ObjectId, page: &FixturePage) -> ObjectId {
    let (content, resources) = match page {
        FixturePage::Text(lines) => (
            text_content(lines),
            dictionary! { "Font" => dictionary! { "F1" => font_id } },
        ),
        FixturePage::Flowing(lines) => (
            flowing_content(lines),
            dictionary! { "Font" => dictionary! { "F1" => font_id } },
        ),
        FixturePage::Scanned | FixturePage::ScannedShade(_) => {
            let shade = match page {
                FixturePage::ScannedShade(shade) => *shade,
                _ => 0x80,
            };
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 8,
                    "Height" => 8,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![shade; 64],
            ));
            (
                scanned_content(),
                dictionary! { "XObject" => dictionary! { "Im1" => image_id } },
            )
        }
    };

    let encoded = content.encode().expect("content stream encodes");
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    })
}

/// Writes a PDF with `pages` to `path`.
pub fn write_pdf(path: &Path, pages: &[FixturePage]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let kids: Vec<Object> = pages
        .iter()
        .map(|page| add_page(&mut doc, pages_id, font_id, page).into())
        .collect();
    let count = kids.len() as i64;

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(path).expect("fixture PDF saves");
}

/// A tender response: cover, table of contents, Criterion 1..=3, then an appendix.
pub fn tender_pages() -> Vec<FixturePage> {
    vec![
        FixturePage::lines([
            "Tender Response Document",
            "Submitted by Example Applicant Ltd for the regional services contract.",
        ]),
        FixturePage::lines([
            "Contents",
            "Criterion 1 Approach........................ 3",
            "Criterion 2 Delivery........................ 4",
            "Criterion 3 Social Value.................... 5",
        ]),
        FixturePage::lines([
            "Criterion 1 Approach",
            "Our approach is built on three phases of mobilisation and delivery.",
        ]),
        FixturePage::lines([
            "Criterion 2 Delivery",
            "We will deliver the service from two regional hubs staffed daily.",
            "Each hub keeps a named contract manager on site.",
        ]),
        FixturePage::lines([
            "Criterion 3 Social Value",
            "We commit to local hiring targets and apprenticeships every year.",
        ]),
        FixturePage::lines([
            "Appendix A",
            "Supporting certificates and insurance documents are attached here.",
        ]),
    ]
}

/// [`tender_pages`] with every text page written as a single flowing text object.
pub fn flowing_tender_pages() -> Vec<FixturePage> {
    tender_pages()
        .into_iter()
        .map(FixturePage::into_flowing)
        .collect()
}

/// Owns a temp directory holding fixture PDFs and the OCR cache.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn pdf(&self, name: &str, pages: &[FixturePage]) -> PathBuf {
        let path = self.path(name);
        write_pdf(&path, pages);
        path
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.path("ocr-cache")
    }

    /// Fresh memory tier over the shared disk directory, like a new process would see.
    pub fn cache(&self) -> Arc<TieredOcrCache> {
        Arc::new(TieredOcrCache::new(
            MemoryOcrCache::new(),
            DiskOcrCache::new(self.cache_dir()),
        ))
    }

    pub fn extractor(
        &self,
        cache: Arc<TieredOcrCache>,
        vision: Option<Arc<MockVisionBackend>>,
    ) -> SectionExtractor {
        let pages = PageTextSource::new(
            cache as Arc<dyn OcrCacheStore>,
            vision.map(|v| v as Arc<dyn VisionBackend>),
            OcrSettings::default(),
        );
        SectionExtractor::new(pages, HeadingHeuristics::default())
            .with_rasterizer(PdftoppmRasterizer::new(MISSING_PDFTOPPM))
    }
}
