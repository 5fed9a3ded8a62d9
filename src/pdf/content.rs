//! Content-stream walk that lays out native text and locates text objects and placed images.
//!
//! Tracks the current transformation matrix through `q`/`Q`/`cm`, records a text block per
//! `BT`..`ET` pair (bounding box of the text origins seen inside it) and an image block per
//! `Do` of an image XObject or inline `BI` image (unit square mapped through the CTM).
//!
//! Shown strings are joined into page text. A new line starts whenever the text origin
//! moves vertically or a `T*`, `'` or `"` operator advances to the next line, so headings
//! written inside one text object still land on their own lines.

use std::collections::HashMap;

use lopdf::Object;
use lopdf::content::Operation;

use super::{BlockRect, PageBlock};

/// Vertical origin movement, in points, that starts a new text line.
const LINE_BREAK_EPSILON: f64 = 1.0;

/// `TJ` adjustment, in thousandths of a unit of text space, read as a word gap.
const TJ_WORD_GAP: f64 = -100.0;

/// Pixel size and data digest of an image XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageXObject {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub content_digest: [u8; 32],
}

impl ImageXObject {
    pub fn new(pixel_width: u32, pixel_height: u32, data: &[u8]) -> Self {
        Self {
            pixel_width,
            pixel_height,
            content_digest: *blake3::hash(data).as_bytes(),
        }
    }

    fn block(&self, rect: BlockRect) -> PageBlock {
        PageBlock::Image {
            rect,
            pixel_width: self.pixel_width,
            pixel_height: self.pixel_height,
            content_digest: self.content_digest,
        }
    }
}

/// The page's image XObjects, keyed by resource name.
pub type ImageXObjects = HashMap<Vec<u8>, ImageXObject>;

/// Text and blocks recovered from one page's content stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScannedPage {
    pub text: String,
    pub blocks: Vec<PageBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        Some(Self {
            a: number(&operands[0])?,
            b: number(&operands[1])?,
            c: number(&operands[2])?,
            d: number(&operands[3])?,
            e: number(&operands[4])?,
            f: number(&operands[5])?,
        })
    }

    fn translation(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self` applied first, then `next`.
    fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn unit_square(&self) -> BlockRect {
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(1.0, 0.0),
            self.apply(0.0, 1.0),
            self.apply(1.0, 1.0),
        ];
        bounding_box(&corners)
    }
}

fn bounding_box(points: &[(f64, f64)]) -> BlockRect {
    let mut rect = BlockRect {
        x0: f64::INFINITY,
        y0: f64::INFINITY,
        x1: f64::NEG_INFINITY,
        y1: f64::NEG_INFINITY,
    };
    for &(x, y) in points {
        rect.x0 = rect.x0.min(x);
        rect.y0 = rect.y0.min(y);
        rect.x1 = rect.x1.max(x);
        rect.y1 = rect.y1.max(y);
    }
    if points.is_empty() {
        rect = BlockRect {
            x0: 0.0,
            y0: 0.0,
            x1: 0.0,
            y1: 0.0,
        };
    }
    rect
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn dimension(obj: Option<&Object>) -> u32 {
    obj.and_then(number)
        .filter(|v| *v > 0.0)
        .map(|v| v as u32)
        .unwrap_or(0)
}

fn string_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::String(bytes, _) => Some(bytes),
        _ => None,
    }
}

/// Inline image: `lopdf` parses `BI .. ID .. EI` into a single stream operand.
fn inline_image(op: &Operation) -> ImageXObject {
    match op.operands.first().and_then(|o| o.as_stream().ok()) {
        Some(stream) => {
            let w = stream.dict.get(b"W").or_else(|_| stream.dict.get(b"Width")).ok();
            let h = stream.dict.get(b"H").or_else(|_| stream.dict.get(b"Height")).ok();
            ImageXObject::new(dimension(w), dimension(h), &stream.content)
        }
        None => ImageXObject::new(0, 0, &[]),
    }
}

/// Accumulates shown strings into lines.
#[derive(Debug, Default)]
struct TextLayout {
    text: String,
    last_y: Option<f64>,
    line_break: bool,
    moved: bool,
}

impl TextLayout {
    fn show(&mut self, origin: (f64, f64), chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        let (_, y) = origin;
        if !self.text.is_empty() {
            let new_line = self.line_break
                || self
                    .last_y
                    .is_some_and(|last| (last - y).abs() > LINE_BREAK_EPSILON);
            if new_line {
                if !self.text.ends_with('\n') {
                    self.text.push('\n');
                }
            } else if self.moved
                && !self.text.ends_with(char::is_whitespace)
                && !chunk.starts_with(char::is_whitespace)
            {
                self.text.push(' ');
            }
        }
        self.text.push_str(chunk);
        self.last_y = Some(y);
        self.line_break = false;
        self.moved = false;
    }

    fn finish(mut self) -> String {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text
    }
}

/// Walks decoded page operations and returns the page text and blocks in content order.
///
/// `decode` maps a string operand to text for the font resource selected by `Tf`.
pub fn scan_page<F>(operations: &[Operation], images: &ImageXObjects, decode: F) -> ScannedPage
where
    F: Fn(&[u8], &[u8]) -> String,
{
    let mut blocks = Vec::new();
    let mut layout = TextLayout::default();
    let mut ctm = Matrix::IDENTITY;
    let mut stack: Vec<Matrix> = Vec::new();

    let mut in_text = false;
    let mut line_matrix = Matrix::IDENTITY;
    let mut leading = 0.0_f64;
    let mut font: Vec<u8> = Vec::new();
    let mut text_points: Vec<(f64, f64)> = Vec::new();

    for op in operations {
        match op.operator.as_str() {
            "q" => stack.push(ctm),
            "Q" => {
                if let Some(saved) = stack.pop() {
                    ctm = saved;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    ctm = m.then(&ctm);
                }
            }
            "BT" => {
                in_text = true;
                line_matrix = Matrix::IDENTITY;
                layout.moved = true;
                text_points.clear();
            }
            "ET" => {
                if in_text {
                    blocks.push(PageBlock::Text {
                        rect: bounding_box(&text_points),
                    });
                }
                in_text = false;
            }
            "Tf" => {
                if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                    font = name.to_vec();
                }
            }
            "TL" => {
                leading = op.operands.first().and_then(number).unwrap_or(leading);
            }
            "Tm" if in_text => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    line_matrix = m;
                    layout.moved = true;
                    text_points.push(line_matrix.then(&ctm).apply(0.0, 0.0));
                }
            }
            "Td" | "TD" if in_text => {
                let tx = op.operands.first().and_then(number).unwrap_or(0.0);
                let ty = op.operands.get(1).and_then(number).unwrap_or(0.0);
                if op.operator == "TD" {
                    leading = -ty;
                }
                line_matrix = Matrix::translation(tx, ty).then(&line_matrix);
                layout.moved = true;
                text_points.push(line_matrix.then(&ctm).apply(0.0, 0.0));
            }
            "T*" | "'" | "\"" if in_text => {
                line_matrix = Matrix::translation(0.0, -leading).then(&line_matrix);
                layout.line_break = true;
                let origin = line_matrix.then(&ctm).apply(0.0, 0.0);
                text_points.push(origin);

                let shown = match op.operator.as_str() {
                    "'" => op.operands.first(),
                    "\"" => op.operands.get(2),
                    _ => None,
                };
                if let Some(bytes) = shown.and_then(string_bytes) {
                    layout.show(origin, &decode(&font, bytes));
                }
            }
            "Tj" if in_text => {
                let origin = line_matrix.then(&ctm).apply(0.0, 0.0);
                text_points.push(origin);
                if let Some(bytes) = op.operands.first().and_then(string_bytes) {
                    layout.show(origin, &decode(&font, bytes));
                }
            }
            "TJ" if in_text => {
                let origin = line_matrix.then(&ctm).apply(0.0, 0.0);
                text_points.push(origin);

                let mut chunk = String::new();
                let parts = op.operands.first().and_then(|o| o.as_array().ok());
                for part in parts.into_iter().flatten() {
                    if let Some(bytes) = string_bytes(part) {
                        chunk.push_str(&decode(&font, bytes));
                    } else if number(part).is_some_and(|n| n < TJ_WORD_GAP)
                        && !chunk.is_empty()
                        && !chunk.ends_with(' ')
                    {
                        chunk.push(' ');
                    }
                }
                layout.show(origin, &chunk);
            }
            "Do" => {
                let name = op.operands.first().and_then(|o| o.as_name().ok());
                if let Some(image) = name.and_then(|n| images.get(n)) {
                    blocks.push(image.block(ctm.unit_square()));
                }
            }
            "BI" => {
                blocks.push(inline_image(op).block(ctm.unit_square()));
            }
            _ => {}
        }
    }

    ScannedPage {
        text: layout.finish(),
        blocks,
    }
}
