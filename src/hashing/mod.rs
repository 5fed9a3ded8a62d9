//! Content fingerprints for PDF pages (OCR cache keys).
//!
//! A fingerprint covers the page index, the page's native text and, for every image block,
//! its geometry, pixel size and a digest of its stored data. The file path is never part of
//! the input, so the same document uploaded under a different name maps to the same keys,
//! while two scans with identical layout but different pixels still miss.

use blake3::Hasher;

use crate::pdf::{BlockRect, PageBlock};

/// Length of the hex form of a fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// BLAKE3 digest of a page's semantic content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageFingerprint([u8; 32]);

impl PageFingerprint {
    /// Wraps raw digest bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the lowercase hex form used as the storage key.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }

    /// Parses a 64-character hex digest.
    pub fn from_hex(hex: &str) -> Option<Self> {
        blake3::Hash::from_hex(hex)
            .ok()
            .map(|h| Self(*h.as_bytes()))
    }
}

impl std::fmt::Display for PageFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for PageFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PageFingerprint({})", &self.to_hex()[..16])
    }
}

/// Computes the fingerprint of one page.
///
/// Coordinates are quantized to 1/100 pt so that float noise from re-serialized content
/// streams cannot change the key.
pub fn fingerprint_page(page_index: usize, text: &str, blocks: &[PageBlock]) -> PageFingerprint {
    let mut hasher = Hasher::new();
    hasher.update(b"page|");
    hasher.update(&(page_index as u64).to_le_bytes());
    hasher.update(b"|text|");
    hasher.update(&(text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());

    for block in blocks {
        if let PageBlock::Image {
            rect,
            pixel_width,
            pixel_height,
            content_digest,
        } = block
        {
            hasher.update(b"|image|");
            update_rect(&mut hasher, rect);
            hasher.update(&pixel_width.to_le_bytes());
            hasher.update(&pixel_height.to_le_bytes());
            hasher.update(content_digest);
        }
    }

    PageFingerprint(*hasher.finalize().as_bytes())
}

fn update_rect(hasher: &mut Hasher, rect: &BlockRect) {
    for value in [rect.x0, rect.y0, rect.x1, rect.y1] {
        hasher.update(&quantize(value).to_le_bytes());
    }
}

#[inline]
fn quantize(value: f64) -> i64 {
    (value * 100.0).round() as i64
}
