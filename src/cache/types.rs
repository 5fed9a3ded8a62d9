use rkyv::{Archive, Deserialize, Serialize};

use crate::hashing::PageFingerprint;

/// OCR text memoized for one page fingerprint.
///
/// Written once after a successful vision call and never mutated.
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Eq, Clone)]
pub struct CachedPage {
    /// Raw BLAKE3 fingerprint bytes.
    pub fingerprint: [u8; 32],
    /// Extracted page text.
    pub text: String,
    /// Model that produced `text`.
    pub model: String,
    /// Owning document (applicant) id, if the caller supplied one.
    pub document_id: Option<i64>,
    /// Unix timestamp (seconds) of creation.
    pub created_at: i64,
}

impl CachedPage {
    /// Creates an entry stamped with the current time.
    pub fn new(
        fingerprint: PageFingerprint,
        text: impl Into<String>,
        model: impl Into<String>,
        document_id: Option<i64>,
    ) -> Self {
        Self {
            fingerprint: *fingerprint.as_bytes(),
            text: text.into(),
            model: model.into(),
            document_id,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    #[inline]
    pub fn fingerprint(&self) -> PageFingerprint {
        PageFingerprint::from_bytes(self.fingerprint)
    }
}

/// Which tier answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    Memory,
    Disk,
}

impl CacheTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTier::Memory => "memory",
            CacheTier::Disk => "disk",
        }
    }
}

impl std::fmt::Display for CacheTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
