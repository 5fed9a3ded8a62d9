//! OCR cache: page fingerprint → previously extracted text.
//!
//! The cache is a memo, not a lock. Two requests that OCR the same uncached page
//! concurrently both succeed and the last write wins; the content is identical by
//! construction.

pub mod disk;
pub mod error;
pub mod memory;
pub mod tiered;
pub mod types;


pub use disk::DiskOcrCache;
pub use error::{CacheError, CacheResult};
pub use memory::MemoryOcrCache;
pub use tiered::TieredOcrCache;
pub use types::{CacheTier, CachedPage};

use async_trait::async_trait;

use crate::hashing::PageFingerprint;

#[async_trait]
/// Key-value store for OCR results.
pub trait OcrCacheStore: Send + Sync {
    /// Returns the cached page for `fingerprint`, if any.
    async fn get(&self, fingerprint: &PageFingerprint) -> CacheResult<Option<CachedPage>>;

    /// Stores `page` under its fingerprint. Re-storing a fingerprint is a no-op in effect.
    async fn put(&self, page: &CachedPage) -> CacheResult<()>;
}
