//! In-memory OCR cache tier.

use std::sync::Arc;

use async_trait::async_trait;
use moka::sync::Cache;

use super::error::CacheResult;
use super::types::CachedPage;
use super::OcrCacheStore;
use crate::hashing::PageFingerprint;

/// Bounded in-memory map from fingerprint to [`CachedPage`] (LRU-style eviction).
#[derive(Clone)]
pub struct MemoryOcrCache {
    entries: Cache<[u8; 32], Arc<CachedPage>>,
}

impl MemoryOcrCache {
    const DEFAULT_CAPACITY: u64 = 10_000;

    /// Creates a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a cache holding at most `capacity` pages.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    #[inline]
    pub fn lookup(&self, fingerprint: &PageFingerprint) -> Option<Arc<CachedPage>> {
        self.entries.get(fingerprint.as_bytes())
    }

    #[inline]
    pub fn insert(&self, page: CachedPage) {
        self.entries.insert(page.fingerprint, Arc::new(page));
    }

    #[inline]
    pub fn contains(&self, fingerprint: &PageFingerprint) -> bool {
        self.entries.contains_key(fingerprint.as_bytes())
    }

    /// Number of cached pages (approximate until pending tasks run).
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Runs pending eviction/bookkeeping so `len` is exact.
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl Default for MemoryOcrCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryOcrCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryOcrCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl OcrCacheStore for MemoryOcrCache {
    async fn get(&self, fingerprint: &PageFingerprint) -> CacheResult<Option<CachedPage>> {
        Ok(self.lookup(fingerprint).map(|p| (*p).clone()))
    }

    async fn put(&self, page: &CachedPage) -> CacheResult<()> {
        self.insert(page.clone());
        Ok(())
    }
}
