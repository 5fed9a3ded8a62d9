//! Tiered OCR cache: memory in front of disk.

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::disk::DiskOcrCache;
use super::error::CacheResult;
use super::memory::MemoryOcrCache;
use super::types::{CacheTier, CachedPage};
use super::OcrCacheStore;
use crate::hashing::PageFingerprint;

/// Memory tier backed by the durable disk tier. Disk hits are promoted into memory.
#[derive(Debug, Clone)]
pub struct TieredOcrCache {
    memory: MemoryOcrCache,
    disk: DiskOcrCache,
}

impl TieredOcrCache {
    pub fn new(memory: MemoryOcrCache, disk: DiskOcrCache) -> Self {
        Self { memory, disk }
    }

    pub fn memory(&self) -> &MemoryOcrCache {
        &self.memory
    }

    pub fn disk(&self) -> &DiskOcrCache {
        &self.disk
    }

    /// Looks up `fingerprint` and reports which tier answered.
    #[instrument(skip(self, fingerprint), fields(fingerprint = %fingerprint))]
    pub async fn lookup(
        &self,
        fingerprint: &PageFingerprint,
    ) -> CacheResult<Option<(CacheTier, CachedPage)>> {
        if let Some(page) = self.memory.lookup(fingerprint) {
            debug!(tier = %CacheTier::Memory, "OCR cache hit");
            return Ok(Some((CacheTier::Memory, (*page).clone())));
        }

        match self.disk.get(fingerprint).await? {
            Some(page) => {
                debug!(tier = %CacheTier::Disk, "OCR cache hit, promoting");
                self.memory.insert(page.clone());
                Ok(Some((CacheTier::Disk, page)))
            }
            None => {
                debug!("OCR cache miss");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl OcrCacheStore for TieredOcrCache {
    async fn get(&self, fingerprint: &PageFingerprint) -> CacheResult<Option<CachedPage>> {
        Ok(self.lookup(fingerprint).await?.map(|(_, page)| page))
    }

    async fn put(&self, page: &CachedPage) -> CacheResult<()> {
        self.memory.insert(page.clone());
        if let Err(e) = self.disk.put(page).await {
            warn!(fingerprint = %page.fingerprint(), error = %e, "Failed to persist OCR cache entry");
            return Err(e);
        }
        Ok(())
    }
}
