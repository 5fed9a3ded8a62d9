//! Durable OCR cache tier (simple file-per-entry layout).
//!
//! Entries live at `<root>/<first two hex chars>/<fingerprint hex>.rkyv`. Writes go to a
//! uniquely named temp file in the shard directory and are renamed into place, so
//! concurrent writers of the same fingerprint never leave a torn entry.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use tempfile::NamedTempFile;

use super::error::{CacheError, CacheResult};
use super::types::CachedPage;
use super::OcrCacheStore;
use crate::hashing::{FINGERPRINT_HEX_LEN, PageFingerprint};

const RKYV_EXTENSION: &str = "rkyv";

#[derive(Debug, Clone)]
/// Stores and retrieves [`CachedPage`] records on disk.
pub struct DiskOcrCache {
    root: PathBuf,
}

impl DiskOcrCache {
    /// Creates a cache rooted at `root`. Nothing is created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensures the root directory exists.
    pub fn ensure_root(&self) -> CacheResult<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|_| CacheError::StorageUnavailable {
                path: self.root.clone(),
            })?;
        }
        Ok(())
    }

    fn shard_path(&self, hex: &str) -> PathBuf {
        self.root.join(&hex[..2])
    }

    fn entry_path(&self, fingerprint: &PageFingerprint) -> PathBuf {
        let hex = fingerprint.to_hex();
        self.shard_path(&hex)
            .join(format!("{}.{}", hex, RKYV_EXTENSION))
    }

    /// Writes `page` under its fingerprint, replacing any existing entry.
    pub fn store(&self, page: &CachedPage) -> CacheResult<PathBuf> {
        self.ensure_root()?;

        let fingerprint = page.fingerprint();
        let final_path = self.entry_path(&fingerprint);
        let shard = self.shard_path(&fingerprint.to_hex());
        fs::create_dir_all(&shard)?;

        let bytes = rkyv::to_bytes::<RkyvError>(page)
            .map_err(|e| CacheError::Serialization(format!("{:?}", e)))?;

        let mut temp = NamedTempFile::new_in(&shard)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&final_path).map_err(|e| CacheError::Io(e.error))?;

        Ok(final_path)
    }

    /// Loads the entry for `fingerprint`, or `None` if absent.
    pub fn load(&self, fingerprint: &PageFingerprint) -> CacheResult<Option<CachedPage>> {
        let path = self.entry_path(fingerprint);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(&bytes);

        let page = rkyv::from_bytes::<CachedPage, RkyvError>(&aligned)
            .map_err(|e| CacheError::Serialization(format!("{:?}", e)))?;

        if page.fingerprint != *fingerprint.as_bytes() {
            return Err(CacheError::Serialization(format!(
                "entry {} holds a different fingerprint",
                path.display()
            )));
        }

        Ok(Some(page))
    }

    /// Returns `true` if an entry exists for `fingerprint`.
    pub fn exists(&self, fingerprint: &PageFingerprint) -> bool {
        self.entry_path(fingerprint).exists()
    }

    /// Deletes the entry for `fingerprint`. Returns `false` if it was absent.
    pub fn remove(&self, fingerprint: &PageFingerprint) -> CacheResult<bool> {
        match fs::remove_file(self.entry_path(fingerprint)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists fingerprints of all stored entries. Stray files are ignored.
    pub fn list_entries(&self) -> CacheResult<Vec<PageFingerprint>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for shard in fs::read_dir(&self.root)? {
            let shard = shard?.path();
            if !shard.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&shard)? {
                let path = entry?.path();
                if let Some(ext) = path.extension()
                    && ext == RKYV_EXTENSION
                    && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                    && stem.len() == FINGERPRINT_HEX_LEN
                    && let Some(fingerprint) = PageFingerprint::from_hex(stem)
                {
                    entries.push(fingerprint);
                }
            }
        }

        Ok(entries)
    }
}

#[async_trait]
impl OcrCacheStore for DiskOcrCache {
    async fn get(&self, fingerprint: &PageFingerprint) -> CacheResult<Option<CachedPage>> {
        let this = self.clone();
        let fingerprint = *fingerprint;
        tokio::task::spawn_blocking(move || this.load(&fingerprint))
            .await
            .map_err(|e| CacheError::Task(e.to_string()))?
    }

    async fn put(&self, page: &CachedPage) -> CacheResult<()> {
        let this = self.clone();
        let page = page.clone();
        tokio::task::spawn_blocking(move || this.store(&page).map(|_| ()))
            .await
            .map_err(|e| CacheError::Task(e.to_string()))?
    }
}
