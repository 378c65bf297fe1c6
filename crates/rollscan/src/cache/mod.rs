//! Content-addressed result cache.
//!
//! OCR is by far the most expensive stage of the pipeline, so finished result
//! sets are cached on disk keyed by what actually determines them: the
//! document bytes and the search parameters. Two byte-identical files under
//! different names share one entry; renaming or touching a file never
//! invalidates it.
//!
//! The cache is strictly best-effort. Every failure on the read path
//! (missing entry, expired entry, version mismatch, corrupt JSON) is treated
//! as a miss, deleting the offending entry where one exists; failures on the
//! write path are logged and dropped. Nothing in here may fail the pipeline.
//!
//! Concurrent workers each hold their own `ResultCache` handle. No locking is
//! needed: keys are content-derived, so two workers racing on the same key
//! write equivalent data and the overwrite is idempotent.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, RollscanError};
use crate::types::SearchResult;

/// Bumped whenever the persisted entry layout changes; mismatched entries are
/// deleted on read.
const CACHE_VERSION: &str = "1.0";

/// Default entry time-to-live.
pub const DEFAULT_TTL_DAYS: u64 = 30;

const SECONDS_PER_DAY: u64 = 24 * 3600;

/// Persisted cache entry, one JSON file per key.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    version: String,
    timestamp: DateTime<Utc>,
    source_path: String,
    source_name: String,
    threshold: u32,
    target_count: usize,
    results: Vec<SearchResult>,
}

/// Summary returned by [`ResultCache::stats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsReport {
    pub entry_count: usize,
    pub total_size_bytes: u64,
    pub location: PathBuf,
    pub ttl_days: u64,
}

/// File-backed cache of search results.
pub struct ResultCache {
    cache_dir: PathBuf,
    ttl: Duration,
    ttl_days: u64,
}

impl ResultCache {
    /// Open (and create if needed) a cache directory.
    ///
    /// Defaults to `~/.rollscan-cache` when no directory is given.
    pub fn new(cache_dir: Option<PathBuf>, ttl_days: u64) -> Result<Self> {
        let cache_dir = match cache_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rollscan-cache"),
        };

        fs::create_dir_all(&cache_dir)
            .map_err(|e| RollscanError::cache(format!("failed to create cache directory: {}", e)))?;

        tracing::debug!(dir = %cache_dir.display(), "cache directory ready");

        Ok(Self {
            cache_dir,
            ttl: Duration::from_secs(ttl_days * SECONDS_PER_DAY),
            ttl_days,
        })
    }

    /// Cache key: SHA-256 of the document bytes, a 16-hex-digit prefix of the
    /// SHA-256 of the sorted newline-joined target set, and the threshold.
    ///
    /// A pure function of content and parameters: path and name-list order
    /// never influence it.
    fn cache_key(&self, doc_path: &Path, target_names: &[String], threshold: u32) -> Result<String> {
        let mut hasher = Sha256::new();
        let mut file = fs::File::open(doc_path)?;
        std::io::copy(&mut file, &mut hasher)?;
        let doc_hash = hex::encode(hasher.finalize());

        let mut sorted: Vec<&str> = target_names.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let names_hash = hex::encode(Sha256::digest(sorted.join("\n").as_bytes()));

        Ok(format!("{}_{}_{}", doc_hash, &names_hash[..16], threshold))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Look up cached results. Any failure is a miss; stale, mismatched, or
    /// unreadable entries are deleted as a side effect.
    pub fn get(
        &self,
        doc_path: &Path,
        target_names: &[String],
        threshold: u32,
    ) -> Option<Vec<SearchResult>> {
        let key = match self.cache_key(doc_path, target_names, threshold) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(doc = %doc_path.display(), error = %e, "cache key computation failed");
                return None;
            }
        };
        let entry_path = self.entry_path(&key);

        if !entry_path.exists() {
            tracing::debug!(doc = %doc_path.display(), "cache miss");
            return None;
        }

        if self.entry_expired(&entry_path) {
            tracing::info!(doc = %doc_path.display(), "cache entry expired, removing");
            self.remove_entry(&entry_path);
            return None;
        }

        let entry: CacheEntry = match fs::read(&entry_path)
            .map_err(RollscanError::from)
            .and_then(|bytes| serde_json::from_slice(&bytes).map_err(RollscanError::from))
        {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(doc = %doc_path.display(), error = %e, "corrupt cache entry, removing");
                self.remove_entry(&entry_path);
                return None;
            }
        };

        if entry.version != CACHE_VERSION {
            tracing::info!(
                doc = %doc_path.display(),
                found = %entry.version,
                expected = CACHE_VERSION,
                "cache version mismatch, removing"
            );
            self.remove_entry(&entry_path);
            return None;
        }

        tracing::info!(
            doc = %doc_path.display(),
            results = entry.results.len(),
            "cache hit"
        );
        Some(entry.results)
    }

    /// Store results unconditionally (overwrite semantics). Write failures
    /// are logged, never raised: caching must not fail the pipeline.
    pub fn set(
        &self,
        doc_path: &Path,
        target_names: &[String],
        threshold: u32,
        results: &[SearchResult],
    ) {
        let key = match self.cache_key(doc_path, target_names, threshold) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(doc = %doc_path.display(), error = %e, "cache key computation failed");
                return;
            }
        };

        let entry = CacheEntry {
            version: CACHE_VERSION.to_string(),
            timestamp: Utc::now(),
            source_path: doc_path.display().to_string(),
            source_name: doc_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            threshold,
            target_count: target_names.len(),
            results: results.to_vec(),
        };

        let write_result = serde_json::to_vec_pretty(&entry)
            .map_err(RollscanError::from)
            .and_then(|bytes| fs::write(self.entry_path(&key), bytes).map_err(RollscanError::from));

        match write_result {
            Ok(()) => {
                tracing::info!(doc = %doc_path.display(), results = results.len(), "cached results");
            }
            Err(e) => {
                tracing::error!(doc = %doc_path.display(), error = %e, "cache write failed");
            }
        }
    }

    /// Delete all entries. Returns the number removed.
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        for path in self.entry_files() {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "failed to remove entry"),
            }
        }
        tracing::info!(removed, "cleared cache");
        removed
    }

    /// Delete only entries older than the TTL. Returns the number removed.
    pub fn clear_expired(&self) -> usize {
        let mut removed = 0;
        for path in self.entry_files() {
            if self.entry_expired(&path) {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::debug!(path = %path.display(), error = %e, "failed to remove entry");
                    }
                }
            }
        }
        tracing::info!(removed, "removed expired cache entries");
        removed
    }

    pub fn stats(&self) -> CacheStatsReport {
        let files = self.entry_files();
        let total_size_bytes = files
            .iter()
            .filter_map(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();

        CacheStatsReport {
            entry_count: files.len(),
            total_size_bytes,
            location: self.cache_dir.clone(),
            ttl_days: self.ttl_days,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_files(&self) -> Vec<PathBuf> {
        let read_dir = match fs::read_dir(&self.cache_dir) {
            Ok(rd) => rd,
            Err(e) => {
                tracing::debug!(error = %e, "failed to read cache directory");
                return Vec::new();
            }
        };

        read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect()
    }

    fn entry_expired(&self, entry_path: &Path) -> bool {
        let Ok(metadata) = fs::metadata(entry_path) else {
            return false;
        };
        let Ok(modified) = metadata.modified() else {
            return false;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age > self.ttl,
            Err(_) => false,
        }
    }

    fn remove_entry(&self, entry_path: &Path) {
        if let Err(e) = fs::remove_file(entry_path) {
            tracing::debug!(path = %entry_path.display(), error = %e, "failed to remove cache entry");
        }
    }
}
