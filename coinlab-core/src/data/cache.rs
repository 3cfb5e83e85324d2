//! Key/value cache for fetched bar series.
//!
//! Layout (`FileCache`): `{cache_dir}/{namespace}_{key}.json`, one file per
//! request. Entry age is taken from the file's mtime; an entry older than the
//! caller's `max_age` reads as a miss. Writes are atomic (write `.tmp`, rename).

use super::DataError;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Summary of cache contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheInfo {
    pub entries: usize,
    pub total_bytes: u64,
    pub location: String,
}

impl CacheInfo {
    pub fn total_size_mb(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Cache store injected into data providers.
pub trait CacheStore: Send + Sync {
    /// Fetch an entry. `max_age: None` never expires.
    fn get(&self, key: &str, max_age: Option<Duration>) -> Result<Option<Vec<u8>>, DataError>;

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DataError>;

    /// Remove entries, or only those older than `older_than`. Returns the
    /// number removed.
    fn clear(&self, older_than: Option<Duration>) -> Result<usize, DataError>;

    fn info(&self) -> Result<CacheInfo, DataError>;
}

/// Deterministic cache key for a fetch request.
///
/// Parts are joined with `_` (absent `since`/`limit` are omitted) and hashed
/// with BLAKE3.
pub fn cache_key(
    symbol: &str,
    timeframe: &str,
    since: Option<i64>,
    limit: Option<usize>,
) -> String {
    let mut parts = vec![symbol.to_string(), timeframe.to_string()];
    if let Some(since) = since {
        parts.push(since.to_string());
    }
    if let Some(limit) = limit {
        parts.push(limit.to_string());
    }
    blake3::hash(parts.join("_").as_bytes()).to_hex().to_string()
}

fn is_expired(stored_at: SystemTime, max_age: Option<Duration>) -> bool {
    match max_age {
        // A timestamp in the future counts as fresh.
        Some(max_age) => stored_at.elapsed().unwrap_or_default() > max_age,
        None => false,
    }
}

// ─── File cache ─────────────────────────────────────────────────────

/// JSON files in a directory, namespaced by exchange / source name.
#[derive(Debug, Clone)]
pub struct FileCache {
    cache_dir: PathBuf,
    namespace: String,
}

impl FileCache {
    pub fn new(cache_dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            namespace: namespace.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `{cache_dir}/{namespace}_{key}.json`
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}_{key}.json", self.namespace))
    }

    fn owns(&self, path: &Path) -> bool {
        let prefix = format!("{}_", self.namespace);
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".json"))
    }

    /// Entries in this namespace with their metadata. A missing directory is empty.
    fn entries(&self) -> Result<Vec<(PathBuf, fs::Metadata)>, DataError> {
        let read_dir = match fs::read_dir(&self.cache_dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DataError::io(&self.cache_dir, e)),
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| DataError::io(&self.cache_dir, e))?;
            let path = entry.path();
            if !self.owns(&path) {
                continue;
            }
            let meta = entry.metadata().map_err(|e| DataError::io(&path, e))?;
            if meta.is_file() {
                entries.push((path, meta));
            }
        }
        Ok(entries)
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str, max_age: Option<Duration>) -> Result<Option<Vec<u8>>, DataError> {
        let path = self.entry_path(key);
        let meta = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DataError::io(&path, e)),
        };
        let modified = meta.modified().map_err(|e| DataError::io(&path, e))?;
        if is_expired(modified, max_age) {
            tracing::debug!(path = %path.display(), "cache entry expired");
            return Ok(None);
        }
        fs::read(&path)
            .map(Some)
            .map_err(|e| DataError::io(&path, e))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| DataError::io(&self.cache_dir, e))?;

        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes).map_err(|e| DataError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::io(&path, e)
        })
    }

    fn clear(&self, older_than: Option<Duration>) -> Result<usize, DataError> {
        let mut removed = 0;
        for (path, meta) in self.entries()? {
            if let Some(age) = older_than {
                let modified = meta.modified().map_err(|e| DataError::io(&path, e))?;
                if !is_expired(modified, Some(age)) {
                    continue;
                }
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove cache entry")
                }
            }
        }
        Ok(removed)
    }

    fn info(&self) -> Result<CacheInfo, DataError> {
        let entries = self.entries()?;
        Ok(CacheInfo {
            entries: entries.len(),
            total_bytes: entries.iter().map(|(_, m)| m.len()).sum(),
            location: self.cache_dir.display().to_string(),
        })
    }
}

// ─── Memory cache ───────────────────────────────────────────────────

/// In-process cache, mainly for tests and single-session sweeps.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (SystemTime, Vec<u8>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entry with an explicit write time.
    pub fn put_at(&self, key: &str, bytes: &[u8], stored_at: SystemTime) -> Result<(), DataError> {
        self.lock()?
            .insert(key.to_string(), (stored_at, bytes.to_vec()));
        Ok(())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, (SystemTime, Vec<u8>)>>, DataError> {
        self.entries
            .lock()
            .map_err(|_| DataError::CacheError("memory cache lock poisoned".into()))
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str, max_age: Option<Duration>) -> Result<Option<Vec<u8>>, DataError> {
        Ok(self
            .lock()?
            .get(key)
            .filter(|(stored_at, _)| !is_expired(*stored_at, max_age))
            .map(|(_, bytes)| bytes.clone()))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DataError> {
        self.put_at(key, bytes, SystemTime::now())
    }

    fn clear(&self, older_than: Option<Duration>) -> Result<usize, DataError> {
        let mut entries = self.lock()?;
        let before = entries.len();
        match older_than {
            Some(age) => entries.retain(|_, (stored_at, _)| !is_expired(*stored_at, Some(age))),
            None => entries.clear(),
        }
        Ok(before - entries.len())
    }

    fn info(&self) -> Result<CacheInfo, DataError> {
        let entries = self.lock()?;
        Ok(CacheInfo {
            entries: entries.len(),
            total_bytes: entries.values().map(|(_, b)| b.len() as u64).sum(),
            location: "memory".into(),
        })
    }
}
