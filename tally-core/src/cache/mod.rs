//! On-disk memoization of run results
//!
//! A result is stored as one JSON file per (namespace, key) pair, where the
//! namespace names the computation and the key is its serialized arguments.
//! Entries never expire; delete the files (or call [`ResultCache::clear`]) to
//! invalidate them.
//!
//! File names carry the SHA-256 of the namespace and canonical key, so they
//! stay the same across builds. The full key is also stored in the file and
//! compared on read.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Persisted cache entry
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<V> {
    namespace: String,
    key: serde_json::Value,
    created_ms: u64,
    value: V,
}

/// Directory-backed result cache
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Return the cached value for `key`, or compute, persist and return it.
    ///
    /// Errors from `compute` are returned as-is and nothing is stored.
    pub fn get_or_compute<K, V, F>(&self, namespace: &str, key: &K, compute: F) -> Result<V>
    where
        K: Serialize,
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.get(namespace, key)? {
            info!(namespace, dir = %self.dir.display(), "Cache hit");
            return Ok(value);
        }

        debug!(namespace, "Cache miss, computing");
        let value = compute()?;
        self.put(namespace, key, &value)?;
        Ok(value)
    }

    /// Look up a stored value.
    ///
    /// Unreadable entries and entries stored under a different key are misses.
    pub fn get<K, V>(&self, namespace: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize,
        V: DeserializeOwned,
    {
        let key = serde_json::to_value(key).context("Failed to serialize cache key")?;
        let path = self.entry_path(namespace, &key)?;

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read cache entry {:?}", path))
            }
        };

        let entry: CacheEntry<serde_json::Value> = match serde_json::from_str(&text) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt cache entry");
                return Ok(None);
            }
        };

        if entry.namespace != namespace || entry.key != key {
            debug!(path = %path.display(), "Cache entry belongs to a different key");
            return Ok(None);
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring cache entry with stale layout");
                Ok(None)
            }
        }
    }

    /// Store a value, replacing any previous entry for the key.
    pub fn put<K, V>(&self, namespace: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize,
        V: Serialize,
    {
        let key = serde_json::to_value(key).context("Failed to serialize cache key")?;
        let path = self.entry_path(namespace, &key)?;

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create cache directory {:?}", self.dir))?;

        let created_ms = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0))
            .as_millis() as u64;

        let entry = CacheEntry {
            namespace: namespace.to_string(),
            key,
            created_ms,
            value,
        };
        let json = serde_json::to_string(&entry).context("Failed to serialize cache entry")?;

        // Write then rename so readers never see a half-written entry
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write cache entry {:?}", tmp))?;
        fs::rename(&tmp, &path).with_context(|| format!("Failed to move cache entry to {:?}", path))?;

        debug!(path = %path.display(), "Stored cache entry");
        Ok(())
    }

    /// Delete every entry. Returns the number of files removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e).with_context(|| format!("Failed to list {:?}", self.dir)),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
                removed += 1;
            }
        }

        info!(removed, dir = %self.dir.display(), "Cleared result cache");
        Ok(removed)
    }

    fn entry_path(&self, namespace: &str, key: &serde_json::Value) -> Result<PathBuf> {
        let canonical = serde_json::to_string(key).context("Failed to serialize cache key")?;
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update([0u8]);
        hasher.update(canonical.as_bytes());
        let digest = hex::encode(hasher.finalize());

        let stem: String = namespace
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();

        Ok(self.dir.join(format!("{}-{}.json", stem, digest)))
    }
}
