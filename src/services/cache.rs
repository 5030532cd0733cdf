//! Disk-backed named response caches
//!
//! Each cache lives in its own `<name>.json` file under the cache directory
//! so whole caches can be dropped on activation without touching the others.

use crate::services::network::Response;
use crate::types::{BizdashError, CacheWarning, Result};
use directories::BaseDirs;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NamedCache {
    pub name: String,
    pub updated_at: i64,
    pub entries: BTreeMap<String, Response>,
}

pub struct ResponseCacheStore {
    cache_dir: PathBuf,
}

impl ResponseCacheStore {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| BizdashError::Cache("Cannot determine home directory".into()))?;
        let cache_dir = base_dirs.home_dir().join(".bizdash").join("offline");
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    /// Names of every cache present on disk, sorted
    pub fn cache_names(&self) -> Result<Vec<String>> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(&self.cache_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn lookup(&self, name: &str, key: &str) -> Option<Response> {
        let (mut cache, _) = self.load(name);
        cache.entries.remove(key)
    }

    /// Search every cache on disk, in name order
    pub fn lookup_any(&self, key: &str) -> Option<Response> {
        self.cache_names()
            .ok()?
            .iter()
            .find_map(|name| self.lookup(name, key))
    }

    pub fn keys(&self, name: &str) -> Vec<String> {
        self.load(name).0.entries.into_keys().collect()
    }

    pub fn entries(&self, name: &str) -> (BTreeMap<String, Response>, Option<CacheWarning>) {
        let (cache, warning) = self.load(name);
        (cache.entries, warning)
    }

    pub fn put(&self, name: &str, key: &str, response: Response) -> Result<()> {
        let (mut cache, warning) = self.load(name);
        if let Some(w) = warning {
            warn!(cache = name, "rebuilding cache: {}", w);
        }
        cache.entries.insert(key.to_string(), response);
        self.save(name, cache.entries)
    }

    /// Store many entries with a single write
    pub fn put_all(&self, name: &str, responses: Vec<(String, Response)>) -> Result<()> {
        let (mut cache, _) = self.load(name);
        cache.entries.extend(responses);
        self.save(name, cache.entries)
    }

    /// Drop the listed keys, returning how many were present
    pub fn remove(&self, name: &str, keys: &[String]) -> Result<usize> {
        let (mut cache, _) = self.load(name);
        let removed = keys
            .iter()
            .filter(|k| cache.entries.remove(k.as_str()).is_some())
            .count();
        if removed > 0 {
            self.save(name, cache.entries)?;
        }
        Ok(removed)
    }

    pub fn delete_cache(&self, name: &str) -> Result<bool> {
        let path = self.cache_path(name);
        if path.exists() {
            fs::remove_file(&path)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Load a cache, treating a missing, unreadable or corrupt file as empty.
    /// Uses shared file lock for concurrent read safety.
    fn load(&self, name: &str) -> (NamedCache, Option<CacheWarning>) {
        let empty = || NamedCache {
            name: name.to_string(),
            ..NamedCache::default()
        };

        let path = self.cache_path(name);
        if !path.exists() {
            return (empty(), None);
        }

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                return (
                    empty(),
                    Some(CacheWarning::LoadFailed(format!(
                        "Failed to open cache: {}",
                        e
                    ))),
                );
            }
        };

        if let Err(e) = file.lock_shared() {
            return (
                empty(),
                Some(CacheWarning::LoadFailed(format!(
                    "Failed to acquire read lock: {}",
                    e
                ))),
            );
        }

        let mut content = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut content);
        let _ = file.unlock();

        if let Err(e) = read {
            return (
                empty(),
                Some(CacheWarning::LoadFailed(format!(
                    "Failed to read cache: {}",
                    e
                ))),
            );
        }

        match serde_json::from_str::<NamedCache>(&content) {
            Ok(cache) => (cache, None),
            Err(e) => (
                empty(),
                Some(CacheWarning::Corrupted(format!(
                    "Corrupted cache file: {}",
                    e
                ))),
            ),
        }
    }

    /// Save using atomic write (temp file + rename) with exclusive lock.
    fn save(&self, name: &str, entries: BTreeMap<String, Response>) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let cache = NamedCache {
            name: name.to_string(),
            updated_at: chrono::Utc::now().timestamp(),
            entries,
        };

        let content = serde_json::to_string(&cache)
            .map_err(|e| BizdashError::Cache(format!("Serialization failed: {}", e)))?;

        let path = self.cache_path(name);
        let temp_path = path.with_extension("json.tmp");

        {
            let mut file = File::create(&temp_path)
                .map_err(|e| BizdashError::Cache(format!("Failed to create temp file: {}", e)))?;
            file.write_all(content.as_bytes())
                .map_err(|e| BizdashError::Cache(format!("Failed to write temp file: {}", e)))?;
            file.sync_all()
                .map_err(|e| BizdashError::Cache(format!("Failed to sync temp file: {}", e)))?;
        }

        let target = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        target
            .lock_exclusive()
            .map_err(|e| BizdashError::Cache(format!("Failed to acquire write lock: {}", e)))?;

        fs::rename(&temp_path, &path)
            .map_err(|e| BizdashError::Cache(format!("Failed to rename temp file: {}", e)))?;

        let _ = target.unlock();
        Ok(())
    }
}
