//! Filesystem-backed cache.
//!
//! Layout: one `{key}.cache` file per entry directly under the cache
//! directory, holding the response as JSON. The file's modification time
//! is the entry's creation time.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::Value;

use super::{is_expired, CacheKey, ResponseCache};

const CACHE_EXTENSION: &str = "cache";

/// [`ResponseCache`] storing each entry as a file under `dir`.
///
/// I/O errors are logged and treated as misses; the cache is never fatal.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    expire: Duration,
}

impl FileCache {
    pub fn new(dir: PathBuf, expire: Duration) -> Self {
        FileCache { dir, expire }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir
            .join(format!("{}.{}", key.as_str(), CACHE_EXTENSION))
    }
}

impl ResponseCache for FileCache {
    fn get(&mut self, key: &CacheKey, now: SystemTime) -> Option<Value> {
        let path = self.entry_path(key);

        // Drop the entry first if it is stale
        if let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) {
            if is_expired(modified, now, self.expire) {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!("failed to remove stale cache entry {}: {e}", path.display());
                }
            }
        }
        if !path.exists() {
            return None;
        }

        let file = File::open(&path).ok()?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("unreadable cache entry {}: {e}", path.display());
                None
            }
        }
    }

    fn put(&mut self, key: &CacheKey, response: &Value, now: SystemTime) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!("failed to create cache directory: {e}");
            return;
        }
        let path = self.entry_path(key);
        let written = File::create(&path).and_then(|file| {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, response)?;
            writer.flush()?;
            writer.get_ref().set_modified(now)
        });
        if let Err(e) = written {
            tracing::warn!("failed to write cache entry {}: {e}", path.display());
        }
    }

    fn clear(&mut self) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == CACHE_EXTENSION) {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!("failed to remove cache entry {}: {e}", path.display());
                }
            }
        }
    }
}
