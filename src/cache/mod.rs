//! Response cache for API calls.
//!
//! Responses are keyed by a digest of the request parameters with the
//! per-request volatile keys (nonce, signature, timestamp) removed, so two
//! logically identical calls share one entry. Two backends implement
//! [`ResponseCache`]:
//!
//! - [`MemoryCache`]: in-process map
//! - [`FileCache`]: one file per entry under a directory
//!
//! Entries older than the configured expiry are treated as absent and
//! evicted lazily, on lookup.

mod file;
mod memory;

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use serde_json::Value;
use sha1::{Digest, Sha1};

use crate::{Params, OAUTH_NONCE_KEY, OAUTH_SIGNATURE_KEY, OAUTH_TIMESTAMP_KEY};

pub use file::FileCache;
pub use memory::MemoryCache;

/// Default lifetime of a cache entry, in seconds.
pub const DEFAULT_EXPIRE_SECS: u64 = 600;

/// Keys that differ on every request and never take part in the cache key.
const VOLATILE_KEYS: [&str; 3] = [OAUTH_NONCE_KEY, OAUTH_SIGNATURE_KEY, OAUTH_TIMESTAMP_KEY];

/// Digest identifying a logical request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key from a request's full parameter set.
    pub fn from_params(params: &Params) -> Self {
        let normalized = params
            .iter()
            .filter(|(k, _)| !VOLATILE_KEYS.contains(&k.as_str()))
            .collect::<Vec<_>>();
        // Params is sorted, so equal sets serialize identically
        let serialized = serde_urlencoded::to_string(&normalized).unwrap_or_default();
        CacheKey(hex::encode(Sha1::digest(serialized.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Storage for decoded API responses.
pub trait ResponseCache: Send {
    /// Look up a response. Expired entries are removed and reported as absent.
    fn get(&mut self, key: &CacheKey, now: SystemTime) -> Option<Value>;

    /// Store a response, replacing any previous entry for the key.
    fn put(&mut self, key: &CacheKey, response: &Value, now: SystemTime);

    /// Remove every entry.
    fn clear(&mut self);
}

/// Which backend to use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    Memory,
    File { dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    pub kind: CacheKind,
    /// Entry lifetime in seconds.
    #[serde(default = "default_expire")]
    pub expire: u64,
}

fn default_expire() -> u64 {
    DEFAULT_EXPIRE_SECS
}

impl CacheConfig {
    pub fn memory() -> Self {
        CacheConfig {
            kind: CacheKind::Memory,
            expire: DEFAULT_EXPIRE_SECS,
        }
    }

    pub fn file<P: Into<PathBuf>>(dir: P) -> Self {
        CacheConfig {
            kind: CacheKind::File { dir: dir.into() },
            expire: DEFAULT_EXPIRE_SECS,
        }
    }

    pub fn expire(self, secs: u64) -> Self {
        CacheConfig {
            expire: secs,
            ..self
        }
    }

    /// Instantiate the configured backend.
    pub fn build(&self) -> Box<dyn ResponseCache> {
        let expire = Duration::from_secs(self.expire);
        match &self.kind {
            CacheKind::Memory => Box::new(MemoryCache::new(expire)),
            CacheKind::File { dir } => Box::new(FileCache::new(dir.clone(), expire)),
        }
    }
}

/// `stored_at + expire < now`. An entry exactly `expire` old is still fresh.
fn is_expired(stored_at: SystemTime, now: SystemTime, expire: Duration) -> bool {
    now.duration_since(stored_at)
        .map(|age| age > expire)
        .unwrap_or(false)
}
