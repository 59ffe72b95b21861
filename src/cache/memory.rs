use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use serde_json::Value;

use super::{is_expired, CacheKey, ResponseCache};

/// In-process [`ResponseCache`].
#[derive(Debug)]
pub struct MemoryCache {
    expire: Duration,
    entries: HashMap<CacheKey, (Value, SystemTime)>,
}

impl MemoryCache {
    pub fn new(expire: Duration) -> Self {
        MemoryCache {
            expire,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResponseCache for MemoryCache {
    fn get(&mut self, key: &CacheKey, now: SystemTime) -> Option<Value> {
        let expire = self.expire;
        self.entries
            .retain(|_, (_, stored_at)| !is_expired(*stored_at, now, expire));
        self.entries.get(key).map(|(value, _)| value.clone())
    }

    fn put(&mut self, key: &CacheKey, response: &Value, now: SystemTime) {
        self.entries.insert(key.clone(), (response.clone(), now));
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
