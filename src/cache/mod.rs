//! Time-bounded cache of concatenated bundle content
//!
//! Bundle bodies are expensive to produce (one open per member), so under a caching policy
//! the first request drains the concatenated stream once and later requests are served
//! from memory until the entry's TTL runs out.
//!
//! Population is serialized per key with a double-checked lock: concurrent first requests
//! for the same bundle wait for one loader instead of each concatenating the members.

pub mod stats;


use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

pub use stats::CacheStats;

#[derive(Debug, Clone)]
struct CachedContent {
    bytes: Arc<[u8]>,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires: Option<Instant>,
}

impl CachedContent {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires.is_none_or(|expires| now < expires)
    }
}

/// In-memory content cache keyed by bundle id
#[derive(Debug)]
pub struct ContentCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedContent>>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ContentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            locks: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached content for `key`, unless missing or expired
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(Instant::now()))
            .map(|entry| Arc::clone(&entry.bytes))
    }

    /// Cached content for `key`, running `load` to fill the entry when needed
    ///
    /// At most one loader runs per key at a time. A failed load caches nothing.
    pub fn get_or_load<F>(&self, key: &str, load: F) -> io::Result<Arc<[u8]>>
    where
        F: FnOnce() -> io::Result<Vec<u8>>,
    {
        if let Some(bytes) = self.get(key) {
            return Ok(bytes);
        }

        let lock = Arc::clone(self.locks.entry(key.to_string()).or_default().value());
        let result = {
            let _guard = lock.lock();
            match self.get(key) {
                Some(bytes) => Ok(bytes),
                None => self.populate(key, load),
            }
        };
        drop(lock);

        // Only the map still holds it: nobody is loading or waiting on this key
        self.locks
            .remove_if(key, |_, entry| Arc::strong_count(entry) == 1);
        result
    }

    fn populate<F>(&self, key: &str, load: F) -> io::Result<Arc<[u8]>>
    where
        F: FnOnce() -> io::Result<Vec<u8>>,
    {
        let bytes: Arc<[u8]> = load()?.into();
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.retain(|_, entry| entry.is_fresh(now));
        entries.insert(
            key.to_string(),
            CachedContent {
                bytes: Arc::clone(&bytes),
                expires: now.checked_add(self.ttl),
            },
        );
        tracing::debug!(key, bytes = bytes.len(), "cached bundle content");
        Ok(bytes)
    }

    /// Drop the entry for `key`, returning whether there was one
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.locks.clear();
    }

    /// Counts over the entries that have not expired yet
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.read();
        entries
            .values()
            .filter(|entry| entry.is_fresh(now))
            .fold(CacheStats::default(), |mut stats, entry| {
                stats.entries += 1;
                stats.total_size += entry.bytes.len() as u64;
                stats
            })
    }
}
