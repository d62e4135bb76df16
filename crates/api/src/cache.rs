//! Short-TTL read cache for the sales listing.
//!
//! Keyed by pagination parameters; every successful mutation calls
//! [`SalesCache::invalidate`], so the worst staleness a reader can see is
//! one TTL window on an untouched dataset.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;

#[derive(Debug)]
pub struct SalesCache {
    ttl: Duration,
    entries: Mutex<HashMap<(u32, u32), (Instant, JsonValue)>>,
}

impl SalesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, page: u32, per_page: u32) -> Option<JsonValue> {
        let entries = self.entries.lock().ok()?;
        let (cached_at, value) = entries.get(&(page, per_page))?;
        if cached_at.elapsed() <= self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn put(&self, page: u32, per_page: u32, value: JsonValue) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert((page, per_page), (Instant::now(), value));
        }
    }

    /// Drop everything; called after every mutating operation.
    pub fn invalidate(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
