//! Short-lived search result cache / 搜索结果缓存
//!
//! Keyed by the full validated request. Expired entries are swept on insert;
//! when still full, the oldest entry is evicted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::search::{Page, ScoredResult, SearchRequest};

struct CacheEntry {
    page: Page<ScoredResult>,
    created: Instant,
}

pub struct SearchCache {
    entries: RwLock<HashMap<SearchRequest, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl SearchCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Cache that never stores anything / 禁用缓存
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero() && self.capacity > 0
    }

    pub fn get(&self, request: &SearchRequest) -> Option<Page<ScoredResult>> {
        if !self.is_enabled() {
            return None;
        }
        let cache = self.entries.read();
        let entry = cache.get(request)?;
        if entry.created.elapsed() < self.ttl {
            tracing::debug!("Search cache hit: {:?}", request.keyword());
            Some(entry.page.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, request: SearchRequest, page: Page<ScoredResult>) {
        if !self.is_enabled() {
            return;
        }
        let mut cache = self.entries.write();
        let ttl = self.ttl;
        cache.retain(|_, entry| entry.created.elapsed() < ttl);

        if cache.len() >= self.capacity && !cache.contains_key(&request) {
            let oldest = cache
                .iter()
                .min_by_key(|(_, entry)| entry.created)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                cache.remove(&key);
            }
        }

        cache.insert(
            request,
            CacheEntry {
                page,
                created: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
