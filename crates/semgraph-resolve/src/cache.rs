//! LRU cache over whole resolution results.
//!
//! Keyed on the normalized source-node set plus the filter, so the same
//! request pays the traversal once per graph revision. The cache holds
//! `Arc`s; hits share the stored result instead of cloning the trie.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use semgraph_core::filtering::ElementFilter;
use semgraph_core::graph::node::SemanticGraphNode;

use crate::resolver::TrieResolutionResult;

/// Default number of cached resolution results.
pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Identity of one resolution request.
///
/// Sources are sorted and deduplicated on construction, so requests that
/// name the same metrics in a different order share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionCacheKey {
    sources: Vec<SemanticGraphNode>,
    filter: ElementFilter,
}

impl ResolutionCacheKey {
    pub fn new(mut sources: Vec<SemanticGraphNode>, filter: ElementFilter) -> Self {
        sources.sort();
        sources.dedup();
        Self { sources, filter }
    }
}

/// Hit and miss counters since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// A bounded, thread-safe store of resolution results.
pub struct ResolutionCache {
    entries: Mutex<LruCache<ResolutionCacheKey, Arc<TrieResolutionResult>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResolutionCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up a result, promoting it to most recently used on a hit.
    pub fn get(&self, key: &ResolutionCacheKey) -> Option<Arc<TrieResolutionResult>> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(result) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(result))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a result, evicting the least recently used entry when full.
    pub fn put(&self, key: ResolutionCacheKey, result: Arc<TrieResolutionResult>) {
        self.lock().put(key, result);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<ResolutionCacheKey, Arc<TrieResolutionResult>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
