//! Group-by resolution over semantic graphs.
//!
//! Turns a built semantic graph into the set of dunder names a metric (or a
//! set of metrics) can legally be grouped by, each with a recipe describing
//! how to compute it from the metric's source rows. Results are memoized in
//! a bounded LRU cache keyed by source nodes and element filter.

pub mod cache;
pub mod resolver;
pub mod trie;

// Re-export commonly used types
pub use cache::{CacheStats, ResolutionCache, ResolutionCacheKey, DEFAULT_CACHE_CAPACITY};
pub use resolver::{
    CompleteGroupByResolver, CompleteResolution, GroupByItemResolver, GroupByMetricResolver,
    ResolveError, SimpleAttributeResolver, TrieResolutionResult,
};
pub use trie::{
    DunderName, DunderNameDescriptor, DunderNameTrie, GroupByElementType, ResolvedGroupByItem,
};
