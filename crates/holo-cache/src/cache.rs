//! Bounded, content-addressed store of parsed chunk fragments.

use std::collections::{BTreeMap, HashMap};

use holo_diagnostic::Diagnostic;
use holo_syntax::Node;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ChunkHash;

/// Default number of fragments kept.
pub const DEFAULT_CAPACITY: usize = 500;

/// Cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of resident entries.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// The parse of one chunk: its AST and every diagnostic it produced.
/// Locations are relative to the chunk's own text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub ast: Node,
    pub diagnostics: Vec<Diagnostic>,
}

/// A resident cache entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub chunk_id: String,
    pub hash: ChunkHash,
    pub fragment: Fragment,
    /// Logical clock tick of the last access
    pub last_used: u64,
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatistics {
    /// Lookups that returned a fragment.
    pub hits: u64,
    /// Lookups for an absent id or a different hash.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
    pub current_size: usize,
    pub max_size: usize,
}

impl CacheStatistics {
    /// Fraction of lookups that hit, 0.0 when there were none.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache from chunk id to the fragment parsed from a specific content
/// hash.
///
/// Recency is a logical clock, so two accesses never share a timestamp and
/// eviction order is deterministic. The cache has no internal locking;
/// share it between threads behind a `Mutex`.
#[derive(Debug)]
pub struct ParseCache {
    entries: HashMap<String, CacheEntry>,
    /// last_used tick → chunk id, oldest first
    recency: BTreeMap<u64, String>,
    clock: u64,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A cache holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            clock: 0,
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_capacity(config.capacity)
    }

    /// The fragment cached for `chunk_id`, if it was parsed from content
    /// with this `hash`. A hit refreshes the entry's recency.
    pub fn get(&mut self, chunk_id: &str, hash: &ChunkHash) -> Option<&Fragment> {
        self.clock += 1;
        match self.entries.get_mut(chunk_id) {
            Some(entry) if entry.hash == *hash => {
                self.recency.remove(&entry.last_used);
                entry.last_used = self.clock;
                self.recency.insert(self.clock, chunk_id.to_string());
                self.hits += 1;
                Some(&entry.fragment)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store `fragment` for `chunk_id`, replacing any previous entry. Evicts
    /// the least recently used entry when a new id would exceed capacity.
    pub fn set(&mut self, chunk_id: impl Into<String>, hash: ChunkHash, fragment: Fragment) {
        let chunk_id = chunk_id.into();
        self.clock += 1;

        if let Some(old) = self.entries.remove(&chunk_id) {
            self.recency.remove(&old.last_used);
        } else if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        self.recency.insert(self.clock, chunk_id.clone());
        self.entries.insert(
            chunk_id.clone(),
            CacheEntry {
                chunk_id,
                hash,
                fragment,
                last_used: self.clock,
            },
        );
    }

    fn evict_oldest(&mut self) {
        if let Some((_, chunk_id)) = self.recency.pop_first() {
            self.entries.remove(&chunk_id);
            self.evictions += 1;
            debug!(chunk = %chunk_id, "evicted cache entry");
        }
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.entries.contains_key(chunk_id)
    }

    /// Look at an entry without touching its recency or the statistics.
    pub fn peek(&self, chunk_id: &str) -> Option<&CacheEntry> {
        self.entries.get(chunk_id)
    }

    pub fn remove(&mut self, chunk_id: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(chunk_id)?;
        self.recency.remove(&entry.last_used);
        Some(entry)
    }

    /// Resident chunk ids, least recently used first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.recency.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn stats(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            current_size: self.entries.len(),
            max_size: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holo_common::Location;

    fn fragment(name: &str) -> Fragment {
        let mut ast = Node::element("orb", Location::default());
        ast.name = Some(name.to_string());
        Fragment {
            ast,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_get_requires_matching_hash() {
        let mut cache = ParseCache::new();
        let hash = ChunkHash::of_str("orb a {}");
        cache.set("orb:a", hash, fragment("a"));

        assert_eq!(cache.get("orb:a", &hash), Some(&fragment("a")));
        assert!(cache.get("orb:a", &ChunkHash::of_str("orb a { }")).is_none());
        assert!(cache.get("orb:b", &hash).is_none());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 2));
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = ParseCache::with_capacity(2);
        let hash = |s: &str| ChunkHash::of_str(s);
        cache.set("a", hash("a"), fragment("a"));
        cache.set("b", hash("b"), fragment("b"));

        // Touch "a" so "b" becomes the oldest
        assert!(cache.get("a", &hash("a")).is_some());
        cache.set("c", hash("c"), fragment("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_replacing_an_id_does_not_evict() {
        let mut cache = ParseCache::with_capacity(2);
        cache.set("a", ChunkHash::of_str("1"), fragment("a"));
        cache.set("b", ChunkHash::of_str("2"), fragment("b"));
        cache.set("a", ChunkHash::of_str("3"), fragment("a2"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.peek("a").map(|e| e.hash), Some(ChunkHash::of_str("3")));
    }

    #[test]
    fn test_clear_and_remove() {
        let mut cache = ParseCache::with_capacity(4);
        cache.set("a", ChunkHash::of_str("a"), fragment("a"));
        cache.set("b", ChunkHash::of_str("b"), fragment("b"));
        assert!(cache.remove("a").is_some());
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["b"]);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStatistics {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStatistics::default().hit_rate(), 0.0);
    }
}
