//! Parse cache tests.

use holo_cache::{CacheConfig, ChunkHash, DEFAULT_CAPACITY, Fragment, ParseCache};
use holo_parser::parse;

fn fragment_of(source: &str) -> Fragment {
    let result = parse(source);
    Fragment {
        ast: result.ast,
        diagnostics: result.diagnostics,
    }
}

#[test]
fn test_set_then_get_returns_equal_fragment() {
    let mut cache = ParseCache::new();
    let source = "orb \"Ball\" { color: \"red\", size: 2 }";
    let hash = ChunkHash::of_str(source);
    let fragment = fragment_of(source);

    cache.set("orb:Ball", hash, fragment.clone());
    assert_eq!(cache.get("orb:Ball", &hash), Some(&fragment));
    assert!(cache.get("orb:Ball", &ChunkHash::of_str("orb \"Ball\" {}")).is_none());

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_eviction_keeps_exactly_capacity() {
    let capacity = 8;
    let mut cache = ParseCache::with_capacity(capacity);
    let hash = |i: usize| ChunkHash::of_str(&format!("orb \"N{}\" {{}}", i));

    for i in 0..capacity + 5 {
        cache.set(format!("orb:N{}", i), hash(i), fragment_of(&format!("orb \"N{}\" {{}}", i)));
    }

    assert_eq!(cache.len(), capacity);
    for i in 0..5 {
        assert!(cache.get(&format!("orb:N{}", i), &hash(i)).is_none());
    }
    for i in 5..capacity + 5 {
        assert!(cache.get(&format!("orb:N{}", i), &hash(i)).is_some());
    }
    assert_eq!(cache.stats().evictions, 5);
}

#[test]
fn test_default_capacity() {
    assert_eq!(DEFAULT_CAPACITY, 500);
    assert_eq!(ParseCache::new().capacity(), 500);
    assert_eq!(ParseCache::from_config(&CacheConfig::new().capacity(3)).capacity(), 3);
    assert_eq!(ParseCache::with_capacity(0).capacity(), 1);
}

#[test]
fn test_hash_is_content_addressed() {
    let a = ChunkHash::of_str("orb \"A\" {}");
    assert_eq!(a, ChunkHash::of_str("orb \"A\" {}"));
    assert_ne!(a, ChunkHash::of_str("orb \"A\" { }"));
    assert_eq!(a.to_hex().len(), 64);
}
