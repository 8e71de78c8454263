//! Decision Cache Module
//!
//! Caches enable decisions per `(flag key, environment)` and drops every
//! environment's decision for a key when that flag is mutated.

use std::collections::HashMap;

use crate::cache::{CacheCounters, CacheStats};

// == Decision Cache ==
/// Derived, disposable decisions; the flag store stays the source of truth.
///
/// A single invalidation generation covers the whole cache. A fill that
/// observed an older generation than the current one is discarded, so an
/// evaluation that raced a mutation cannot reinsert a pre-mutation decision.
/// A mutation of one key can therefore void an in-flight fill of another,
/// which costs at most one extra store read.
#[derive(Debug, Default)]
pub struct DecisionCache {
    /// flag key -> environment -> decision
    entries: HashMap<String, HashMap<String, bool>>,
    /// Number of invalidations so far
    generation: u64,
    /// Performance statistics
    counters: CacheCounters,
}

impl DecisionCache {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Looks up a cached decision, recording a hit or miss.
    pub fn get(&self, flag_key: &str, environment: &str) -> Option<bool> {
        let decision = self
            .entries
            .get(flag_key)
            .and_then(|by_env| by_env.get(environment))
            .copied();

        match decision {
            Some(_) => self.counters.record_hit(),
            None => self.counters.record_miss(),
        }
        decision
    }

    // == Generation ==
    /// Current invalidation generation.
    ///
    /// Read this before consulting the store and hand it back to [`put`](Self::put).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // == Put ==
    /// Stores a decision computed while `generation` was current.
    ///
    /// Returns false, storing nothing, if anything was invalidated since.
    pub fn put(
        &mut self,
        flag_key: &str,
        environment: &str,
        decision: bool,
        generation: u64,
    ) -> bool {
        if self.generation != generation {
            self.counters.record_rejected_fill();
            return false;
        }

        self.entries
            .entry(flag_key.to_string())
            .or_default()
            .insert(environment.to_string(), decision);
        true
    }

    // == Invalidate ==
    /// Drops every cached decision for `flag_key` and bumps the generation.
    ///
    /// Returns the number of decisions removed.
    pub fn invalidate(&mut self, flag_key: &str) -> usize {
        self.generation += 1;
        self.counters.record_invalidation();
        self.entries
            .remove(flag_key)
            .map_or(0, |by_env| by_env.len())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }

    // == Length ==
    /// Number of cached decisions across all keys and environments.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_new() {
        let cache = DecisionCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.generation(), 0);
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = DecisionCache::new();

        assert!(cache.put("dark_mode", "production", true, 0));
        assert_eq!(cache.get("dark_mode", "production"), Some(true));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_environments_do_not_leak() {
        let mut cache = DecisionCache::new();

        cache.put("dark_mode", "production", true, 0);
        cache.put("dark_mode", "staging", false, 0);

        assert_eq!(cache.get("dark_mode", "production"), Some(true));
        assert_eq!(cache.get("dark_mode", "staging"), Some(false));
        assert_eq!(cache.get("dark_mode", "development"), None);
    }

    #[test]
    fn test_invalidate_drops_all_environments() {
        let mut cache = DecisionCache::new();

        cache.put("dark_mode", "production", true, 0);
        cache.put("dark_mode", "staging", true, 0);
        cache.put("beta_api", "production", true, 0);

        assert_eq!(cache.invalidate("dark_mode"), 2);
        assert_eq!(cache.get("dark_mode", "production"), None);
        assert_eq!(cache.get("dark_mode", "staging"), None);
        assert_eq!(cache.get("beta_api", "production"), Some(true));
        assert_eq!(cache.generation(), 1);
    }

    #[test]
    fn test_invalidate_unknown_key_keeps_no_state() {
        let mut cache = DecisionCache::new();
        for i in 0..1000 {
            assert_eq!(cache.invalidate(&format!("ghost-{}", i)), 0);
        }
        assert_eq!(cache.generation(), 1000);
        assert!(cache.entries.is_empty());
    }

    #[test]
    fn test_stale_fill_is_rejected() {
        let mut cache = DecisionCache::new();

        // Evaluation reads the generation, then a mutation lands
        let observed = cache.generation();
        cache.invalidate("dark_mode");

        assert!(!cache.put("dark_mode", "production", true, observed));
        assert_eq!(cache.get("dark_mode", "production"), None);
        assert_eq!(cache.stats().rejected_fills, 1);

        let current = cache.generation();
        assert!(cache.put("dark_mode", "production", false, current));
        assert_eq!(cache.get("dark_mode", "production"), Some(false));
    }

    #[test]
    fn test_stats() {
        let mut cache = DecisionCache::new();

        cache.put("dark_mode", "production", true, 0);
        cache.get("dark_mode", "production"); // hit
        cache.get("beta_api", "production"); // miss
        cache.invalidate("beta_api");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.invalidations, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
