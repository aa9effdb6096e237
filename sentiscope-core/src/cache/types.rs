//! Cache statistics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters describing cache behaviour since startup
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheStats {
    /// Lookups answered from a valid entry
    pub hits: u64,

    /// Lookups that found no valid entry
    pub misses: u64,

    /// Number of entries currently stored (expired ones included until evicted)
    pub entries: usize,

    /// Number of entries written
    pub insertions: u64,

    /// Entries evicted because their TTL ran out
    pub evictions_ttl: u64,

    /// Entries removed by explicit invalidation or clear
    pub invalidations: u64,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups answered from the cache, in `[0, 1]`
    pub fn hit_ratio(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hits / {} misses ({:.1}% hit), {} entries, {} expired, {} invalidated",
            self.hits,
            self.misses,
            self.hit_ratio() * 100.0,
            self.entries,
            self.evictions_ttl,
            self.invalidations
        )
    }
}
