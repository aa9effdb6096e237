//! Cache entry with an absolute expiry deadline

use crate::analysis::AnalysisResult;
use crate::cache::key::CacheKey;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// A stored analysis result and the instant after which it is stale
///
/// Expiry is measured on the monotonic clock so wall-clock adjustments never
/// resurrect or prematurely kill an entry. Entries are replaced, never mutated
/// in place, apart from access bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,

    /// Canonical value, always stored with `served_from_cache = false`
    pub value: AnalysisResult,

    pub metadata: CacheMetadata,
}

/// Bookkeeping attached to an entry
#[derive(Debug, Clone)]
pub struct CacheMetadata {
    /// Wall-clock creation time, for reporting only
    pub created_at: DateTime<Utc>,

    /// Monotonic instant at which the entry stops being visible
    pub expires_at: Instant,

    /// Number of lookups this entry has answered
    pub access_count: u64,
}

impl CacheEntry {
    /// Create an entry that expires `ttl` after `now`
    pub fn new(key: CacheKey, value: AnalysisResult, ttl: Duration, now: Instant) -> Self {
        // An unrepresentable deadline is as good as "never" for a process cache
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(30 * 365 * 24 * 3600));

        Self {
            key,
            value: value.tagged(false),
            metadata: CacheMetadata {
                created_at: Utc::now(),
                expires_at,
                access_count: 0,
            },
        }
    }

    /// Visible iff `now < expires_at`
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.metadata.expires_at
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        !self.is_valid_at(now)
    }

    /// Remaining lifetime, `None` once expired
    pub fn time_to_live(&self, now: Instant) -> Option<Duration> {
        if self.is_valid_at(now) {
            Some(self.metadata.expires_at - now)
        } else {
            None
        }
    }

    pub fn mark_accessed(&mut self) {
        self.metadata.access_count += 1;
    }
}
