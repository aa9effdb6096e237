//! Configuration for the result cache

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a [`CacheStore`](super::CacheStore)
///
/// A zero `ttl` turns caching off: nothing is stored and every lookup misses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a freshly computed result stays valid
    pub ttl: Duration,

    /// Fraction of `ttl` by which individual entries may deviate, in `[0, 1]`
    pub ttl_jitter: f64,

    /// Purge expired entries on this period; `None` relies on lazy eviction alone
    pub sweep_interval: Option<Duration>,

    /// Maintain hit/miss/eviction counters
    pub track_stats: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            ttl_jitter: 0.0,
            sweep_interval: None,
            track_stats: true,
        }
    }
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder {
            config: Self::default(),
        }
    }

    /// Cache results for `secs` seconds; zero or negative disables caching
    pub fn with_ttl_secs(secs: i64) -> Self {
        Self {
            ttl: Self::ttl_from_secs(secs),
            ..Self::default()
        }
    }

    /// Five-minute results for fast-moving pages such as live blogs
    pub fn realtime() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            ttl_jitter: 0.1,
            ..Self::default()
        }
    }

    /// Results kept for most of a day, swept hourly
    pub fn daily() -> Self {
        Self {
            ttl: Duration::from_secs(23 * 3600),
            ttl_jitter: 0.1,
            sweep_interval: Some(Duration::from_secs(3600)),
            ..Self::default()
        }
    }

    /// Nothing is ever cached
    pub fn disabled() -> Self {
        Self {
            ttl: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(format!("ttl_jitter must be within [0, 1], got {}", self.ttl_jitter).into());
        }
        if self.sweep_interval.is_some_and(|interval| interval.is_zero()) {
            return Err("sweep_interval must be non-zero".into());
        }
        Ok(())
    }

    pub fn caching_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Clamp a signed second count to a TTL
    pub fn ttl_from_secs(secs: i64) -> Duration {
        Duration::from_secs(secs.max(0).unsigned_abs())
    }

    /// TTL for one new entry, spread by `ttl_jitter`
    pub fn entry_ttl(&self) -> Duration {
        if !self.ttl_jitter.is_finite() || self.ttl_jitter <= 0.0 || !self.caching_enabled() {
            return self.ttl;
        }

        let spread = self.ttl.mul_f64(self.ttl_jitter);
        let offset = spread.mul_f64(rand::random::<f64>() * 2.0);
        // ttl - spread + [0, 2 * spread)
        (self.ttl + offset).saturating_sub(spread)
    }
}

/// Incremental construction of a [`CacheConfig`]
#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Signed seconds; negatives clamp to zero
    pub fn ttl_secs(mut self, secs: i64) -> Self {
        self.config.ttl = CacheConfig::ttl_from_secs(secs);
        self
    }

    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.config.ttl_jitter = jitter;
        self
    }

    pub fn sweep_every(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = Some(interval);
        self
    }

    pub fn track_stats(mut self, enabled: bool) -> Self {
        self.config.track_stats = enabled;
        self
    }

    pub fn build(self) -> CacheConfig {
        self.config
    }
}
