//! # Result Cache
//!
//! Time-bounded in-memory storage for analysis results.
//!
//! ## Features
//!
//! - **Lazy Expiration**: entries carry an absolute monotonic deadline and are
//!   evicted by the lookup that finds them stale; no timer is needed
//! - **Replace-on-insert**: at most one entry per key
//! - **Key Normalization**: equivalent spellings of an identifier share an entry
//! - **Optional Sweep**: a background task can purge entries nobody asks for again
//!
//! ## Example
//!
//! ```rust
//! use sentiscope_core::analysis::{AnalysisResult, Sentiment};
//! use sentiscope_core::cache::{CacheConfig, CacheKey, CacheStore};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let cache = CacheStore::new(CacheConfig::default());
//! let key = CacheKey::normalize("https://example.com/article");
//!
//! cache
//!     .insert(key.clone(), AnalysisResult::new(Sentiment::Positive, 0.9), Duration::from_secs(60))
//!     .await;
//!
//! if let Some(value) = cache.lookup(&key).await {
//!     println!("Cache hit: {} ({:.2})", value.label, value.score);
//! }
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod key;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{CacheEntry, CacheMetadata};
pub use key::CacheKey;
pub use store::CacheStore;
pub use types::CacheStats;
