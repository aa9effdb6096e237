//! # Sentiscope Core (sentiscope-core)
//!
//! Cache-backed orchestration in front of an expensive, idempotent
//! "fetch a resource, then classify its text" computation.
//!
//! ## Features
//!
//! - Time-bounded result cache with lazy expiration
//! - At most one in-flight computation per key; concurrent callers share it
//! - No cross-key blocking
//! - Bounded fetch time and bounded inference input
//! - Failures are returned, never cached
//!
//! ## Usage
//!
//! ```no_run
//! use async_trait::async_trait;
//! use sentiscope_core::{
//!     CacheConfig, CacheStore, FetchError, Fetcher, InferenceEngine, InferenceError,
//!     Orchestrator, OrchestratorConfig, RawPrediction,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct Static;
//!
//! #[async_trait]
//! impl Fetcher for Static {
//!     async fn fetch(&self, _id: &str, _timeout: Duration) -> Result<String, FetchError> {
//!         Ok("What a wonderful day".to_string())
//!     }
//! }
//!
//! struct AlwaysPositive;
//!
//! impl InferenceEngine for AlwaysPositive {
//!     fn classify(&self, _text: &str) -> Result<RawPrediction, InferenceError> {
//!         Ok(RawPrediction::new("POSITIVE", 0.98))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(CacheStore::new(CacheConfig::default()));
//!     let orchestrator = Orchestrator::new(
//!         cache,
//!         Arc::new(Static),
//!         Arc::new(AlwaysPositive),
//!         OrchestratorConfig::default(),
//!     );
//!
//!     let first = orchestrator.get_or_compute("https://example.com/news/1").await?;
//!     let second = orchestrator.get_or_compute("https://example.com/news/1").await?;
//!     assert!(!first.served_from_cache);
//!     assert!(second.served_from_cache);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod cache;
pub mod collaborators;
pub mod error;
pub mod inflight;
pub mod orchestrator;

// Re-export main types for convenience
pub use analysis::{AnalysisResult, Label, RawPrediction, Sentiment};
pub use cache::{CacheConfig, CacheConfigBuilder, CacheKey, CacheStats, CacheStore};
pub use collaborators::{EngineState, Fetcher, InferenceEngine};
pub use error::{ConfigError, FetchError, InferenceError, OrchestratorError, Result};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
