//! Fetch-or-compute coordinator
//!
//! [`Orchestrator::get_or_compute`] answers from the cache when it can. On a
//! miss it fetches the resource, classifies a bounded prefix of its text, and
//! caches the result. Concurrent misses for the same key share a single
//! computation through the [`InflightRegistry`]; misses for different keys
//! never wait on each other.

use crate::analysis::{truncate_chars, AnalysisResult};
use crate::cache::{CacheKey, CacheStore};
use crate::collaborators::{Fetcher, InferenceEngine};
use crate::error::{ConfigError, FetchError, OrchestratorError, Result};
use crate::inflight::{InflightRegistry, Role};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on a single fetch; exceeding it counts as a fetch failure
    pub fetch_timeout: Duration,
    /// Characters of fetched text handed to the engine; the rest is dropped
    pub max_input_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            max_input_chars: 512,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.fetch_timeout.is_zero() {
            return Err("fetch_timeout must be greater than 0".into());
        }
        if self.max_input_chars == 0 {
            return Err("max_input_chars must be greater than 0".into());
        }
        Ok(())
    }
}

/// Cache-backed fetch-and-classify pipeline
///
/// Cheap to clone; clones share the cache, collaborators and in-flight
/// registry. Assumes a ready inference engine.
#[derive(Clone)]
pub struct Orchestrator {
    cache: Arc<CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    engine: Arc<dyn InferenceEngine>,
    inflight: Arc<InflightRegistry>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        cache: Arc<CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        engine: Arc<dyn InferenceEngine>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            cache,
            fetcher,
            engine,
            inflight: Arc::new(InflightRegistry::new()),
            config,
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Number of keys currently being computed
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Analyze `identifier`, serving a cached result while it is valid
    pub async fn get_or_compute(&self, identifier: &str) -> Result<AnalysisResult> {
        let key = CacheKey::normalize(identifier);

        if let Some(cached) = self.cache.lookup(&key).await {
            debug!("Serving cached analysis for {}", key);
            return Ok(cached.tagged(true));
        }

        let (computation, role) = self.inflight.join_or_start(&key, |guard| {
            let this = self.clone();
            let task_key = key.clone();
            let identifier = identifier.trim().to_string();
            let failed_identifier = identifier.clone();

            // Runs detached so callers that stop waiting do not cancel it
            let task = tokio::spawn(async move {
                let _guard = guard;
                this.compute(&task_key, &identifier).await
            });

            async move {
                task.await.unwrap_or_else(|e| {
                    Err(OrchestratorError::inference_failed(
                        failed_identifier,
                        format!("computation aborted: {}", e),
                    ))
                })
            }
            .boxed()
        });

        if role == Role::Follower {
            debug!("Awaiting in-flight analysis for {}", key);
        }

        computation.await
    }

    /// Drop the cached result for `identifier`; returns whether one existed
    pub async fn invalidate(&self, identifier: &str) -> bool {
        self.cache.invalidate(&CacheKey::normalize(identifier)).await
    }

    async fn compute(&self, key: &CacheKey, identifier: &str) -> Result<AnalysisResult> {
        // A computation that finished just before this one started has
        // already filled the cache
        if let Some(cached) = self.cache.peek(key).await {
            debug!("Analysis for {} appeared while scheduling", key);
            return Ok(cached.tagged(true));
        }

        info!("Computing analysis for {}", identifier);

        let text = self.fetch(identifier).await?;
        let input = truncate_chars(&text, self.config.max_input_chars).to_string();
        debug!(
            "Fetched {} chars from {}, classifying {}",
            text.chars().count(),
            identifier,
            input.chars().count()
        );

        let result = self.classify(identifier, input).await?;

        if self.cache.config().caching_enabled() {
            self.cache.insert_default(key.clone(), result.clone()).await;
        } else {
            debug!("Caching disabled, not storing {}", key);
        }

        info!(
            "Analysis for {}: {} ({:.3})",
            identifier, result.label, result.score
        );
        Ok(result)
    }

    async fn fetch(&self, identifier: &str) -> Result<String> {
        let timeout = self.config.fetch_timeout;

        let outcome = match tokio::time::timeout(timeout, self.fetcher.fetch(identifier, timeout)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout { timeout }),
        };

        match outcome {
            Ok(text) if text.trim().is_empty() => {
                warn!("No usable text fetched from {}", identifier);
                Err(OrchestratorError::fetch_failed(identifier, FetchError::Empty))
            }
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("Fetch failed for {}: {}", identifier, e);
                Err(OrchestratorError::fetch_failed(identifier, e))
            }
        }
    }

    async fn classify(&self, identifier: &str, input: String) -> Result<AnalysisResult> {
        let engine = Arc::clone(&self.engine);

        let prediction = tokio::task::spawn_blocking(move || engine.classify(&input))
            .await
            .map_err(|e| {
                warn!("Inference task for {} did not complete: {}", identifier, e);
                OrchestratorError::inference_failed(identifier, format!("inference task failed: {}", e))
            })?
            .map_err(|e| {
                warn!("Inference failed for {}: {}", identifier, e);
                OrchestratorError::inference_failed(identifier, e)
            })?;

        AnalysisResult::from_prediction(prediction).map_err(|e| {
            warn!("Inference output rejected for {}: {}", identifier, e);
            OrchestratorError::inference_failed(identifier, e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Label, RawPrediction, Sentiment};
    use crate::cache::CacheConfig;
    use crate::error::InferenceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher {
        text: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _identifier: &str, _timeout: Duration) -> std::result::Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    struct EchoLengthEngine;

    impl InferenceEngine for EchoLengthEngine {
        fn classify(&self, text: &str) -> std::result::Result<RawPrediction, InferenceError> {
            // encodes the input length in the label so truncation is observable
            Ok(RawPrediction::new(format!("len:{}", text.chars().count()), 0.5))
        }
    }

    fn orchestrator(text: &str, config: OrchestratorConfig) -> (Orchestrator, Arc<StaticFetcher>) {
        let fetcher = Arc::new(StaticFetcher {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(CacheStore::new(CacheConfig::default()));
        let orch = Orchestrator::new(cache, fetcher.clone(), Arc::new(EchoLengthEngine), config);
        (orch, fetcher)
    }

    #[test]
    fn test_config_validation() {
        assert!(OrchestratorConfig::default().validate().is_ok());
        assert!(OrchestratorConfig::default()
            .with_max_input_chars(0)
            .validate()
            .is_err());
        assert!(OrchestratorConfig::default()
            .with_fetch_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[tokio::test]
    async fn test_input_is_truncated() {
        let config = OrchestratorConfig::default().with_max_input_chars(10);
        let (orch, _) = orchestrator(&"x".repeat(100), config);

        let result = orch.get_or_compute("https://example.com/a").await.unwrap();
        assert_eq!(result.label, Label::Raw("len:10".to_string()));
    }

    #[tokio::test]
    async fn test_short_input_is_untouched() {
        let (orch, _) = orchestrator("hello", OrchestratorConfig::default());

        let result = orch.get_or_compute("https://example.com/a").await.unwrap();
        assert_eq!(result.label, Label::Raw("len:5".to_string()));
    }

    #[tokio::test]
    async fn test_second_call_is_cached() {
        let (orch, fetcher) = orchestrator("hello", OrchestratorConfig::default());

        let first = orch.get_or_compute("https://example.com/a").await.unwrap();
        let second = orch.get_or_compute("HTTPS://EXAMPLE.COM/a/").await.unwrap();

        assert!(!first.served_from_cache);
        assert!(second.served_from_cache);
        assert_eq!(first.label, second.label);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(orch.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let (orch, fetcher) = orchestrator("hello", OrchestratorConfig::default());

        orch.get_or_compute("https://example.com/a").await.unwrap();
        assert!(orch.invalidate("https://example.com/a").await);
        assert!(!orch.invalidate("https://example.com/a").await);

        let again = orch.get_or_compute("https://example.com/a").await.unwrap();
        assert!(!again.served_from_cache);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_canonical_label_mapping() {
        struct Positive;
        impl InferenceEngine for Positive {
            fn classify(&self, _text: &str) -> std::result::Result<RawPrediction, InferenceError> {
                Ok(RawPrediction::new("LABEL_2", 0.93))
            }
        }

        let fetcher = Arc::new(StaticFetcher {
            text: "great".to_string(),
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(CacheStore::new(CacheConfig::default()));
        let orch = Orchestrator::new(cache, fetcher, Arc::new(Positive), OrchestratorConfig::default());

        let result = orch.get_or_compute("https://example.com/a").await.unwrap();
        assert_eq!(result.label, Label::Canonical(Sentiment::Positive));
        assert_eq!(result.score, 0.93);
    }
}
