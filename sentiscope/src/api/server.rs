//! API server for Sentiscope

use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post},
    Router,
};
use sentiscope_core::{CacheConfig, CacheStore, Fetcher, InferenceEngine, OrchestratorConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::fetcher::HttpFetcher;
use crate::lexicon::LexiconEngine;

use super::routes::{analyze, cache_stats, health_check, invalidate, AppState};

/// Produces the inference engine; runs on a blocking thread after startup
pub type EngineLoader = Box<dyn FnOnce() -> Result<Arc<dyn InferenceEngine>> + Send + 'static>;

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
    pub cache: CacheConfig,
    pub orchestrator: OrchestratorConfig,
    /// JSON lexicon to load; the built-in lexicon is used when absent
    pub lexicon: Option<PathBuf>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cache: CacheConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            lexicon: None,
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    fetcher: Arc<dyn Fetcher>,
    engine_loader: Option<EngineLoader>,
}

impl ApiServer {
    /// Create a new API server with configuration
    pub fn new(config: ApiServerConfig) -> Self {
        Self {
            config,
            fetcher: Arc::new(HttpFetcher::new()),
            engine_loader: None,
        }
    }

    /// Create a new API server with default configuration
    pub fn with_defaults() -> Self {
        Self::new(ApiServerConfig::default())
    }

    /// Replace the HTTP fetcher
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replace the lexicon loader with a custom engine source
    pub fn with_engine_loader<F>(mut self, loader: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn InferenceEngine>> + Send + 'static,
    {
        self.engine_loader = Some(Box::new(loader));
        self
    }

    /// Build the router over `app_state`
    pub fn router(app_state: Arc<AppState>) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/analyze", post(analyze))
            .route("/cache", delete(invalidate))
            .route("/cache/stats", get(cache_stats))
            .with_state(app_state)
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        self.config.cache.validate()?;
        self.config.orchestrator.validate()?;

        let cache = Arc::new(CacheStore::new(self.config.cache.clone()));
        if cache.clone().spawn_sweeper().is_some() {
            info!("Background cache sweep enabled");
        }

        // Create application state
        let app_state = Arc::new(AppState::new(
            cache,
            self.fetcher,
            self.config.orchestrator.clone(),
        ));

        let loader = match self.engine_loader {
            Some(loader) => loader,
            None => lexicon_loader(self.config.lexicon.clone()),
        };
        spawn_engine_load(Arc::clone(&app_state), loader);

        let app = Self::router(app_state);

        // Start server
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

fn lexicon_loader(path: Option<PathBuf>) -> EngineLoader {
    Box::new(move || {
        let engine = LexiconEngine::load_or_builtin(path.as_deref())?;
        Ok(Arc::new(engine) as Arc<dyn InferenceEngine>)
    })
}

/// Load the engine off the request path; requests get 503 until it is ready
fn spawn_engine_load(app_state: Arc<AppState>, loader: EngineLoader) {
    tokio::spawn(async move {
        info!("Loading inference engine in the background");

        match tokio::task::spawn_blocking(loader).await {
            Ok(Ok(engine)) => app_state.install_engine(engine).await,
            Ok(Err(e)) => error!("Failed to load inference engine: {:#}", e),
            Err(e) => error!("Inference engine loader crashed: {}", e),
        }
    });
}
