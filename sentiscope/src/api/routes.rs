//! API routes for the Sentiscope server

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sentiscope_core::{
    CacheKey, CacheStats, CacheStore, EngineState, Fetcher, InferenceEngine, Orchestrator,
    OrchestratorConfig, OrchestratorError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Application state
pub struct AppState {
    pub cache: Arc<CacheStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub orchestrator_config: OrchestratorConfig,
    pub engine: Arc<RwLock<EngineState>>,
    pub orchestrator: Arc<RwLock<Option<Orchestrator>>>,
}

impl AppState {
    pub fn new(
        cache: Arc<CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        orchestrator_config: OrchestratorConfig,
    ) -> Self {
        Self {
            cache,
            fetcher,
            orchestrator_config,
            engine: Arc::new(RwLock::new(EngineState::Uninitialized)),
            orchestrator: Arc::new(RwLock::new(None)),
        }
    }

    /// Make `engine` available to `/analyze`
    pub async fn install_engine(&self, engine: Arc<dyn InferenceEngine>) {
        let orchestrator = Orchestrator::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.fetcher),
            Arc::clone(&engine),
            self.orchestrator_config.clone(),
        );

        *self.orchestrator.write().await = Some(orchestrator);
        *self.engine.write().await = EngineState::Ready(engine);
        info!("Inference engine ready");
    }
}

/// Health check response
#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: String,
}

/// Analysis request
#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

/// Analysis response
#[derive(Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub url: String,
    pub sentiment: String,
    pub score: f64,
    pub served_from_cache: bool,
}

/// Cache invalidation query parameters
#[derive(Deserialize)]
pub struct InvalidateQuery {
    pub url: String,
}

/// Cache invalidation response
#[derive(Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub url: String,
    pub removed: bool,
}

/// Error body returned by every failing endpoint
#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failure of an API call, mapped onto an HTTP status
#[derive(Debug)]
pub enum ApiError {
    InvalidUrl(String),
    EngineUnavailable,
    Analysis(OrchestratorError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidUrl(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Analysis(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Analysis(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidUrl(url) => {
                format!("URL must start with http:// or https://, got '{}'", url)
            }
            ApiError::EngineUnavailable => {
                "Sentiment model is not loaded yet, try again shortly".to_string()
            }
            ApiError::Analysis(e @ OrchestratorError::FetchFailed { .. }) => {
                format!("Could not extract text from the URL: {}", e)
            }
            ApiError::Analysis(e) => format!("Sentiment analysis failed: {}", e),
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        ApiError::Analysis(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.message(),
        });
        (status, body).into_response()
    }
}

/// Health check endpoint
pub async fn health_check(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = app_state.engine.read().await.as_str().to_string();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine,
    })
}

/// Analyze the article behind a URL
pub async fn analyze(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let url = payload.url.trim().to_string();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ApiError::InvalidUrl(url));
    }

    // Clone out of the lock so a long analysis never holds it
    let orchestrator = app_state
        .orchestrator
        .read()
        .await
        .clone()
        .ok_or(ApiError::EngineUnavailable)?;

    let result = orchestrator.get_or_compute(&url).await.map_err(|e| {
        warn!("Analysis of {} failed: {}", url, e);
        ApiError::from(e)
    })?;

    Ok(Json(AnalyzeResponse {
        url,
        sentiment: result.label.to_string(),
        score: result.score,
        served_from_cache: result.served_from_cache,
    }))
}

/// Drop the cached analysis for a URL
pub async fn invalidate(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<InvalidateQuery>,
) -> impl IntoResponse {
    let removed = app_state
        .cache
        .invalidate(&CacheKey::normalize(&params.url))
        .await;

    Json(InvalidateResponse {
        url: params.url,
        removed,
    })
}

/// Cache statistics endpoint
pub async fn cache_stats(State(app_state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(app_state.cache.stats().await)
}
