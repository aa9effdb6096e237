//! Interfaces of the external collaborators the orchestrator drives
//!
//! The core never knows how content is retrieved or how it is classified. It
//! only needs a [`Fetcher`] that turns an identifier into text and an
//! [`InferenceEngine`] that turns text into a label and a score.

use crate::analysis::RawPrediction;
use crate::error::{FetchError, InferenceError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Retrieves the textual content behind a resource identifier
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the text for `identifier`, giving up after `timeout`
    ///
    /// Implementations translate their own transport errors into
    /// [`FetchError`]. Returning empty text is allowed; the orchestrator
    /// treats it as a failure.
    async fn fetch(&self, identifier: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// Synchronous text classifier
///
/// Called from the blocking thread pool, so implementations may do CPU-heavy
/// work directly.
pub trait InferenceEngine: Send + Sync {
    fn classify(&self, text: &str) -> Result<RawPrediction, InferenceError>;
}

/// Lifecycle of the inference engine handle
///
/// Model loading may fail or take a while; until it succeeds the gateway
/// refuses analysis requests instead of calling the orchestrator.
#[derive(Clone, Default)]
pub enum EngineState {
    #[default]
    Uninitialized,
    Ready(Arc<dyn InferenceEngine>),
}

impl EngineState {
    pub fn ready(engine: impl InferenceEngine + 'static) -> Self {
        EngineState::Ready(Arc::new(engine))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, EngineState::Ready(_))
    }

    pub fn engine(&self) -> Option<Arc<dyn InferenceEngine>> {
        match self {
            EngineState::Ready(engine) => Some(engine.clone()),
            EngineState::Uninitialized => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Ready(_) => "ready",
            EngineState::Uninitialized => "uninitialized",
        }
    }
}

impl fmt::Debug for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EngineState::{}", self.as_str())
    }
}
