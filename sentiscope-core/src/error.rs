//! Error types for the analysis core
//!
//! Cache operations never fail, so there is no cache error here. Failures come
//! from the two collaborators (fetching and inference) and from configuration.

use std::time::Duration;
use thiserror::Error;

/// Failure reported by a [`Fetcher`](crate::collaborators::Fetcher)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Network-level failure (DNS, connection reset, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Remote answered with a non-success status
    #[error("HTTP status {status} from {identifier}")]
    Status { status: u16, identifier: String },

    /// Fetch did not finish within the configured bound
    #[error("Fetch timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// Resource was retrieved but contained no usable text
    #[error("No usable text found")]
    Empty,
}

/// Failure reported by an [`InferenceEngine`](crate::collaborators::InferenceEngine)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The engine raised an error while classifying
    #[error("Model error: {0}")]
    Model(String),

    /// The engine returned output that cannot be interpreted
    #[error("Malformed output: {0}")]
    Malformed(String),
}

/// Error returned by [`Orchestrator::get_or_compute`](crate::Orchestrator::get_or_compute)
///
/// Cloneable so a single failed computation can be handed to every caller that
/// was waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    /// The resource could not be retrieved or yielded no text
    #[error("Fetch failed for {identifier}: {source}")]
    FetchFailed {
        identifier: String,
        #[source]
        source: FetchError,
    },

    /// The inference collaborator failed or produced malformed output
    #[error("Inference failed for {identifier}: {reason}")]
    InferenceFailed { identifier: String, reason: String },
}

impl OrchestratorError {
    pub fn fetch_failed(identifier: impl Into<String>, source: FetchError) -> Self {
        OrchestratorError::FetchFailed {
            identifier: identifier.into(),
            source,
        }
    }

    pub fn inference_failed(identifier: impl Into<String>, reason: impl ToString) -> Self {
        OrchestratorError::InferenceFailed {
            identifier: identifier.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this failure should be attributed to the requested content
    /// rather than to the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, OrchestratorError::FetchFailed { .. })
    }
}

/// Invalid configuration value
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Configuration error: {0}")]
pub struct ConfigError(pub String);

impl From<String> for ConfigError {
    fn from(s: String) -> Self {
        ConfigError(s)
    }
}

impl From<&str> for ConfigError {
    fn from(s: &str) -> Self {
        ConfigError(s.to_string())
    }
}

/// Result type alias for orchestrated analysis
pub type Result<T> = std::result::Result<T, OrchestratorError>;
