//! Timeline error types.

use gsp_client::ClientError;

/// Errors surfaced by the timeline assembler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// The reference service could not be reached or answered badly
    #[error("Network error: {0}")]
    Network(String),

    /// A transition request is missing required fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown referencia or phase
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transition not allowed in the phase's present state
    #[error("Stale state: {0}")]
    StaleState(String),
}

impl From<ClientError> for TimelineError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Network(msg) => TimelineError::Network(msg),
            ClientError::Json(e) => TimelineError::Network(format!("malformed response: {e}")),
            ClientError::NotFound(msg) => TimelineError::NotFound(msg),
            ClientError::Validation(msg) => TimelineError::Validation(msg),
            ClientError::StaleState(msg) => TimelineError::StaleState(msg),
        }
    }
}

/// Errors while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A metric override is unusable as a duration
    #[error("Invalid metrics for '{slug}': {reason}")]
    InvalidMetrics {
        /// Phase slug of the override
        slug: String,
        /// What is wrong with it
        reason: String,
    },
}
