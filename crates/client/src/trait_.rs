//! Reference service trait abstraction.

use async_trait::async_trait;
use gsp_core::{ActionRequest, FaseDisponible, ReferenceDetail, ReferenceId};

/// Error type for reference service operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the reference service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport failure or unexpected response
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Referencia or phase not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request is missing required fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transition not allowed in the phase's present state
    #[error("Stale state: {0}")]
    StaleState(String),
}

/// Client of the service that owns referencias and applies transitions.
///
/// This trait allows the mock and the real backend to be swapped.
#[async_trait]
pub trait ReferenceServiceClient: Send + Sync {
    /// Load the current detail of a referencia.
    async fn fetch_reference(&self, id: &ReferenceId) -> Result<ReferenceDetail>;

    /// Ordered list of phases available for a referencia.
    async fn available_phases(&self, id: &ReferenceId) -> Result<Vec<FaseDisponible>>;

    /// Apply a transition and return the referencia as stored afterwards.
    async fn apply_action(
        &self,
        id: &ReferenceId,
        request: &ActionRequest,
        user: &str,
    ) -> Result<ReferenceDetail>;
}

#[async_trait]
impl<T: ReferenceServiceClient + ?Sized> ReferenceServiceClient for std::sync::Arc<T> {
    async fn fetch_reference(&self, id: &ReferenceId) -> Result<ReferenceDetail> {
        (**self).fetch_reference(id).await
    }

    async fn available_phases(&self, id: &ReferenceId) -> Result<Vec<FaseDisponible>> {
        (**self).available_phases(id).await
    }

    async fn apply_action(
        &self,
        id: &ReferenceId,
        request: &ActionRequest,
        user: &str,
    ) -> Result<ReferenceDetail> {
        (**self).apply_action(id, request, user).await
    }
}
