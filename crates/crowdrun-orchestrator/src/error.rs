//! Orchestrator errors.

use thiserror::Error;

use crowdrun_client::ClientError;
use crowdrun_core::CoreError;

/// Errors returned by orchestrator operations.
///
/// Local validation failures surface as [`OrchestratorError::Core`] before
/// any remote call is made.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("platform error: {0}")]
    Platform(#[from] ClientError),

    #[error("wait was cancelled")]
    Cancelled,
}
