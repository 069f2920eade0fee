//! Error types for the platform client.

use thiserror::Error;

/// Errors that can occur when talking to the platform.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with an error status.
    #[error("API error (HTTP {status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An operation finished with a failure status.
    #[error("operation {0} failed")]
    OperationFailed(String),

    /// An operation did not reach a terminal status in time.
    #[error("operation {0} did not finish in time")]
    OperationTimeout(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
