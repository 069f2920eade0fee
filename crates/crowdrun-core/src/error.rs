//! Core domain errors.

use thiserror::Error;

/// Core domain errors for CrowdRun.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A config reference could not be coerced into the target entity type.
    #[error("Cannot resolve {kind}: {reason}")]
    Resolution { kind: &'static str, reason: String },

    /// A required related entity was given neither as an object nor as an id.
    #[error("Either {0} or {0}_id should be set")]
    MissingReference(&'static str),

    /// The resolved entity has no id yet (it was never created remotely).
    #[error("Got id=None from {0} config")]
    MissingIdentifier(&'static str),

    /// A semantically invalid combination of settings.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No task rows across pool, control and training datasets.
    #[error("At least one of pool_tasks, control_tasks or training_tasks should be set")]
    EmptyBatch,

    /// A required column is missing from a table.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    pub(crate) fn resolution(kind: &'static str, reason: impl ToString) -> Self {
        Self::Resolution {
            kind,
            reason: reason.to_string(),
        }
    }
}
