//! Plain JSON documents for pipeline outputs.

use serde::Serialize;
use serde_json::Value;

use crowdrun_core::unstructure;

use crate::error::OrchestratorError;

/// Turns the typed result of an orchestrator step into a JSON document.
///
/// ```ignore
/// let pool = orchestrator
///     .create_pool(config, Reference::id("1"), Reference::Absent, PoolOverrides::default())
///     .await
///     .into_document()?;
/// ```
pub trait IntoDocument {
    fn into_document(self) -> Result<Value, OrchestratorError>;
}

impl<T: Serialize> IntoDocument for Result<T, OrchestratorError> {
    fn into_document(self) -> Result<Value, OrchestratorError> {
        let entity = self?;
        Ok(unstructure(&entity)?)
    }
}
