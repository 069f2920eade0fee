//! Asynchronous platform operations and analytics requests.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PoolId;

/// Status of a platform operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Success,
    Fail,
}

impl OperationStatus {
    /// Returns true if the operation will not change any more.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Fail)
    }
}

/// A long-running platform operation (pool opening, analytics, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,

    pub status: OperationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<NaiveDateTime>,

    /// Operation-specific result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Operation {
    /// Completion percentage from a finished completion-percentage
    /// analytics operation (`details.value[0].result.value`).
    pub fn completion_percentage(&self) -> Option<f64> {
        self.details
            .as_ref()?
            .pointer("/value/0/result/value")?
            .as_f64()
    }
}

/// A request for a pool analytic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsRequest {
    pub subject: String,
    pub subject_id: String,
    pub name: String,
}

impl AnalyticsRequest {
    /// Share of the pool's tasks that are completed.
    pub fn completion_percentage(pool_id: &PoolId) -> Self {
        Self {
            subject: "POOL".to_string(),
            subject_id: pool_id.to_string(),
            name: "completion_percentage".to_string(),
        }
    }
}
