//! Assignment export query.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::PoolId;

/// Status of an assignment (a task suite taken by one worker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Active,
    Submitted,
    Accepted,
    Rejected,
    Skipped,
    Expired,
}

impl AssignmentStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Submitted => "SUBMITTED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Skipped => "SKIPPED",
            Self::Expired => "EXPIRED",
        }
    }
}

/// Which assignments of a pool to export as a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentQuery {
    pub pool_id: PoolId,
    /// Empty means every status.
    pub statuses: Vec<AssignmentStatus>,
    /// Only assignments started at or after this time.
    pub start_time_from: Option<NaiveDateTime>,
    /// Only assignments started before this time.
    pub start_time_to: Option<NaiveDateTime>,
    /// Drop answers of banned workers even if accepted.
    pub exclude_banned: bool,
    /// Extra columns to include in the export.
    pub fields: Vec<String>,
}

impl AssignmentQuery {
    pub fn new(pool_id: PoolId) -> Self {
        Self {
            pool_id,
            statuses: Vec::new(),
            start_time_from: None,
            start_time_to: None,
            exclude_banned: false,
            fields: Vec::new(),
        }
    }

    /// Builder method to add a status filter.
    pub fn with_status(mut self, status: AssignmentStatus) -> Self {
        self.statuses.push(status);
        self
    }

    /// Builder method to restrict the start time window.
    pub fn with_time_range(
        mut self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Self {
        self.start_time_from = from;
        self.start_time_to = to;
        self
    }

    /// Builder method to exclude banned workers.
    pub fn excluding_banned(mut self) -> Self {
        self.exclude_banned = true;
        self
    }

    /// Builder method to request an extra column.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }
}
