//! Project and Training pool entities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resolve::Entity;
use crate::{PoolStatus, ProjectId, TrainingId};

/// A top-level campaign container.
///
/// Only the fields this crate reads are typed; the rest of the project
/// config (task spec, instructions, ...) is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Assigned by the platform on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProjectId>,

    /// Name shown to workers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_name: Option<String>,

    /// Description shown to workers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_description: Option<String>,

    /// Requester-only comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_comment: Option<String>,

    /// Every other config field, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    /// Create a new Project config with a public name.
    pub fn new(public_name: impl Into<String>) -> Self {
        Self {
            public_name: Some(public_name.into()),
            ..Self::default()
        }
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: impl Into<ProjectId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Entity for Project {
    const KIND: &'static str = "project";
    type Id = ProjectId;

    fn id(&self) -> Option<&ProjectId> {
        self.id.as_ref()
    }
}

/// A training pool used to qualify workers before admission to a pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Training {
    /// Assigned by the platform on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TrainingId>,

    /// Owning project; set by the orchestrator before creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,

    /// Requester-only name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_name: Option<String>,

    /// Lifecycle status reported by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PoolStatus>,

    /// Every other config field, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Training {
    /// Create a new Training config with a private name.
    pub fn new(private_name: impl Into<String>) -> Self {
        Self {
            private_name: Some(private_name.into()),
            ..Self::default()
        }
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: impl Into<TrainingId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns true if the training pool is accepting workers.
    pub fn is_open(&self) -> bool {
        self.status.is_some_and(|s| s.is_open())
    }
}

impl Entity for Training {
    const KIND: &'static str = "training";
    type Id = TrainingId;

    fn id(&self) -> Option<&TrainingId> {
        self.id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_round_trip() {
        let doc = json!({
            "public_name": "Sentiment",
            "task_spec": {"input_spec": {"text": {"type": "string"}}},
            "assignments_issuing_type": "AUTOMATED"
        });
        let project: Project = serde_json::from_value(doc.clone()).unwrap();

        assert_eq!(project.public_name.as_deref(), Some("Sentiment"));
        assert!(project.id.is_none());
        assert_eq!(project.extra["assignments_issuing_type"], "AUTOMATED");
        assert_eq!(serde_json::to_value(&project).unwrap(), doc);
    }

    #[test]
    fn test_training_status() {
        let training: Training =
            serde_json::from_value(json!({"id": "9", "status": "OPEN"})).unwrap();
        assert_eq!(training.id(), Some(&TrainingId::new("9")));
        assert!(training.is_open());
    }
}
