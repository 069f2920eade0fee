//! Pool entity and its quality-control settings.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::resolve::Entity;
use crate::{CoreError, PoolId, PoolStatus, ProjectId, TrainingId};

/// An exact decimal amount of money.
///
/// Backed by an arbitrary-precision JSON number so `0.05` stays `0.05`
/// on its way from a config file to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Number);

impl Money {
    /// Decimal text of the amount, exactly as given.
    pub fn as_number(&self) -> &Number {
        &self.0
    }
}

impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Number>()
            .map(Self)
            .map_err(|e| CoreError::InvalidInput(format!("invalid amount '{s}': {e}")))
    }
}

impl From<Number> for Money {
    fn from(n: Number) -> Self {
        Self(n)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The training-requirement slot of a pool's quality control.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequirement {
    /// Training pool a worker must pass before joining.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_pool_id: Option<TrainingId>,

    /// Passing score and any other requirement fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Quality-control configuration of a pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityControl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_requirement: Option<TrainingRequirement>,

    /// Rules, captcha settings and the like.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A task pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    /// Assigned by the platform on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PoolId>,

    /// Owning project; set by the orchestrator before creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,

    /// Requester-only name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_name: Option<String>,

    /// When the pool closes on its own (UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub will_expire: Option<NaiveDateTime>,

    /// Payment for one task suite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_per_assignment: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_control: Option<QualityControl>,

    /// Lifecycle status reported by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PoolStatus>,

    /// Every other config field, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pool {
    /// Create a new Pool config with a private name.
    pub fn new(private_name: impl Into<String>) -> Self {
        Self {
            private_name: Some(private_name.into()),
            ..Self::default()
        }
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: impl Into<PoolId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method to set the status (useful for testing).
    pub fn with_status(mut self, status: PoolStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns true if the pool is accepting work.
    pub fn is_open(&self) -> bool {
        self.status.is_some_and(|s| s.is_open())
    }

    /// Returns true if the pool is closed.
    pub fn is_closed(&self) -> bool {
        self.status.is_some_and(|s| s.is_closed())
    }

    /// Mutable access to the training-requirement slot, if configured.
    pub fn training_requirement_mut(&mut self) -> Option<&mut TrainingRequirement> {
        self.quality_control
            .as_mut()
            .and_then(|qc| qc.training_requirement.as_mut())
    }
}

impl Entity for Pool {
    const KIND: &'static str = "pool";
    type Id = PoolId;

    fn id(&self) -> Option<&PoolId> {
        self.id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_money_keeps_decimal_text() {
        let money: Money = "0.05".parse().unwrap();
        assert_eq!(money.to_string(), "0.05");
        assert_eq!(serde_json::to_string(&money).unwrap(), "0.05");
    }

    #[test]
    fn test_money_rejects_garbage() {
        assert!(matches!(
            "five cents".parse::<Money>(),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_pool_from_platform_document() {
        let pool: Pool = serde_json::from_str(
            r#"{
                "id": "31",
                "project_id": "7",
                "private_name": "main",
                "will_expire": "2030-01-01T00:00:00",
                "reward_per_assignment": 0.010,
                "quality_control": {
                    "training_requirement": {"training_passing_skill_value": 80},
                    "configs": []
                },
                "status": "CLOSED",
                "defaults": {"default_overlap_for_new_task_suites": 3}
            }"#,
        )
        .unwrap();

        assert_eq!(pool.id, Some(PoolId::new("31")));
        assert!(pool.is_closed());
        assert_eq!(
            pool.reward_per_assignment.as_ref().map(|m| m.to_string()),
            Some("0.010".to_string())
        );
        let requirement = pool
            .quality_control
            .as_ref()
            .and_then(|qc| qc.training_requirement.as_ref())
            .unwrap();
        assert!(requirement.training_pool_id.is_none());
        assert_eq!(requirement.extra["training_passing_skill_value"], json!(80));
        assert!(pool.extra.contains_key("defaults"));
    }

    #[test]
    fn test_training_requirement_slot() {
        let mut pool = Pool::new("no qc");
        assert!(pool.training_requirement_mut().is_none());

        pool.quality_control = Some(QualityControl {
            training_requirement: Some(TrainingRequirement::default()),
            ..QualityControl::default()
        });
        pool.training_requirement_mut().unwrap().training_pool_id = Some("5".into());
        assert_eq!(
            serde_json::to_value(&pool).unwrap()["quality_control"]["training_requirement"]
                ["training_pool_id"],
            json!("5")
        );
    }
}
