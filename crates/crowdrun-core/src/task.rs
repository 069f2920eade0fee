//! Task and task batch types.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{PoolId, TaskId};

/// Expected output for a control or training task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnownSolution {
    /// Output field name to expected value.
    pub output_values: Map<String, Value>,
}

/// A unit of work shown to workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by the platform on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,

    /// Pool (or training pool) the task belongs to.
    pub pool_id: PoolId,

    /// Input field name to value.
    pub input_values: Map<String, Value>,

    /// Present on control and training tasks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_solutions: Vec<KnownSolution>,

    /// Hint shown on a wrong answer to a training task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_on_unknown_solution: Option<String>,

    /// When the task was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDateTime>,
}

impl Task {
    /// Create a new Task owned by `pool_id`.
    pub fn new(pool_id: PoolId, input_values: Map<String, Value>) -> Self {
        Self {
            id: None,
            pool_id,
            input_values,
            known_solutions: Vec::new(),
            message_on_unknown_solution: None,
            created: None,
        }
    }

    /// Builder method to add a known solution.
    pub fn with_known_solution(mut self, output_values: Map<String, Value>) -> Self {
        self.known_solutions.push(KnownSolution { output_values });
        self
    }

    /// Builder method to set the training hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.message_on_unknown_solution = Some(hint.into());
        self
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    /// Check if the task carries an expected answer.
    pub fn is_control(&self) -> bool {
        !self.known_solutions.is_empty()
    }
}

/// Flags sent along with a task batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Use the pool's default overlap for tasks that do not set one.
    pub allow_defaults: bool,
    /// Open the pool right after the tasks are created.
    pub open_pool: bool,
    /// Create the valid tasks and report the invalid ones instead of
    /// rejecting the whole batch.
    pub skip_invalid_items: bool,
}

/// Outcome of a task batch submission.
///
/// Both maps are keyed by the task's position in the submitted batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskBatchCreateResult {
    /// Tasks that were created.
    #[serde(default)]
    pub items: BTreeMap<usize, Task>,

    /// Field-level validation errors of rejected tasks.
    #[serde(default)]
    pub validation_errors: BTreeMap<usize, Value>,
}

impl TaskBatchCreateResult {
    /// Created tasks in batch order.
    pub fn accepted(&self) -> impl Iterator<Item = (usize, &Task)> {
        self.items.iter().map(|(index, task)| (*index, task))
    }

    /// Rejected batch positions with their validation errors.
    pub fn rejected(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.validation_errors
            .iter()
            .map(|(index, errors)| (*index, errors))
    }

    /// Returns true if no task was rejected.
    pub fn is_complete(&self) -> bool {
        self.validation_errors.is_empty()
    }
}
