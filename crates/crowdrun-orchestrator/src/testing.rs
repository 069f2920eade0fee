//! In-memory platform and time doubles for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crowdrun_client::{ClientError, Platform};
use crowdrun_core::{
    AnalyticsRequest, AssignmentQuery, BatchOptions, Operation, OperationStatus, Pool, PoolId,
    PoolStatus, Project, Table, Task, TaskBatchCreateResult, Training, TrainingId,
};

use crate::time::{Clock, Sleeper};

/// A recording [`Platform`] that assigns sequential ids and replays a
/// scripted sequence of pool statuses. Opening a pool does not touch the
/// script; it describes what `get_pool` reports afterwards.
#[derive(Default)]
pub struct FakePlatform {
    next_id: AtomicUsize,
    pub calls: Mutex<Vec<&'static str>>,
    pub projects: Mutex<Vec<Project>>,
    pub trainings: Mutex<Vec<Training>>,
    pub pools: Mutex<Vec<Pool>>,
    pub batches: Mutex<Vec<(Vec<Task>, BatchOptions)>>,
    pub queries: Mutex<Vec<AssignmentQuery>>,
    /// Statuses returned by successive `get_pool` calls; the last one repeats.
    pub pool_statuses: Mutex<VecDeque<PoolStatus>>,
    /// Analytics details returned by `wait_operation`.
    pub percentage: Option<f64>,
    pub assignments: Table,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            percentage: Some(50.0),
            ..Self::default()
        }
    }

    pub fn with_pool_statuses(self, statuses: impl IntoIterator<Item = PoolStatus>) -> Self {
        Self {
            pool_statuses: Mutex::new(statuses.into_iter().collect()),
            ..self
        }
    }

    pub fn with_assignments(self, assignments: Table) -> Self {
        Self {
            assignments,
            ..self
        }
    }

    pub async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: &'static str) {
        self.calls.lock().await.push(call);
    }

    fn fresh_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    async fn current_status(&self) -> PoolStatus {
        let mut statuses = self.pool_statuses.lock().await;
        if statuses.len() > 1 {
            statuses.pop_front().unwrap_or(PoolStatus::Closed)
        } else {
            statuses.front().copied().unwrap_or(PoolStatus::Closed)
        }
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn create_project(&self, project: &Project) -> Result<Project, ClientError> {
        self.record("create_project").await;
        self.projects.lock().await.push(project.clone());
        Ok(project.clone().with_id(self.fresh_id()))
    }

    async fn create_training(&self, training: &Training) -> Result<Training, ClientError> {
        self.record("create_training").await;
        self.trainings.lock().await.push(training.clone());
        Ok(training.clone().with_id(self.fresh_id()))
    }

    async fn create_pool(&self, pool: &Pool) -> Result<Pool, ClientError> {
        self.record("create_pool").await;
        self.pools.lock().await.push(pool.clone());
        Ok(pool.clone().with_id(self.fresh_id()))
    }

    async fn create_tasks(
        &self,
        tasks: &[Task],
        options: BatchOptions,
    ) -> Result<TaskBatchCreateResult, ClientError> {
        self.record("create_tasks").await;
        self.batches.lock().await.push((tasks.to_vec(), options));
        let items = tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (i, task.clone().with_id(self.fresh_id().into())))
            .collect();
        Ok(TaskBatchCreateResult {
            items,
            validation_errors: Default::default(),
        })
    }

    async fn open_pool(&self, pool_id: &PoolId) -> Result<Pool, ClientError> {
        self.record("open_pool").await;
        Ok(Pool::default()
            .with_id(pool_id.clone())
            .with_status(PoolStatus::Open))
    }

    async fn open_training(&self, training_id: &TrainingId) -> Result<Training, ClientError> {
        self.record("open_training").await;
        let mut training = Training::default().with_id(training_id.clone());
        training.status = Some(PoolStatus::Open);
        Ok(training)
    }

    async fn get_pool(&self, pool_id: &PoolId) -> Result<Pool, ClientError> {
        self.record("get_pool").await;
        let status = self.current_status().await;
        Ok(Pool::default()
            .with_id(pool_id.clone())
            .with_status(status))
    }

    async fn get_analytics(&self, requests: &[AnalyticsRequest]) -> Result<Operation, ClientError> {
        self.record("get_analytics").await;
        Ok(Operation {
            id: format!("op-{}", requests.len()),
            operation_type: Some("ANALYTICS".to_string()),
            status: OperationStatus::Running,
            submitted: None,
            finished: None,
            details: None,
        })
    }

    async fn wait_operation(&self, operation: &Operation) -> Result<Operation, ClientError> {
        self.record("wait_operation").await;
        let details = self
            .percentage
            .map(|value| json!({"value": [{"result": {"value": value, "finished": true}}]}));
        Ok(Operation {
            status: OperationStatus::Success,
            details,
            ..operation.clone()
        })
    }

    async fn get_assignments_table(&self, query: &AssignmentQuery) -> Result<Table, ClientError> {
        self.record("get_assignments_table").await;
        self.queries.lock().await.push(query.clone());
        Ok(self.assignments.clone())
    }
}

/// A clock stopped at one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Returns at once and records the requested delays.
#[derive(Default)]
pub struct InstantSleeper {
    pub slept: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, period: Duration) {
        self.slept.lock().await.push(period);
    }
}

/// Cancels the token on the first sleep and then never wakes up.
pub struct CancellingSleeper(pub CancellationToken);

#[async_trait]
impl Sleeper for CancellingSleeper {
    async fn sleep(&self, _period: Duration) {
        self.0.cancel();
        std::future::pending::<()>().await;
    }
}
