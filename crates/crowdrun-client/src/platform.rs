//! The remote platform contract.

use async_trait::async_trait;

use crowdrun_core::{
    AnalyticsRequest, AssignmentQuery, BatchOptions, Operation, Pool, PoolId, Project, Table,
    Task, TaskBatchCreateResult, Training, TrainingId,
};

use crate::error::ClientError;

/// Operations the orchestrator needs from the crowdsourcing platform.
///
/// Implementations perform no retries; failures are returned as-is.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Create a project; the result carries its id.
    async fn create_project(&self, project: &Project) -> Result<Project, ClientError>;

    /// Create a training pool; the result carries its id.
    async fn create_training(&self, training: &Training) -> Result<Training, ClientError>;

    /// Create a pool; the result carries its id.
    async fn create_pool(&self, pool: &Pool) -> Result<Pool, ClientError>;

    /// Submit tasks as one batch.
    async fn create_tasks(
        &self,
        tasks: &[Task],
        options: BatchOptions,
    ) -> Result<TaskBatchCreateResult, ClientError>;

    /// Open a pool and return its updated state.
    async fn open_pool(&self, pool_id: &PoolId) -> Result<Pool, ClientError>;

    /// Open a training pool and return its updated state.
    async fn open_training(&self, training_id: &TrainingId) -> Result<Training, ClientError>;

    /// Fetch the current state of a pool.
    async fn get_pool(&self, pool_id: &PoolId) -> Result<Pool, ClientError>;

    /// Start computing analytics; returns the pending operation.
    async fn get_analytics(&self, requests: &[AnalyticsRequest]) -> Result<Operation, ClientError>;

    /// Wait until an operation reaches a terminal status.
    async fn wait_operation(&self, operation: &Operation) -> Result<Operation, ClientError>;

    /// Export assignments as a table with `INPUT:`, `OUTPUT:`, `GOLDEN:`
    /// and `ASSIGNMENT:` columns.
    async fn get_assignments_table(&self, query: &AssignmentQuery) -> Result<Table, ClientError>;
}
