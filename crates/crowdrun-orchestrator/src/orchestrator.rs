//! Entity orchestration.
//!
//! Each operation resolves its loosely-typed inputs, wires cross-references
//! and overrides, and only then calls the platform. Local validation never
//! leaves partial remote state behind.

use std::sync::Arc;

use tracing::{info, warn};

use crowdrun_client::Platform;
use crowdrun_core::{
    aggregate_dawid_skene, build_batch, extract_id, resolve, AggregationResult, AssignmentQuery,
    BatchOptions, CoreError, EntityRef, Money, Pool, PoolId, Project, Reference, Table,
    TaskBatchCreateResult, TaskSources, Training, TrainingId,
};

use crate::config::Config;
use crate::error::OrchestratorError;
use crate::expiration::Expiration;
use crate::lifecycle::{PoolController, WaitOptions};
use crate::time::{Clock, Sleeper, SystemClock, TokioSleeper};

/// Settings applied on top of a pool config before creation.
#[derive(Debug, Clone, Default)]
pub struct PoolOverrides {
    /// Replaces `will_expire` when set.
    pub expiration: Option<Expiration>,
    /// Replaces `reward_per_assignment` when set.
    pub reward_per_assignment: Option<Money>,
}

impl PoolOverrides {
    /// Builder method to set the expiration.
    pub fn with_expiration(mut self, expiration: impl Into<Expiration>) -> Self {
        self.expiration = Some(expiration.into());
        self
    }

    /// Builder method to set the reward.
    pub fn with_reward(mut self, reward: Money) -> Self {
        self.reward_per_assignment = Some(reward);
        self
    }
}

/// Where a task batch goes.
///
/// Pools and training pools share the task endpoint, so an untyped pool
/// config that does not resolve as a [`Pool`] is retried as a [`Training`].
#[derive(Debug, Clone)]
pub enum TaskTarget {
    Pool(EntityRef<Pool>),
    Training(EntityRef<Training>),
    Id(PoolId),
}

impl TaskTarget {
    fn resolve_id(self) -> Result<PoolId, CoreError> {
        match self {
            Self::Id(id) => Ok(id),
            Self::Training(training) => extract_id(training).map(PoolId::from),
            Self::Pool(pool) => match extract_id(pool.clone()) {
                Ok(id) => Ok(id),
                Err(err) => match pool.recast::<Training>() {
                    Some(training) => extract_id(training).map(PoolId::from).map_err(|_| err),
                    None => Err(err),
                },
            },
        }
    }
}

impl From<Pool> for TaskTarget {
    fn from(pool: Pool) -> Self {
        Self::Pool(EntityRef::Typed(pool))
    }
}

impl From<Training> for TaskTarget {
    fn from(training: Training) -> Self {
        Self::Training(EntityRef::Typed(training))
    }
}

impl From<EntityRef<Pool>> for TaskTarget {
    fn from(pool: EntityRef<Pool>) -> Self {
        Self::Pool(pool)
    }
}

impl From<PoolId> for TaskTarget {
    fn from(id: PoolId) -> Self {
        Self::Id(id)
    }
}

impl From<TrainingId> for TaskTarget {
    fn from(id: TrainingId) -> Self {
        Self::Id(id.into())
    }
}

/// Pipeline steps against one platform.
pub struct Orchestrator {
    platform: Arc<dyn Platform>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    config: Config,
}

impl Orchestrator {
    /// Create a new Orchestrator with the wall clock and default config.
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            clock: Arc::new(SystemClock),
            sleeper: Arc::new(TokioSleeper),
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Pool lifecycle operations sharing this orchestrator's platform.
    pub fn pools(&self) -> PoolController {
        PoolController::new(self.platform.clone()).with_sleeper(self.sleeper.clone())
    }

    /// Wait options with the configured poll period.
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            period: self.config.poll_period(),
            ..WaitOptions::default()
        }
    }

    /// Create a project.
    pub async fn create_project(
        &self,
        project: impl Into<EntityRef<Project>>,
    ) -> Result<Project, OrchestratorError> {
        let project = resolve(project.into())?;

        let created = self.platform.create_project(&project).await?;
        info!(project_id = ?created.id, "Created project");
        Ok(created)
    }

    /// Create a training pool in `project`.
    pub async fn create_training(
        &self,
        training: impl Into<EntityRef<Training>>,
        project: Reference<Project>,
    ) -> Result<Training, OrchestratorError> {
        let mut training = resolve(training.into())?;
        training.project_id = Some(project.resolve_id()?);

        let created = self.platform.create_training(&training).await?;
        info!(
            training_id = ?created.id,
            project_id = ?created.project_id,
            "Created training"
        );
        Ok(created)
    }

    /// Create a pool in `project`, optionally gated by `training`.
    ///
    /// A training reference requires the pool config to already carry a
    /// training-requirement slot; its `training_pool_id` is filled in.
    pub async fn create_pool(
        &self,
        pool: impl Into<EntityRef<Pool>>,
        project: Reference<Project>,
        training: Reference<Training>,
        overrides: PoolOverrides,
    ) -> Result<Pool, OrchestratorError> {
        let mut pool = resolve(pool.into())?;
        pool.project_id = Some(project.resolve_id()?);

        if !training.is_absent() {
            let requirement = pool.training_requirement_mut().ok_or_else(|| {
                CoreError::InvalidConfiguration(
                    "pool.quality_control.training_requirement should be set before training assignment"
                        .to_string(),
                )
            })?;
            requirement.training_pool_id = Some(training.resolve_id()?);
        }

        if let Some(expiration) = &overrides.expiration {
            pool.will_expire = Some(expiration.deadline(self.clock.now())?);
        }
        if let Some(reward) = overrides.reward_per_assignment {
            pool.reward_per_assignment = Some(reward);
        }

        let created = self.platform.create_pool(&pool).await?;
        info!(
            pool_id = ?created.id,
            project_id = ?created.project_id,
            will_expire = ?created.will_expire,
            "Created pool"
        );
        Ok(created)
    }

    /// Build one batch from the given datasets and submit it.
    ///
    /// Rejected tasks are reported in the result, not as an error.
    pub async fn create_tasks(
        &self,
        target: impl Into<TaskTarget>,
        sources: &TaskSources,
        options: BatchOptions,
    ) -> Result<TaskBatchCreateResult, OrchestratorError> {
        let pool_id = target.into().resolve_id()?;
        let tasks = build_batch(sources, &pool_id)?;

        let result = self.platform.create_tasks(&tasks, options).await?;
        let rejected = result.validation_errors.len();
        if rejected > 0 {
            warn!(pool_id = %pool_id, rejected, "Some tasks were rejected");
        }
        info!(
            pool_id = %pool_id,
            submitted = tasks.len(),
            created = result.items.len(),
            "Created tasks"
        );
        Ok(result)
    }

    /// Export a pool's assignments as a table.
    ///
    /// `filter` narrows the query (statuses, time window, banned workers,
    /// extra fields); the pool id is always the resolved one.
    pub async fn get_assignments(
        &self,
        pool: Reference<Pool>,
        filter: impl FnOnce(AssignmentQuery) -> AssignmentQuery,
    ) -> Result<Table, OrchestratorError> {
        let pool_id = pool.resolve_id()?;
        let query = AssignmentQuery {
            pool_id: pool_id.clone(),
            ..filter(AssignmentQuery::new(pool_id.clone()))
        };

        let table = self.platform.get_assignments_table(&query).await?;
        info!(pool_id = %pool_id, rows = table.len(), "Fetched assignments");
        Ok(table)
    }

    /// Dawid-Skene consensus per task with the configured round count.
    pub fn aggregate(&self, assignments: &Table) -> Result<AggregationResult, OrchestratorError> {
        let result = aggregate_dawid_skene(assignments, self.config.aggregation_rounds)?;
        info!(tasks = result.len(), rounds = self.config.aggregation_rounds, "Aggregated answers");
        Ok(result)
    }
}
