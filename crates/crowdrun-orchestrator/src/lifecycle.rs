//! Pool lifecycle: opening pools and waiting for them to finish.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crowdrun_client::Platform;
use crowdrun_core::{AnalyticsRequest, Pool, PoolId, Reference, Training};

use crate::error::OrchestratorError;
use crate::time::{Sleeper, TokioSleeper};

/// How [`PoolController::wait_pool`] polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Delay between completion checks.
    pub period: Duration,
    /// Open the pool first if it is closed.
    pub auto_open: bool,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(60),
            auto_open: false,
        }
    }
}

/// Opens pools and waits on them.
pub struct PoolController {
    platform: Arc<dyn Platform>,
    sleeper: Arc<dyn Sleeper>,
}

impl PoolController {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Open a pool and return its updated state.
    pub async fn open_pool(&self, pool: Reference<Pool>) -> Result<Pool, OrchestratorError> {
        let pool_id = pool.resolve_id()?;
        let pool = self.platform.open_pool(&pool_id).await?;
        info!(pool_id = %pool_id, status = ?pool.status, "Opened pool");
        Ok(pool)
    }

    /// Open a training pool and return its updated state.
    pub async fn open_training(
        &self,
        training: Reference<Training>,
    ) -> Result<Training, OrchestratorError> {
        let training_id = training.resolve_id()?;
        let training = self.platform.open_training(&training_id).await?;
        info!(training_id = %training_id, status = ?training.status, "Opened training");
        Ok(training)
    }

    /// Block until the pool is no longer open and return its final state.
    ///
    /// There is no iteration limit; the platform decides when the pool
    /// closes. Use [`PoolController::wait_pool_until`] to bound the wait.
    pub async fn wait_pool(
        &self,
        pool: Reference<Pool>,
        options: WaitOptions,
    ) -> Result<Pool, OrchestratorError> {
        self.wait_pool_until(pool, options, &CancellationToken::new())
            .await
    }

    /// [`PoolController::wait_pool`] that gives up with
    /// [`OrchestratorError::Cancelled`] once `cancel` fires.
    pub async fn wait_pool_until(
        &self,
        pool: Reference<Pool>,
        options: WaitOptions,
        cancel: &CancellationToken,
    ) -> Result<Pool, OrchestratorError> {
        let pool_id = pool.resolve_id()?;

        let mut pool = self.platform.get_pool(&pool_id).await?;
        if pool.is_closed() && options.auto_open {
            pool = self.platform.open_pool(&pool_id).await?;
            info!(pool_id = %pool_id, "Opened pool before waiting");
        }

        while pool.is_open() {
            if cancel.is_cancelled() {
                return Err(OrchestratorError::Cancelled);
            }
            self.report_progress(&pool_id).await?;

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(pool_id = %pool_id, "Stopped waiting for pool");
                    return Err(OrchestratorError::Cancelled);
                }
                _ = self.sleeper.sleep(options.period) => {}
            }

            pool = self.platform.get_pool(&pool_id).await?;
        }

        info!(pool_id = %pool_id, status = ?pool.status, "Pool is no longer open");
        Ok(pool)
    }

    async fn report_progress(&self, pool_id: &PoolId) -> Result<(), OrchestratorError> {
        let operation = self
            .platform
            .get_analytics(&[AnalyticsRequest::completion_percentage(pool_id)])
            .await?;
        let operation = self.platform.wait_operation(&operation).await?;

        match operation.completion_percentage() {
            Some(percentage) => info!(pool_id = %pool_id, percentage, "Pool progress"),
            None => warn!(
                pool_id = %pool_id,
                operation_id = %operation.id,
                "Completion percentage missing from analytics result"
            ),
        }
        Ok(())
    }
}
