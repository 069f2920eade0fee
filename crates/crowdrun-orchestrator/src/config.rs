//! Orchestrator configuration.

use std::time::Duration;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Delay between completion checks while waiting on a pool (seconds).
    pub poll_period_secs: u64,

    /// EM rounds used by Dawid-Skene aggregation.
    pub aggregation_rounds: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_period_secs: 60,
            aggregation_rounds: 20,
        }
    }
}

impl Config {
    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_period_secs)
    }
}
