//! CrowdRun Orchestrator Library
//!
//! Pipeline steps on top of a crowdsourcing [`Platform`]: entity creation
//! from loosely-typed configs, task batch submission, pool lifecycle
//! (open, wait until done) and answer aggregation.
//!
//! [`Platform`]: crowdrun_client::Platform

pub mod config;
pub mod document;
pub mod error;
pub mod expiration;
pub mod lifecycle;
pub mod orchestrator;
pub mod time;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use document::IntoDocument;
pub use error::OrchestratorError;
pub use expiration::Expiration;
pub use lifecycle::{PoolController, WaitOptions};
pub use orchestrator::{Orchestrator, PoolOverrides, TaskTarget};
pub use time::{Clock, Sleeper, SystemClock, TokioSleeper};

pub use crowdrun_core::{aggregate_dawid_skene, AggregationResult};
