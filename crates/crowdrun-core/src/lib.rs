//! CrowdRun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Runtime specifics
//!
//! It covers the typed platform entities (projects, training pools, pools,
//! tasks), resolution of loosely-typed configs into those entities, the
//! tabular task batch builder and the Dawid-Skene label aggregation.

pub mod aggregation;
pub mod assignment;
pub mod batch;
pub mod error;
pub mod ids;
pub mod operation;
pub mod pool;
pub mod project;
pub mod reference;
pub mod resolve;
pub mod status;
pub mod table;
pub mod task;

// Re-export commonly used types
pub use aggregation::{
    aggregate_dawid_skene, observations_from_table, AggregationResult, DawidSkene,
    DawidSkeneModel, MajorityVote, Observation,
};
pub use assignment::{AssignmentQuery, AssignmentStatus};
pub use batch::{
    build_batch, build_control_tasks, build_plain_tasks, build_training_tasks, TaskSources,
};
pub use error::CoreError;
pub use ids::{PoolId, ProjectId, TaskId, TrainingId};
pub use operation::{AnalyticsRequest, Operation, OperationStatus};
pub use pool::{Money, Pool, QualityControl, TrainingRequirement};
pub use project::{Project, Training};
pub use reference::Reference;
pub use resolve::{encode_blob, extract_id, resolve, unstructure, Entity, EntityRef};
pub use status::PoolStatus;
pub use table::Table;
pub use task::{BatchOptions, KnownSolution, Task, TaskBatchCreateResult};
