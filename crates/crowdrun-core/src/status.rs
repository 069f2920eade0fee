//! Pool lifecycle status.

use serde::{Deserialize, Serialize};

/// Status of a Pool or Training pool as reported by the platform.
///
/// Only [`PoolStatus::is_open`] drives the lifecycle controller; the other
/// states are carried opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolStatus {
    /// Pool is being edited and has never been opened.
    Draft,
    /// Pool accepts workers.
    Open,
    /// Pool is stopped, either manually or on completion.
    Closed,
    /// Pool is archived and read-only.
    Archived,
    /// Pool is locked by the platform.
    Locked,
    /// A status this crate does not know about.
    #[serde(other)]
    Unknown,
}

impl PoolStatus {
    /// Returns true if the pool is accepting work.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns true if the pool is closed (and may be reopened).
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
