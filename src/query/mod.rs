//! On-demand graph queries
//!
//! Shortest evidence paths between two entities and temporal co-activity
//! clusters around one entity. Both are read-only and safe to call
//! concurrently.

pub mod path;
pub mod temporal;

pub use path::{EntityPath, PathFinder, PathOutcome, PathStep};
pub use temporal::{cluster_activities, ActivityCluster, KindGroup, TemporalReport};

use crate::graph::{EntityId, LoadError};
use crate::persistence::StorageError;
use thiserror::Error;

/// Query errors. None of them affect the engine or the persisted snapshot.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type QueryResult<T> = Result<T, QueryError>;
