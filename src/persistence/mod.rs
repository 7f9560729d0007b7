//! Persistence layer for Corpusgraph
//!
//! The engine reads source records through [`RecordSource`] and persists
//! metric snapshots through [`SnapshotStore`]. Two implementations ship:
//! - [`RocksStore`]: RocksDB column families, atomic snapshot swap via one
//!   `WriteBatch`
//! - [`MemoryStore`]: in-process tables for tests and embedding

pub mod dataset;
pub mod memory;
pub mod records;
pub mod snapshot;
pub mod storage;

pub use dataset::{Dataset, ImportStats};
pub use memory::MemoryStore;
pub use records::{ActivityRow, EntityRow, MentionRow, RelationshipRow};
pub use snapshot::{
    list_snapshot, MetricSnapshot, NetworkMetricRow, SnapshotHeader, SnapshotPage, SnapshotQuery,
    SortField,
};
pub use storage::RocksStore;

use crate::graph::EntityId;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Column family error
    #[error("Column family error: {0}")]
    ColumnFamily(String),

    /// Store cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Snapshot persistence failure. The previously persisted snapshot stays
/// authoritative whenever this is returned.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Snapshot write failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Snapshot rejected: {0}")]
    Rejected(String),
}

pub type WriteResult<T> = Result<T, WriteError>;

/// Read access to entities, relationships, mentions and activities
pub trait RecordSource: Send + Sync {
    /// Every row of the entity table
    fn entity_rows(&self) -> StorageResult<Vec<EntityRow>>;

    /// One entity row by id
    fn entity_row(&self, id: EntityId) -> StorageResult<Option<EntityRow>>;

    /// Every row of the relationship table
    fn relationship_rows(&self) -> StorageResult<Vec<RelationshipRow>>;

    /// Every (entity, chunk) mention
    fn mention_rows(&self) -> StorageResult<Vec<MentionRow>>;

    /// Activity rows of all kinds that list `entity` among their participants
    fn activity_rows(&self, entity: EntityId) -> StorageResult<Vec<ActivityRow>>;

    /// Entity, relationship and mention tables as of one point in time.
    /// Stores that can change underneath a load override this.
    fn graph_tables(&self) -> StorageResult<GraphTables> {
        Ok(GraphTables {
            entities: self.entity_rows()?,
            relationships: self.relationship_rows()?,
            mentions: self.mention_rows()?,
        })
    }
}

/// The tables a graph load reads
#[derive(Debug, Clone, Default)]
pub struct GraphTables {
    pub entities: Vec<EntityRow>,
    pub relationships: Vec<RelationshipRow>,
    pub mentions: Vec<MentionRow>,
}

/// Persisted metric snapshots
pub trait SnapshotStore: Send + Sync {
    /// Replace the latest snapshot with `snapshot` as one unit and return the
    /// run id it was stored under. The store assigns the id (one past the
    /// previous run) while holding its write lock; `snapshot.header.run_id`
    /// is ignored. On error readers keep seeing the previous snapshot.
    fn replace_snapshot(&self, snapshot: &MetricSnapshot) -> WriteResult<u64>;

    /// Header of the latest snapshot
    fn latest_header(&self) -> StorageResult<Option<SnapshotHeader>>;

    /// Header and rows of the latest snapshot, read consistently
    fn latest_snapshot(&self) -> StorageResult<Option<MetricSnapshot>>;
}
