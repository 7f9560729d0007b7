//! Corpusgraph
//!
//! Entity relationship graph analytics over a document corpus: builds a
//! weighted graph from extracted entities, relationship rows and chunk
//! co-occurrences, derives network metrics in batch, and answers path and
//! temporal co-activity queries.
//!
//! # Architecture
//!
//! - `graph`: typed records and the in-memory entity graph, plus the loader
//!   that builds it from a [`RecordSource`]
//! - `algo`: degree, PageRank, sampled betweenness and label propagation
//!   (kernels in the `corpusgraph-algorithms` crate)
//! - `persistence`: RocksDB and in-memory stores; snapshots are replaced as
//!   a unit
//! - `query`: evidence paths and temporal clusters
//! - `engine`: the batch run and query facade
//!
//! # Example
//!
//! ```no_run
//! use corpusgraph::{AnalyticsEngine, EngineConfig, RocksStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(RocksStore::open("./corpusgraph_data").unwrap());
//! let engine = AnalyticsEngine::new(store.clone(), store, EngineConfig::default());
//! let summary = engine.compute_all(false, 20, 200).unwrap();
//! println!("{} entities in {} clusters", summary.entity_count, summary.cluster_count);
//! ```

pub mod algo;
pub mod config;
pub mod engine;
pub mod graph;
pub mod persistence;
pub mod query;

// Re-export main types for convenience
pub use graph::{
    ActivityKind, ActivityRecord, DocumentId, Entity, EntityGraph, EntityId, EntityKind,
    GraphLoader, LoadError, LoadFilter, LoadStats, MergedEdge, Relationship, RelationshipType,
};

pub use algo::{compute_metrics, ComputeError, GraphMetrics};

pub use config::{ComputeConfig, ConfigError, EngineConfig, QueryConfig, StorageConfig};

pub use persistence::{
    Dataset, GraphTables, ImportStats, MemoryStore, MetricSnapshot, NetworkMetricRow, RecordSource,
    RocksStore, SnapshotHeader, SnapshotPage, SnapshotQuery, SnapshotStore, SortField,
    StorageError, StorageResult, WriteError,
};

pub use query::{
    ActivityCluster, EntityPath, KindGroup, PathOutcome, PathStep, QueryError, QueryResult,
    TemporalReport,
};

pub use engine::{AnalyticsEngine, ComputeOptions, EngineError, EngineResult, RunSummary};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
