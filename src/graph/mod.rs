//! Entity graph
//!
//! Typed entities, merged relationship edges, dated activity records, and the
//! loader that builds one in-memory graph per batch run.

pub mod activity;
pub mod edge;
pub mod entity;
pub mod loader;
pub mod store;
pub mod types;

// Re-export main types
pub use activity::ActivityRecord;
pub use edge::{canonical_pair, MergedEdge, Relationship};
pub use entity::Entity;
pub use loader::{
    entity_from_row, GraphLoader, LoadError, LoadFilter, LoadResult, LoadStats, LoadedGraph,
};
pub use store::{EntityGraph, GraphError, GraphResult};
pub use types::{ActivityKind, ChunkId, DocumentId, EntityId, EntityKind, RelationshipType};
