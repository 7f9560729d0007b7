//! Graph algorithms module
//!
//! Kernels live in the `corpusgraph-algorithms` crate and run over a dense
//! [`GraphView`]. This module is the adapter layer: it projects an
//! [`EntityGraph`](crate::graph::EntityGraph) into a view, runs the batch
//! metrics and maps results back to entity ids.

pub mod metrics;

// Re-export algorithms
pub use corpusgraph_algorithms::{
    betweenness_exact, betweenness_sampled, bfs, degree_centrality, label_propagation, page_rank,
    weakly_connected_components, BetweennessConfig, BetweennessResult, CommunityResult, GraphView,
    LabelPropagationConfig, PageRankConfig, PageRankResult, PathResult, WccResult,
};

pub use metrics::{compute_metrics, ComputeError, ComputeResult, EntityMetrics, GraphMetrics};
