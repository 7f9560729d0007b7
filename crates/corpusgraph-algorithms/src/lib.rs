pub mod common;
pub mod pagerank;
pub mod centrality;
pub mod community;
pub mod pathfinding;

pub use common::{GraphView, NodeId};
pub use pagerank::{page_rank, PageRankConfig, PageRankResult};
pub use centrality::{
    betweenness_exact, betweenness_sampled, degree_centrality, BetweennessConfig,
    BetweennessResult,
};
pub use community::{
    label_propagation, weakly_connected_components, CommunityResult, LabelPropagationConfig,
    WccResult,
};
pub use pathfinding::{bfs, PathResult};
