//! Shared utilities for graph algorithms
//!
//! Provides a read-only, optimized view of the graph topology for algorithm execution.

use std::collections::HashMap;

/// Node Identifier type (u64)
pub type NodeId = u64;

/// A dense, integer-indexed view of an undirected weighted graph in
/// Compressed Sparse Row (CSR) format.
///
/// Every undirected edge `{u, v}` is stored twice, once in the row of `u` and
/// once in the row of `v`. Dense indices follow ascending [`NodeId`] order and
/// each row is sorted by neighbor index, so iterating a row visits neighbors in
/// ascending id order.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,

    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbor indices
    pub targets: Vec<usize>,
    /// Edge weights, aligned with `targets`
    pub weights: Vec<f64>,
}

impl GraphView {
    /// Build a view from a node set and a list of undirected weighted edges.
    ///
    /// Duplicate node ids collapse. Edges are canonicalized so `(a, b)` and
    /// `(b, a)` accumulate into one edge; self loops and edges touching an
    /// unknown node are ignored.
    pub fn from_edges(nodes: &[NodeId], edges: &[(NodeId, NodeId, f64)]) -> Self {
        let mut index_to_node = nodes.to_vec();
        index_to_node.sort_unstable();
        index_to_node.dedup();

        let node_count = index_to_node.len();
        let node_to_index: HashMap<NodeId, usize> = index_to_node
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        let mut merged: HashMap<(usize, usize), f64> = HashMap::with_capacity(edges.len());
        for &(a, b, w) in edges {
            if a == b {
                continue;
            }
            let (Some(&ia), Some(&ib)) = (node_to_index.get(&a), node_to_index.get(&b)) else {
                continue;
            };
            let key = if ia < ib { (ia, ib) } else { (ib, ia) };
            *merged.entry(key).or_insert(0.0) += w;
        }

        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); node_count];
        for ((u, v), w) in merged {
            rows[u].push((v, w));
            rows[v].push((u, w));
        }

        Self::from_rows(index_to_node, node_to_index, rows)
    }

    fn from_rows(
        index_to_node: Vec<NodeId>,
        node_to_index: HashMap<NodeId, usize>,
        rows: Vec<Vec<(usize, f64)>>,
    ) -> Self {
        let node_count = index_to_node.len();
        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();
        let mut weights = Vec::new();

        offsets.push(0);
        for mut row in rows {
            row.sort_unstable_by_key(|&(v, _)| v);
            for (v, w) in row {
                targets.push(v);
                weights.push(w);
            }
            offsets.push(targets.len());
        }

        GraphView {
            node_count,
            index_to_node,
            node_to_index,
            offsets,
            targets,
            weights,
        }
    }

    /// Number of distinct neighbors of a node (by index)
    pub fn degree(&self, idx: usize) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Neighbors of a node, ascending by index
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.targets[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Weights of a node's edges, aligned with [`GraphView::neighbors`]
    pub fn weights(&self, idx: usize) -> &[f64] {
        &self.weights[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Sum of a node's edge weights
    pub fn weighted_degree(&self, idx: usize) -> f64 {
        self.weights(idx).iter().sum()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Dense index of a node id
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.node_to_index.get(&node).copied()
    }
}
