//! Community detection algorithms
//!
//! Label propagation for cluster assignment, and Weakly Connected Components
//! for counting disjoint subgraphs.

use super::common::{GraphView, NodeId};
use std::collections::HashMap;

/// Label propagation configuration
#[derive(Debug, Clone)]
pub struct LabelPropagationConfig {
    /// Upper bound on full passes over the nodes
    pub max_passes: usize,
}

impl Default for LabelPropagationConfig {
    fn default() -> Self {
        Self { max_passes: 20 }
    }
}

/// Result of label propagation
#[derive(Debug, Clone)]
pub struct CommunityResult {
    /// Cluster id by dense index, compacted to 0..cluster_count
    pub labels: Vec<usize>,
    /// Number of distinct clusters
    pub cluster_count: usize,
    /// Passes performed
    pub passes: usize,
    /// True when the last pass changed no label
    pub converged: bool,
}

impl CommunityResult {
    /// Cluster id of a node by id
    pub fn cluster_of(&self, view: &GraphView, node: NodeId) -> Option<usize> {
        view.index_of(node).map(|idx| self.labels[idx])
    }
}

/// Label propagation
///
/// Every node starts in its own cluster (label = dense index). Each pass walks
/// the nodes in index order and moves each one to the label carrying the most
/// edge weight among its neighbors, lowest label on ties. Updates apply
/// immediately, so later nodes in the same pass see them. Stops after a pass
/// with no change or after `max_passes`.
///
/// Labels only travel along edges, so separate components never share one.
pub fn label_propagation(view: &GraphView, config: &LabelPropagationConfig) -> CommunityResult {
    let n = view.node_count;
    let mut labels: Vec<usize> = (0..n).collect();
    let mut passes = 0;
    let mut converged = n == 0;
    let mut tally: HashMap<usize, f64> = HashMap::new();

    while passes < config.max_passes {
        passes += 1;
        let mut changed = false;

        for u in 0..n {
            if view.degree(u) == 0 {
                continue;
            }

            tally.clear();
            for (&v, &w) in view.neighbors(u).iter().zip(view.weights(u)) {
                *tally.entry(labels[v]).or_insert(0.0) += w;
            }

            let best = tally
                .iter()
                .fold(None, |best: Option<(usize, f64)>, (&label, &weight)| match best {
                    Some((b_label, b_weight))
                        if b_weight > weight || (b_weight == weight && b_label < label) =>
                    {
                        Some((b_label, b_weight))
                    }
                    _ => Some((label, weight)),
                });

            if let Some((label, _)) = best {
                if labels[u] != label {
                    labels[u] = label;
                    changed = true;
                }
            }
        }

        if !changed {
            converged = true;
            break;
        }
    }

    let (labels, cluster_count) = compact_labels(&labels);
    CommunityResult {
        labels,
        cluster_count,
        passes,
        converged,
    }
}

/// Renumber labels 0..k in order of first appearance by index
fn compact_labels(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    let compacted = labels
        .iter()
        .map(|label| {
            let next = remap.len();
            *remap.entry(*label).or_insert(next)
        })
        .collect();
    (compacted, remap.len())
}

/// Result of WCC algorithm
pub struct WccResult {
    /// Map of Component ID -> List of NodeIds
    pub components: HashMap<usize, Vec<NodeId>>,
    /// Map of NodeId -> Component ID
    pub node_component: HashMap<NodeId, usize>,
}

/// Union-Find data structure
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = i;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root; // Path compression
            cur = next;
        }
        root
    }

    fn union(&mut self, i: usize, j: usize) {
        let root_i = self.find(i);
        let root_j = self.find(j);

        if root_i != root_j {
            if self.rank[root_i] < self.rank[root_j] {
                self.parent[root_i] = root_j;
            } else if self.rank[root_i] > self.rank[root_j] {
                self.parent[root_j] = root_i;
            } else {
                self.parent[root_j] = root_i;
                self.rank[root_i] += 1;
            }
        }
    }
}

/// Weakly Connected Components (WCC)
///
/// Finds all disjoint subgraphs in the graph.
pub fn weakly_connected_components(view: &GraphView) -> WccResult {
    let n = view.node_count;
    let mut uf = UnionFind::new(n);

    for u_idx in 0..n {
        for &v_idx in view.neighbors(u_idx) {
            uf.union(u_idx, v_idx);
        }
    }

    let mut components = HashMap::new();
    let mut node_component = HashMap::new();

    for i in 0..n {
        let root = uf.find(i);
        let node_id = view.index_to_node[i];

        components.entry(root).or_insert_with(Vec::new).push(node_id);
        node_component.insert(node_id, root);
    }

    WccResult {
        components,
        node_component,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn two_triangles_and_isolate() -> GraphView {
        // {1,2,3} and {4,5,6} are triangles, joined by nothing; 7 is isolated
        GraphView::from_edges(
            &[1, 2, 3, 4, 5, 6, 7],
            &[
                (1, 2, 1.0), (2, 3, 1.0), (1, 3, 1.0),
                (4, 5, 1.0), (5, 6, 1.0), (4, 6, 1.0),
            ],
        )
    }

    fn partition(view: &GraphView, result: &CommunityResult) -> BTreeSet<BTreeSet<NodeId>> {
        let mut groups: HashMap<usize, BTreeSet<NodeId>> = HashMap::new();
        for (idx, &label) in result.labels.iter().enumerate() {
            groups.entry(label).or_default().insert(view.index_to_node[idx]);
        }
        groups.into_values().collect()
    }

    #[test]
    fn test_label_propagation_components_stay_apart() {
        let view = two_triangles_and_isolate();
        let result = label_propagation(&view, &LabelPropagationConfig::default());

        assert!(result.converged);
        assert_eq!(result.cluster_count, 3);
        let a = result.cluster_of(&view, 1).unwrap();
        assert_eq!(result.cluster_of(&view, 2), Some(a));
        assert_eq!(result.cluster_of(&view, 3), Some(a));
        let b = result.cluster_of(&view, 4).unwrap();
        assert_ne!(a, b);
        assert_eq!(result.cluster_of(&view, 6), Some(b));
        let c = result.cluster_of(&view, 7).unwrap();
        assert_ne!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn test_label_propagation_is_repeatable() {
        let view = GraphView::from_edges(
            &[1, 2, 3, 4, 5, 6, 7, 8],
            &[
                (1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0), (4, 1, 1.0),
                (4, 5, 0.5), (5, 6, 1.0), (6, 7, 1.0), (7, 8, 1.0), (8, 5, 1.0),
            ],
        );
        let config = LabelPropagationConfig { max_passes: 20 };
        let first = label_propagation(&view, &config);
        let second = label_propagation(&view, &config);
        assert_eq!(partition(&view, &first), partition(&view, &second));
    }

    #[test]
    fn test_label_propagation_respects_weights() {
        // 2 is pulled between 1 (weight 5) and 3 (weight 1)
        let view = GraphView::from_edges(&[1, 2, 3], &[(1, 2, 5.0), (2, 3, 1.0)]);
        let result = label_propagation(&view, &LabelPropagationConfig::default());
        assert_eq!(result.cluster_of(&view, 1), result.cluster_of(&view, 2));
    }

    #[test]
    fn test_label_propagation_zero_passes_keeps_singletons() {
        let view = two_triangles_and_isolate();
        let result = label_propagation(&view, &LabelPropagationConfig { max_passes: 0 });
        assert_eq!(result.cluster_count, 7);
        assert!(!result.converged);
    }

    #[test]
    fn test_wcc() {
        let view = two_triangles_and_isolate();
        let result = weakly_connected_components(&view);

        assert_eq!(result.components.len(), 3);
        let c1 = result.node_component[&1];
        assert_eq!(result.node_component[&3], c1);
        assert_ne!(result.node_component[&4], c1);
        assert_ne!(result.node_component[&7], c1);
    }
}
