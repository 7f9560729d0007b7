//! Pathfinding algorithms
//!
//! Depth-bounded breadth-first search over the undirected view.

use super::common::{GraphView, NodeId};
use std::collections::VecDeque;

/// Result of a pathfinding algorithm
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub source: NodeId,
    pub target: NodeId,
    /// Nodes from source to target inclusive
    pub path: Vec<NodeId>,
    /// Number of edges on the path
    pub hops: usize,
}

/// Breadth-First Search (Unweighted Shortest Path), at most `max_depth` hops.
///
/// Neighbors are expanded in ascending id order and the first discovery of a
/// node fixes its parent, so among several shortest paths the same one is
/// always returned. Returns `None` when either id is unknown or the target is
/// farther than `max_depth`.
pub fn bfs(view: &GraphView, source: NodeId, target: NodeId, max_depth: usize) -> Option<PathResult> {
    let source_idx = view.index_of(source)?;
    let target_idx = view.index_of(target)?;

    let mut parent: Vec<Option<usize>> = vec![None; view.node_count];
    let mut depth: Vec<usize> = vec![usize::MAX; view.node_count];
    let mut queue = VecDeque::new();

    depth[source_idx] = 0;
    queue.push_back(source_idx);

    while let Some(current_idx) = queue.pop_front() {
        if current_idx == target_idx {
            // Reconstruct path
            let mut path = Vec::with_capacity(depth[target_idx] + 1);
            let mut curr = Some(target_idx);
            while let Some(idx) = curr {
                path.push(view.index_to_node[idx]);
                curr = parent[idx];
            }
            path.reverse();
            return Some(PathResult {
                source,
                target,
                hops: path.len() - 1,
                path,
            });
        }

        if depth[current_idx] >= max_depth {
            continue;
        }

        for &next_idx in view.neighbors(current_idx) {
            if depth[next_idx] == usize::MAX {
                depth[next_idx] = depth[current_idx] + 1;
                parent[next_idx] = Some(current_idx);
                queue.push_back(next_idx);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> GraphView {
        // 1-2-3-4, plus isolated 9
        GraphView::from_edges(&[1, 2, 3, 4, 9], &[(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)])
    }

    #[test]
    fn test_bfs() {
        let view = line();
        let result = bfs(&view, 1, 3, 6).unwrap();
        assert_eq!(result.path, vec![1, 2, 3]);
        assert_eq!(result.hops, 2);
    }

    #[test]
    fn test_bfs_same_node() {
        let view = line();
        let result = bfs(&view, 2, 2, 0).unwrap();
        assert_eq!(result.path, vec![2]);
        assert_eq!(result.hops, 0);
    }

    #[test]
    fn test_bfs_depth_bound() {
        let view = line();
        assert!(bfs(&view, 1, 2, 0).is_none());
        assert!(bfs(&view, 1, 2, 1).is_some());
        assert!(bfs(&view, 1, 4, 2).is_none());
        assert_eq!(bfs(&view, 1, 4, 3).unwrap().hops, 3);
    }

    #[test]
    fn test_bfs_disconnected() {
        let view = line();
        assert!(bfs(&view, 1, 9, 100).is_none());
        assert!(bfs(&view, 1, 77, 100).is_none());
    }

    #[test]
    fn test_bfs_prefers_lowest_ids() {
        // Two routes 1-3-5 and 1-2-5
        let view = GraphView::from_edges(
            &[1, 2, 3, 5],
            &[(1, 3, 1.0), (3, 5, 1.0), (1, 2, 1.0), (2, 5, 1.0)],
        );
        assert_eq!(bfs(&view, 1, 5, 6).unwrap().path, vec![1, 2, 5]);
    }
}
