//! PageRank algorithm implementation
//!
//! Weighted power iteration over the undirected view. Rank flows along each
//! edge in proportion to its weight; nodes without edges hand their rank back
//! to every node uniformly, so total rank mass stays at 1.0.

use super::common::{GraphView, NodeId};
use rayon::prelude::*;

/// PageRank configuration
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Damping factor (usually 0.85)
    pub damping_factor: f64,
    /// Number of iterations
    pub iterations: usize,
    /// Optional early stop on the L1 change between iterations.
    /// `None` runs exactly `iterations` rounds.
    pub tolerance: Option<f64>,
    /// Compute each node's pull in parallel
    pub parallel: bool,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.85,
            iterations: 20,
            tolerance: None,
            parallel: true,
        }
    }
}

/// PageRank scores by dense index
#[derive(Debug, Clone)]
pub struct PageRankResult {
    pub scores: Vec<f64>,
    /// Iterations actually performed
    pub iterations: usize,
}

impl PageRankResult {
    /// Score of a node by id
    pub fn score(&self, view: &GraphView, node: NodeId) -> Option<f64> {
        view.index_of(node).map(|idx| self.scores[idx])
    }
}

/// Calculate PageRank for the graph view
pub fn page_rank(view: &GraphView, config: &PageRankConfig) -> PageRankResult {
    let n = view.node_count;

    if n == 0 {
        return PageRankResult { scores: Vec::new(), iterations: 0 };
    }
    if n == 1 {
        return PageRankResult { scores: vec![1.0], iterations: 0 };
    }

    let uniform = 1.0 / n as f64;
    let d = config.damping_factor;
    let base_score = (1.0 - d) / n as f64;

    let weighted_degree: Vec<f64> = (0..n).map(|i| view.weighted_degree(i)).collect();

    let mut scores = vec![uniform; n];
    let mut next_scores = vec![0.0; n];
    let mut performed = 0;

    for _ in 0..config.iterations {
        let dangling_mass: f64 = (0..n)
            .filter(|&i| weighted_degree[i] <= 0.0)
            .map(|i| scores[i])
            .sum();
        let dangling_share = d * dangling_mass / n as f64;

        let pull = |i: usize| -> f64 {
            let sum_incoming: f64 = view
                .neighbors(i)
                .iter()
                .zip(view.weights(i))
                .map(|(&j, &w)| scores[j] * w / weighted_degree[j])
                .sum();
            base_score + dangling_share + d * sum_incoming
        };

        if config.parallel {
            next_scores.par_iter_mut().enumerate().for_each(|(i, slot)| *slot = pull(i));
        } else {
            for (i, slot) in next_scores.iter_mut().enumerate() {
                *slot = pull(i);
            }
        }

        let total_diff: f64 = scores
            .iter()
            .zip(&next_scores)
            .map(|(a, b)| (a - b).abs())
            .sum();

        // Swap buffers
        std::mem::swap(&mut scores, &mut next_scores);
        performed += 1;

        if let Some(tolerance) = config.tolerance {
            if total_diff < tolerance {
                break;
            }
        }
    }

    PageRankResult { scores, iterations: performed }
}
