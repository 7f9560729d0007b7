//! Degree and betweenness centrality
//!
//! Betweenness uses Brandes' dependency accumulation over hop distance. The
//! sampled variant runs the accumulation from a random subset of sources and
//! scales the sum by `N / samples`, which is an unbiased estimate of the full
//! value. Scores count ordered `(s, t)` pairs and are not normalized.

use super::common::GraphView;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::VecDeque;

/// Degree of every node by dense index
pub fn degree_centrality(view: &GraphView) -> Vec<usize> {
    (0..view.node_count).map(|i| view.degree(i)).collect()
}

/// Sampled betweenness configuration
#[derive(Debug, Clone)]
pub struct BetweennessConfig {
    /// Number of source nodes to sample
    pub samples: usize,
    /// Seed for source selection; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Accumulate sources in parallel
    pub parallel: bool,
}

impl Default for BetweennessConfig {
    fn default() -> Self {
        Self {
            samples: 200,
            seed: None,
            parallel: true,
        }
    }
}

/// Betweenness scores by dense index
#[derive(Debug, Clone)]
pub struct BetweennessResult {
    pub scores: Vec<f64>,
    /// Sources the accumulation ran from, ascending (may repeat when sampled
    /// with replacement)
    pub sources: Vec<usize>,
    /// Factor applied to the raw sums
    pub scale: f64,
}

/// Exact betweenness: Brandes from every node
pub fn betweenness_exact(view: &GraphView, parallel: bool) -> BetweennessResult {
    let sources: Vec<usize> = (0..view.node_count).collect();
    let scores = accumulate(view, &sources, parallel);
    BetweennessResult { scores, sources, scale: 1.0 }
}

/// Approximate betweenness from sampled sources.
///
/// Fewer samples than nodes draws without replacement, more samples than
/// nodes draws with replacement, and exactly `N` samples uses every node once.
pub fn betweenness_sampled(view: &GraphView, config: &BetweennessConfig) -> BetweennessResult {
    let n = view.node_count;
    if n < 2 || config.samples == 0 || view.edge_count() == 0 {
        return BetweennessResult {
            scores: vec![0.0; n],
            sources: Vec::new(),
            scale: 1.0,
        };
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut sources: Vec<usize> = if config.samples < n {
        index::sample(&mut rng, n, config.samples).into_vec()
    } else if config.samples == n {
        (0..n).collect()
    } else {
        (0..config.samples).map(|_| rng.gen_range(0..n)).collect()
    };
    sources.sort_unstable();

    let scale = n as f64 / sources.len() as f64;
    let mut scores = accumulate(view, &sources, config.parallel);
    for score in scores.iter_mut() {
        *score *= scale;
    }

    BetweennessResult { scores, sources, scale }
}

/// Sum Brandes dependencies from each source. Parallel runs keep one
/// accumulator per worker and add them together at the end.
fn accumulate(view: &GraphView, sources: &[usize], parallel: bool) -> Vec<f64> {
    let n = view.node_count;
    if parallel {
        sources
            .par_iter()
            .fold(
                || (vec![0.0; n], BrandesScratch::new(n)),
                |(mut acc, mut scratch), &s| {
                    scratch.run(view, s, &mut acc);
                    (acc, scratch)
                },
            )
            .map(|(acc, _)| acc)
            .reduce(
                || vec![0.0; n],
                |mut a, b| {
                    for (x, y) in a.iter_mut().zip(b) {
                        *x += y;
                    }
                    a
                },
            )
    } else {
        let mut acc = vec![0.0; n];
        let mut scratch = BrandesScratch::new(n);
        for &s in sources {
            scratch.run(view, s, &mut acc);
        }
        acc
    }
}

/// Reusable per-source buffers
struct BrandesScratch {
    stack: Vec<usize>,
    queue: VecDeque<usize>,
    pred: Vec<Vec<usize>>,
    sigma: Vec<f64>,
    dist: Vec<i64>,
    delta: Vec<f64>,
}

impl BrandesScratch {
    fn new(n: usize) -> Self {
        Self {
            stack: Vec::with_capacity(n),
            queue: VecDeque::with_capacity(n),
            pred: vec![Vec::new(); n],
            sigma: vec![0.0; n],
            dist: vec![-1; n],
            delta: vec![0.0; n],
        }
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.queue.clear();
        for p in self.pred.iter_mut() {
            p.clear();
        }
        self.sigma.fill(0.0);
        self.dist.fill(-1);
        self.delta.fill(0.0);
    }

    /// Single-source shortest paths from `s`, then back-propagate
    /// dependencies into `acc`.
    fn run(&mut self, view: &GraphView, s: usize, acc: &mut [f64]) {
        self.reset();
        self.sigma[s] = 1.0;
        self.dist[s] = 0;
        self.queue.push_back(s);

        while let Some(v) = self.queue.pop_front() {
            self.stack.push(v);
            let d_v = self.dist[v];
            for &w in view.neighbors(v) {
                if self.dist[w] < 0 {
                    self.dist[w] = d_v + 1;
                    self.queue.push_back(w);
                }
                if self.dist[w] == d_v + 1 {
                    self.sigma[w] += self.sigma[v];
                    self.pred[w].push(v);
                }
            }
        }

        while let Some(w) = self.stack.pop() {
            let coeff = (1.0 + self.delta[w]) / self.sigma[w];
            for i in 0..self.pred[w].len() {
                let v = self.pred[w][i];
                self.delta[v] += self.sigma[v] * coeff;
            }
            if w != s {
                acc[w] += self.delta[w];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star() -> GraphView {
        // 1 is the hub of 2, 3, 4
        GraphView::from_edges(&[1, 2, 3, 4], &[(1, 2, 1.0), (1, 3, 1.0), (1, 4, 1.0)])
    }

    #[test]
    fn test_degree() {
        let view = star();
        assert_eq!(degree_centrality(&view), vec![3, 1, 1, 1]);
    }

    #[test]
    fn test_exact_star() {
        let view = star();
        let result = betweenness_exact(&view, false);
        // 3 leaves, 6 ordered leaf pairs, all through the hub
        assert_eq!(result.scores, vec![6.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_exact_splits_equal_paths() {
        // Square 1-2-4, 1-3-4: two shortest paths between 1 and 4
        let view = GraphView::from_edges(
            &[1, 2, 3, 4],
            &[(1, 2, 1.0), (2, 4, 1.0), (1, 3, 1.0), (3, 4, 1.0)],
        );
        let result = betweenness_exact(&view, false);
        // Each node lies on one of two shortest paths between its neighbors,
        // counted once per direction
        for score in result.scores {
            assert!((score - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sampled_all_nodes_equals_exact() {
        let view = GraphView::from_edges(
            &[1, 2, 3, 4, 5, 6],
            &[(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0), (4, 5, 1.0), (2, 6, 1.0)],
        );
        let exact = betweenness_exact(&view, false);
        let config = BetweennessConfig { samples: 6, seed: Some(7), parallel: true };
        let sampled = betweenness_sampled(&view, &config);
        assert_eq!(sampled.scale, 1.0);
        for (a, b) in exact.scores.iter().zip(&sampled.scores) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sampled_with_replacement_scales() {
        let view = star();
        let config = BetweennessConfig { samples: 8, seed: Some(1), parallel: false };
        let result = betweenness_sampled(&view, &config);
        assert_eq!(result.sources.len(), 8);
        assert!((result.scale - 0.5).abs() < 1e-12);
        // Leaves never sit between two other nodes
        assert!(result.scores[1..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_sampled_is_reproducible_with_seed() {
        let view = GraphView::from_edges(
            &(1..=20).collect::<Vec<_>>(),
            &(1..20).map(|i| (i, i + 1, 1.0)).collect::<Vec<_>>(),
        );
        let config = BetweennessConfig { samples: 5, seed: Some(99), parallel: true };
        let a = betweenness_sampled(&view, &config);
        let b = betweenness_sampled(&view, &config);
        assert_eq!(a.sources, b.sources);
        for (x, y) in a.scores.iter().zip(&b.scores) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_no_edges_is_zero() {
        let view = GraphView::from_edges(&[1, 2, 3], &[]);
        let result = betweenness_sampled(&view, &BetweennessConfig::default());
        assert_eq!(result.scores, vec![0.0; 3]);
    }
}
