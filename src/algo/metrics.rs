//! Batch metrics: degree, PageRank, betweenness, clusters
//!
//! All four run against one [`GraphView`] projected from the loaded graph, so
//! every score vector is indexed the same way (ascending entity id).

use super::{
    betweenness_sampled, degree_centrality, label_propagation, page_rank,
    weakly_connected_components, BetweennessConfig, GraphView, LabelPropagationConfig,
    PageRankConfig,
};
use crate::config::ComputeConfig;
use crate::graph::{EntityGraph, EntityId};
use crate::persistence::NetworkMetricRow;
use chrono::{DateTime, Utc};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Tolerance on the PageRank mass check
const MASS_TOLERANCE: f64 = 1e-6;

/// Errors from metric computation; fatal to a batch run
#[derive(Error, Debug, PartialEq)]
pub enum ComputeError {
    #[error("Non-finite {metric} for entity {entity}")]
    NonFinite { metric: &'static str, entity: EntityId },

    #[error("PageRank mass {0} differs from 1.0")]
    MassNotConserved(f64),
}

pub type ComputeResult<T> = Result<T, ComputeError>;

/// Metrics of one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityMetrics {
    pub entity_id: EntityId,
    pub degree: usize,
    pub pagerank: f64,
    pub betweenness: f64,
    pub cluster_id: usize,
}

/// Metrics of every entity, indexed by the view's dense order
#[derive(Debug, Clone)]
pub struct GraphMetrics {
    pub entity_ids: Vec<EntityId>,
    pub degree: Vec<usize>,
    pub pagerank: Vec<f64>,
    pub betweenness: Vec<f64>,
    pub cluster: Vec<usize>,
    pub cluster_count: usize,
    pub component_count: usize,
    pub edge_count: usize,
    pub pagerank_iterations: usize,
    pub betweenness_sources: usize,
    pub label_passes: usize,
    pub labels_converged: bool,
}

impl GraphMetrics {
    pub fn entity_count(&self) -> usize {
        self.entity_ids.len()
    }

    /// Metrics of one entity
    pub fn get(&self, entity: EntityId) -> Option<EntityMetrics> {
        let idx = self.entity_ids.binary_search(&entity).ok()?;
        Some(self.at(idx))
    }

    fn at(&self, idx: usize) -> EntityMetrics {
        EntityMetrics {
            entity_id: self.entity_ids[idx],
            degree: self.degree[idx],
            pagerank: self.pagerank[idx],
            betweenness: self.betweenness[idx],
            cluster_id: self.cluster[idx],
        }
    }

    /// Iterate in ascending entity id
    pub fn iter(&self) -> impl Iterator<Item = EntityMetrics> + '_ {
        (0..self.entity_ids.len()).map(|idx| self.at(idx))
    }

    /// Snapshot rows stamped with one timestamp
    pub fn to_rows(&self, computed_at: DateTime<Utc>) -> Vec<NetworkMetricRow> {
        self.iter()
            .map(|m| NetworkMetricRow {
                entity_id: m.entity_id,
                degree: m.degree as u64,
                pagerank: m.pagerank,
                betweenness: m.betweenness,
                cluster_id: m.cluster_id as u64,
                computed_at,
            })
            .collect()
    }
}

/// Run every batch metric over `graph`
pub fn compute_metrics(graph: &EntityGraph, config: &ComputeConfig) -> ComputeResult<GraphMetrics> {
    let view = graph.view();
    compute_view_metrics(&view, config)
}

/// Run every batch metric over a prepared view
pub fn compute_view_metrics(view: &GraphView, config: &ComputeConfig) -> ComputeResult<GraphMetrics> {
    let entity_ids: Vec<EntityId> = view.index_to_node.iter().copied().map(EntityId::new).collect();

    let started = Instant::now();
    let degree = degree_centrality(view);
    debug!("Degree computed in {} ms", started.elapsed().as_millis());

    let started = Instant::now();
    let pagerank = page_rank(
        view,
        &PageRankConfig {
            damping_factor: config.damping_factor,
            iterations: config.pagerank_iterations as usize,
            tolerance: config.pagerank_tolerance,
            parallel: config.parallel,
        },
    );
    info!(
        "PageRank: {} iterations in {} ms",
        pagerank.iterations,
        started.elapsed().as_millis()
    );
    check_finite("pagerank", &pagerank.scores, &entity_ids)?;
    if !pagerank.scores.is_empty() {
        let mass: f64 = pagerank.scores.iter().sum();
        if (mass - 1.0).abs() > MASS_TOLERANCE {
            return Err(ComputeError::MassNotConserved(mass));
        }
    }

    let started = Instant::now();
    let betweenness = betweenness_sampled(
        view,
        &BetweennessConfig {
            samples: config.betweenness_samples as usize,
            seed: config.sample_seed,
            parallel: config.parallel,
        },
    );
    info!(
        "Betweenness: {} sources (scale {:.3}) in {} ms",
        betweenness.sources.len(),
        betweenness.scale,
        started.elapsed().as_millis()
    );
    check_finite("betweenness", &betweenness.scores, &entity_ids)?;

    let started = Instant::now();
    let communities = label_propagation(
        view,
        &LabelPropagationConfig {
            max_passes: config.max_label_passes as usize,
        },
    );
    let components = weakly_connected_components(view);
    info!(
        "Communities: {} clusters, {} components, {} passes (converged: {}) in {} ms",
        communities.cluster_count,
        components.components.len(),
        communities.passes,
        communities.converged,
        started.elapsed().as_millis()
    );

    Ok(GraphMetrics {
        entity_ids,
        degree,
        pagerank: pagerank.scores,
        betweenness: betweenness.scores,
        cluster: communities.labels,
        cluster_count: communities.cluster_count,
        component_count: components.components.len(),
        edge_count: view.edge_count(),
        pagerank_iterations: pagerank.iterations,
        betweenness_sources: betweenness.sources.len(),
        label_passes: communities.passes,
        labels_converged: communities.converged,
    })
}

fn check_finite(metric: &'static str, scores: &[f64], ids: &[EntityId]) -> ComputeResult<()> {
    match scores.iter().position(|s| !s.is_finite()) {
        Some(idx) => Err(ComputeError::NonFinite {
            metric,
            entity: ids[idx],
        }),
        None => Ok(()),
    }
}
