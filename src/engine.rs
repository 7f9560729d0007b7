//! Analytics engine
//!
//! The batch entry point runs Loader, metrics and Snapshot Writer in order
//! against one freshly loaded graph. Path and temporal queries run
//! independently and never touch the snapshot.

use crate::algo::{compute_metrics, ComputeError};
use crate::config::{ConfigError, EngineConfig};
use crate::graph::{entity_from_row, Entity, EntityId, GraphLoader, LoadError, LoadFilter};
use crate::persistence::{
    list_snapshot, MetricSnapshot, RecordSource, SnapshotHeader, SnapshotPage, SnapshotQuery,
    SnapshotStore, WriteError,
};
use crate::query::{cluster_activities, PathFinder, PathOutcome, QueryError, QueryResult, TemporalReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fatal batch errors. None of them leave a partial snapshot behind.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Load failed: {0}")]
    Load(#[from] LoadError),

    #[error("Compute failed: {0}")]
    Compute(#[from] ComputeError),

    #[error("Write failed: {0}")]
    Write(#[from] WriteError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Per-run overrides of the configured compute settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeOptions {
    /// Compute everything but leave the persisted snapshot untouched
    pub dry_run: bool,
    pub pagerank_iterations: Option<u32>,
    pub betweenness_samples: Option<u32>,
    pub sample_seed: Option<u64>,
}

/// Outcome of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Id of the persisted run; `None` for a dry run
    pub run_id: Option<u64>,
    pub computed_at: DateTime<Utc>,
    pub entity_count: usize,
    pub edge_count: usize,
    pub cluster_count: usize,
    pub component_count: usize,
    /// Input rows dropped while loading
    pub skipped_rows: usize,
    pub dry_run: bool,
    pub elapsed_ms: u64,
}

/// Batch computation and queries over one record source and snapshot store
pub struct AnalyticsEngine<S: RecordSource, W: SnapshotStore> {
    source: Arc<S>,
    snapshots: Arc<W>,
    config: EngineConfig,
    filter: LoadFilter,
}

impl<S: RecordSource, W: SnapshotStore> AnalyticsEngine<S, W> {
    pub fn new(source: Arc<S>, snapshots: Arc<W>, config: EngineConfig) -> Self {
        Self {
            source,
            snapshots,
            config,
            filter: LoadFilter::default(),
        }
    }

    /// Restrict the node set of every load
    pub fn with_filter(mut self, filter: LoadFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Recompute every metric and, unless `dry_run`, replace the snapshot
    pub fn compute_all(
        &self,
        dry_run: bool,
        pagerank_iterations: u32,
        betweenness_samples: u32,
    ) -> EngineResult<RunSummary> {
        self.run(&ComputeOptions {
            dry_run,
            pagerank_iterations: Some(pagerank_iterations),
            betweenness_samples: Some(betweenness_samples),
            sample_seed: None,
        })
    }

    /// Batch run with optional overrides of the configured settings
    pub fn run(&self, options: &ComputeOptions) -> EngineResult<RunSummary> {
        let started = Instant::now();

        let mut config = self.config.clone();
        if let Some(iterations) = options.pagerank_iterations {
            config.compute.pagerank_iterations = iterations;
        }
        if let Some(samples) = options.betweenness_samples {
            config.compute.betweenness_samples = samples;
        }
        if options.sample_seed.is_some() {
            config.compute.sample_seed = options.sample_seed;
        }
        config.validate()?;

        info!(
            "Starting batch run (dry_run: {}, iterations: {}, samples: {})",
            options.dry_run, config.compute.pagerank_iterations, config.compute.betweenness_samples
        );

        let phase = Instant::now();
        let loaded = GraphLoader::new(self.source.as_ref())
            .with_filter(self.filter.clone())
            .load()?;
        info!("Load phase finished in {} ms", phase.elapsed().as_millis());

        let phase = Instant::now();
        let metrics = compute_metrics(&loaded.graph, &config.compute)?;
        info!("Compute phase finished in {} ms", phase.elapsed().as_millis());

        let computed_at = Utc::now();
        let mut summary = RunSummary {
            run_id: None,
            computed_at,
            entity_count: metrics.entity_count(),
            edge_count: metrics.edge_count,
            cluster_count: metrics.cluster_count,
            component_count: metrics.component_count,
            skipped_rows: loaded.stats.skipped_rows(),
            dry_run: options.dry_run,
            elapsed_ms: 0,
        };

        if options.dry_run {
            info!("Dry run: snapshot left unchanged");
        } else {
            let phase = Instant::now();
            // The store numbers the run under its write lock
            let snapshot = MetricSnapshot {
                header: SnapshotHeader {
                    run_id: 0,
                    computed_at,
                    entity_count: summary.entity_count as u64,
                    edge_count: summary.edge_count as u64,
                    cluster_count: summary.cluster_count as u64,
                },
                rows: metrics.to_rows(computed_at),
            };
            let run_id = match self.snapshots.replace_snapshot(&snapshot) {
                Ok(run_id) => run_id,
                Err(e) => {
                    warn!("Snapshot not written, previous snapshot kept: {}", e);
                    return Err(e.into());
                }
            };
            summary.run_id = Some(run_id);
            info!(
                "Write phase finished in {} ms (run {})",
                phase.elapsed().as_millis(),
                run_id
            );
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "Batch finished: {} entities, {} edges, {} clusters, {} rows skipped in {} ms",
            summary.entity_count,
            summary.edge_count,
            summary.cluster_count,
            summary.skipped_rows,
            summary.elapsed_ms
        );
        Ok(summary)
    }

    /// Header of the latest persisted run
    pub fn status(&self) -> QueryResult<Option<SnapshotHeader>> {
        Ok(self.snapshots.latest_header()?)
    }

    /// One page of the latest snapshot; `None` before the first run
    pub fn list_metrics(&self, query: &SnapshotQuery) -> QueryResult<Option<SnapshotPage>> {
        let Some(snapshot) = self.snapshots.latest_snapshot()? else {
            return Ok(None);
        };
        debug!(
            "Listing run {} ({} rows) sorted by {:?}",
            snapshot.header.run_id,
            snapshot.rows.len(),
            query.sort_by
        );
        Ok(Some(list_snapshot(snapshot.header, snapshot.rows, query)))
    }

    /// Look up one entity in the record source
    pub fn entity(&self, id: EntityId) -> QueryResult<Entity> {
        let row = self
            .source
            .entity_row(id)?
            .ok_or(QueryError::EntityNotFound(id))?;
        Ok(entity_from_row(row)?)
    }

    /// Shortest evidence path, reloading the graph for the query
    pub fn find_path(
        &self,
        source: EntityId,
        target: EntityId,
        max_depth: Option<usize>,
    ) -> QueryResult<PathOutcome> {
        let max_depth = max_depth.unwrap_or(self.config.query.default_max_depth);
        let loaded = GraphLoader::new(self.source.as_ref())
            .with_filter(self.filter.clone())
            .load()?;
        let outcome = PathFinder::new(&loaded.graph).find(source, target, max_depth)?;
        debug!(
            "Path {} -> {} (max depth {}): {}",
            source,
            target,
            max_depth,
            outcome.path().map_or("not found".to_string(), |p| format!("{} hops", p.hops()))
        );
        Ok(outcome)
    }

    /// Co-activity clusters of one entity
    pub fn temporal_clusters(
        &self,
        entity: EntityId,
        window_days: Option<u32>,
        max_results: Option<usize>,
    ) -> QueryResult<TemporalReport> {
        if self.source.entity_row(entity)?.is_none() {
            return Err(QueryError::EntityNotFound(entity));
        }
        let rows = self.source.activity_rows(entity)?;
        cluster_activities(
            entity,
            rows,
            window_days.unwrap_or(self.config.query.default_window_days),
            max_results.unwrap_or(self.config.query.default_max_results),
        )
    }
}
