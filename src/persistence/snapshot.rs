//! Network metric snapshot rows and listing
//!
//! A snapshot is every entity's metrics from one batch run. Stores replace
//! it as a unit; [`list_snapshot`] filters, sorts and pages the latest one.

use crate::graph::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Metrics of one entity in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetricRow {
    pub entity_id: EntityId,
    pub degree: u64,
    pub pagerank: f64,
    /// Sample-based estimate, not normalized
    pub betweenness: f64,
    /// Only meaningful within this run
    pub cluster_id: u64,
    pub computed_at: DateTime<Utc>,
}

/// Identity and totals of a persisted run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub run_id: u64,
    pub computed_at: DateTime<Utc>,
    pub entity_count: u64,
    pub edge_count: u64,
    pub cluster_count: u64,
}

/// A complete run, written or rejected as a whole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub header: SnapshotHeader,
    pub rows: Vec<NetworkMetricRow>,
}

/// Field to sort a listing by (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Degree,
    #[default]
    Pagerank,
    Betweenness,
    ClusterId,
}

/// Listing filter and page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotQuery {
    pub min_degree: Option<u64>,
    pub cluster_id: Option<u64>,
    pub sort_by: SortField,
    pub limit: usize,
    pub offset: usize,
}

impl Default for SnapshotQuery {
    fn default() -> Self {
        Self {
            min_degree: None,
            cluster_id: None,
            sort_by: SortField::Pagerank,
            limit: 50,
            offset: 0,
        }
    }
}

/// One page of the latest snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPage {
    pub header: SnapshotHeader,
    /// Rows matching the filter before paging
    pub total: usize,
    pub rows: Vec<NetworkMetricRow>,
}

fn compare_desc(field: SortField, a: &NetworkMetricRow, b: &NetworkMetricRow) -> Ordering {
    let primary = match field {
        SortField::Degree => b.degree.cmp(&a.degree),
        SortField::Pagerank => b.pagerank.total_cmp(&a.pagerank),
        SortField::Betweenness => b.betweenness.total_cmp(&a.betweenness),
        SortField::ClusterId => b.cluster_id.cmp(&a.cluster_id),
    };
    primary.then_with(|| a.entity_id.cmp(&b.entity_id))
}

/// Filter, sort (descending, ties by ascending entity id) and page rows
pub fn list_snapshot(
    header: SnapshotHeader,
    rows: Vec<NetworkMetricRow>,
    query: &SnapshotQuery,
) -> SnapshotPage {
    let mut matching: Vec<NetworkMetricRow> = rows
        .into_iter()
        .filter(|r| query.min_degree.map_or(true, |min| r.degree >= min))
        .filter(|r| query.cluster_id.map_or(true, |c| r.cluster_id == c))
        .collect();
    matching.sort_by(|a, b| compare_desc(query.sort_by, a, b));

    let total = matching.len();
    let rows = matching
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();

    SnapshotPage { header, total, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64, degree: u64, pagerank: f64, cluster_id: u64) -> NetworkMetricRow {
        NetworkMetricRow {
            entity_id: EntityId::new(id),
            degree,
            pagerank,
            betweenness: 0.0,
            cluster_id,
            computed_at: Utc::now(),
        }
    }

    fn header() -> SnapshotHeader {
        SnapshotHeader {
            run_id: 1,
            computed_at: Utc::now(),
            entity_count: 4,
            edge_count: 3,
            cluster_count: 2,
        }
    }

    fn rows() -> Vec<NetworkMetricRow> {
        vec![row(1, 1, 0.1, 0), row(2, 3, 0.4, 0), row(3, 2, 0.3, 1), row(4, 2, 0.2, 1)]
    }

    #[test]
    fn test_sorts_descending() {
        let page = list_snapshot(header(), rows(), &SnapshotQuery::default());
        let ids: Vec<u64> = page.rows.iter().map(|r| r.entity_id.as_u64()).collect();
        assert_eq!(ids, vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_degree_ties_break_by_id() {
        let query = SnapshotQuery { sort_by: SortField::Degree, ..Default::default() };
        let page = list_snapshot(header(), rows(), &query);
        let ids: Vec<u64> = page.rows.iter().map(|r| r.entity_id.as_u64()).collect();
        assert_eq!(ids, vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_filters_and_pages() {
        let query = SnapshotQuery {
            min_degree: Some(2),
            cluster_id: Some(1),
            limit: 1,
            offset: 1,
            ..Default::default()
        };
        let page = list_snapshot(header(), rows(), &query);
        assert_eq!(page.total, 2);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].entity_id, EntityId::new(4));
    }
}
