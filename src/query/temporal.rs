//! Temporal co-activity clustering
//!
//! An entity's dated activities are sorted and split greedily: a cluster is
//! anchored at its first record and takes every following record dated at
//! most `window_days` after the anchor. The first record past that starts the
//! next cluster. One linear pass after the sort.

use super::{QueryError, QueryResult};
use crate::graph::{ActivityKind, ActivityRecord, DocumentId, EntityId, LoadError};
use crate::persistence::ActivityRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Activities of one kind inside a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindGroup {
    pub kind: ActivityKind,
    /// All activities of this kind in the cluster
    pub count: usize,
    /// Earliest `max_results` of them
    pub activities: Vec<ActivityRecord>,
    /// `count - activities.len()`
    pub omitted: usize,
}

/// A burst of activity within one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityCluster {
    /// Anchor date
    pub start: NaiveDate,
    /// Date of the last record
    pub end: NaiveDate,
    pub total: usize,
    /// Ordered by kind
    pub groups: Vec<KindGroup>,
}

/// Clusters for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalReport {
    pub entity_id: EntityId,
    pub window_days: u32,
    pub max_results: usize,
    /// Dated activities clustered
    pub total_activities: usize,
    /// Activities without a date, left out of every cluster
    pub undated: usize,
    pub clusters: Vec<ActivityCluster>,
}

/// Source table of an activity kind, for error reporting
fn table_of(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::Flight => "flights",
        ActivityKind::Email => "emails",
        ActivityKind::TimelineEvent => "timeline_events",
        ActivityKind::FinancialTransaction => "financial_transactions",
    }
}

/// Cluster the activities of `entity` found in `rows`.
///
/// Rows not listing `entity` are ignored. A row without an activity id is
/// malformed and fails the query.
pub fn cluster_activities(
    entity: EntityId,
    rows: Vec<ActivityRow>,
    window_days: u32,
    max_results: usize,
) -> QueryResult<TemporalReport> {
    if window_days == 0 {
        return Err(QueryError::InvalidArgument(
            "window_days must be at least 1".to_string(),
        ));
    }

    let mut undated = 0;
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.activity_id.ok_or(LoadError::Malformed {
            table: table_of(row.kind),
            field: "activity_id",
        })?;
        if !row.involves(entity) {
            continue;
        }
        let Some(date) = row.activity_date else {
            undated += 1;
            continue;
        };
        records.push(ActivityRecord {
            id,
            kind: row.kind,
            date,
            document_id: row.document_id.map(DocumentId::new),
            entity_ids: row.entity_ids.into_iter().map(EntityId::new).collect(),
            description: row.description,
        });
    }
    if undated > 0 {
        warn!("{} activities of {} have no date and were not clustered", undated, entity);
    }

    records.sort_by(|a, b| (a.date, a.kind, a.id).cmp(&(b.date, b.kind, b.id)));
    let total_activities = records.len();

    let mut clusters = Vec::new();
    let mut current: Vec<ActivityRecord> = Vec::new();
    let mut anchor: Option<NaiveDate> = None;
    for record in records {
        match anchor {
            Some(start) if (record.date - start).num_days() <= i64::from(window_days) => {}
            Some(start) => {
                clusters.push(finish_cluster(start, std::mem::take(&mut current), max_results));
                anchor = Some(record.date);
            }
            None => anchor = Some(record.date),
        }
        current.push(record);
    }
    if let Some(start) = anchor {
        clusters.push(finish_cluster(start, current, max_results));
    }

    debug!(
        "Clustered {} activities of {} into {} windows of {} days",
        total_activities,
        entity,
        clusters.len(),
        window_days
    );

    Ok(TemporalReport {
        entity_id: entity,
        window_days,
        max_results,
        total_activities,
        undated,
        clusters,
    })
}

fn finish_cluster(start: NaiveDate, records: Vec<ActivityRecord>, max_results: usize) -> ActivityCluster {
    let end = records.last().map_or(start, |r| r.date);
    let total = records.len();

    let mut by_kind: BTreeMap<ActivityKind, Vec<ActivityRecord>> = BTreeMap::new();
    for record in records {
        by_kind.entry(record.kind).or_default().push(record);
    }

    let groups = by_kind
        .into_iter()
        .map(|(kind, mut activities)| {
            let count = activities.len();
            activities.truncate(max_results);
            KindGroup {
                kind,
                count,
                omitted: count - activities.len(),
                activities,
            }
        })
        .collect();

    ActivityCluster {
        start,
        end,
        total,
        groups,
    }
}
