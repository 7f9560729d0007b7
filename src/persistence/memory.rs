//! In-memory record source and snapshot store
//!
//! The snapshot lives behind one `RwLock` and is swapped whole under the
//! write lock, so readers see either the old or the new run. Failure
//! switches let tests simulate an unreachable store or a failed write.

use super::dataset::{Dataset, ImportStats};
use super::records::{ActivityRow, EntityRow, MentionRow, RelationshipRow};
use super::snapshot::{MetricSnapshot, SnapshotHeader};
use super::{
    GraphTables, RecordSource, SnapshotStore, StorageError, StorageResult, WriteError, WriteResult,
};
use crate::graph::EntityId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Dataset>,
    snapshot: RwLock<Option<MetricSnapshot>>,
    unavailable: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with a dataset
    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            records: RwLock::new(dataset),
            ..Self::default()
        }
    }

    /// Append a dataset's rows
    pub fn import_dataset(&self, dataset: &Dataset) -> StorageResult<ImportStats> {
        let mut records = self.write_records()?;
        records.entities.extend(dataset.entities.iter().cloned());
        records.relationships.extend(dataset.relationships.iter().cloned());
        records.mentions.extend(dataset.mentions.iter().cloned());
        records.activities.extend(dataset.activities.iter().cloned());
        Ok(dataset.stats())
    }

    /// Make every read fail as if the store were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make snapshot writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn read_records(&self) -> StorageResult<RwLockReadGuard<'_, Dataset>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store offline".to_string()));
        }
        self.records
            .read()
            .map_err(|_| StorageError::Unavailable("record lock poisoned".to_string()))
    }

    fn write_records(&self) -> StorageResult<RwLockWriteGuard<'_, Dataset>> {
        self.records
            .write()
            .map_err(|_| StorageError::Unavailable("record lock poisoned".to_string()))
    }

    fn read_snapshot(&self) -> StorageResult<RwLockReadGuard<'_, Option<MetricSnapshot>>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store offline".to_string()));
        }
        self.snapshot
            .read()
            .map_err(|_| StorageError::Unavailable("snapshot lock poisoned".to_string()))
    }
}

impl RecordSource for MemoryStore {
    fn entity_rows(&self) -> StorageResult<Vec<EntityRow>> {
        Ok(self.read_records()?.entities.clone())
    }

    fn entity_row(&self, id: EntityId) -> StorageResult<Option<EntityRow>> {
        Ok(self
            .read_records()?
            .entities
            .iter()
            .find(|row| row.id == Some(id.as_u64()))
            .cloned())
    }

    fn relationship_rows(&self) -> StorageResult<Vec<RelationshipRow>> {
        Ok(self.read_records()?.relationships.clone())
    }

    fn mention_rows(&self) -> StorageResult<Vec<MentionRow>> {
        Ok(self.read_records()?.mentions.clone())
    }

    fn activity_rows(&self, entity: EntityId) -> StorageResult<Vec<ActivityRow>> {
        Ok(self
            .read_records()?
            .activities
            .iter()
            .filter(|row| row.entity_ids.contains(&entity.as_u64()))
            .cloned()
            .collect())
    }

    fn graph_tables(&self) -> StorageResult<GraphTables> {
        let records = self.read_records()?;
        Ok(GraphTables {
            entities: records.entities.clone(),
            relationships: records.relationships.clone(),
            mentions: records.mentions.clone(),
        })
    }
}

impl SnapshotStore for MemoryStore {
    fn replace_snapshot(&self, snapshot: &MetricSnapshot) -> WriteResult<u64> {
        if self.fail_writes.load(Ordering::SeqCst) || self.unavailable.load(Ordering::SeqCst) {
            warn!("Rejecting snapshot of {} rows: store write failure", snapshot.rows.len());
            return Err(WriteError::Storage(StorageError::Unavailable(
                "memory store rejected write".to_string(),
            )));
        }

        // Staged outside the lock; the swap is one assignment
        let mut staged = snapshot.clone();
        let mut current = self
            .snapshot
            .write()
            .map_err(|_| StorageError::Unavailable("snapshot lock poisoned".to_string()))?;
        let run_id = current.as_ref().map_or(1, |prev| prev.header.run_id + 1);
        staged.header.run_id = run_id;
        *current = Some(staged);

        debug!("Swapped in snapshot run {}", run_id);
        Ok(run_id)
    }

    fn latest_header(&self) -> StorageResult<Option<SnapshotHeader>> {
        Ok(self.read_snapshot()?.as_ref().map(|s| s.header.clone()))
    }

    fn latest_snapshot(&self) -> StorageResult<Option<MetricSnapshot>> {
        Ok(self.read_snapshot()?.clone())
    }
}
