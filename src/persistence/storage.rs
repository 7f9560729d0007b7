//! RocksDB storage layer implementation
//!
//! Column families:
//! - `entities`, `relationships`, `mentions`, `activities`: source rows keyed
//!   by a per-table sequence number, bincode values
//! - `indices`: `e:{entity}` -> entity row key, `a:{entity}:{seq}` -> activity
//!   row key
//! - `metrics`: `{run_id}:{entity_id}` -> [`NetworkMetricRow`]
//! - `meta`: latest snapshot pointer and table sequence counters
//!
//! A snapshot swap is one `WriteBatch`: a range delete of the previous run's
//! rows, then the new rows and the new pointer. RocksDB applies a batch
//! atomically, and readers go through a DB snapshot, so a reader sees either
//! the old run or the new one.

use super::dataset::{Dataset, ImportStats};
use super::records::{ActivityRow, EntityRow, MentionRow, RelationshipRow};
use super::snapshot::{MetricSnapshot, NetworkMetricRow, SnapshotHeader};
use super::{GraphTables, RecordSource, SnapshotStore, StorageError, StorageResult, WriteResult};
use crate::graph::EntityId;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, Snapshot, WriteBatch,
    WriteOptions, DB,
};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const CF_ENTITIES: &str = "entities";
const CF_RELATIONSHIPS: &str = "relationships";
const CF_MENTIONS: &str = "mentions";
const CF_ACTIVITIES: &str = "activities";
const CF_INDICES: &str = "indices";
const CF_METRICS: &str = "metrics";
const CF_META: &str = "meta";

const LATEST_KEY: &[u8] = b"snapshot:latest";

/// RocksDB-based record source and snapshot store
pub struct RocksStore {
    /// RocksDB instance
    db: Arc<DB>,
    /// Serializes imports and snapshot swaps
    write_lock: Mutex<()>,
    path: String,
}

impl RocksStore {
    /// Open or create a store
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        info!("Opening corpusgraph store at: {}", path_str);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(64 * 1024 * 1024); // 64 MB
        opts.set_max_write_buffer_number(3);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        let cf_descriptors = [
            CF_ENTITIES,
            CF_RELATIONSHIPS,
            CF_MENTIONS,
            CF_ACTIVITIES,
            CF_INDICES,
            CF_METRICS,
            CF_META,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Self::cf_options()))
        .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, &path_str, cf_descriptors)?;

        info!("Store opened successfully");

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
            path: path_str,
        })
    }

    fn cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    /// Filesystem location of the database
    pub fn path(&self) -> &str {
        &self.path
    }

    fn cf(&self, name: &str) -> StorageResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamily(name.to_string()))
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StorageError::Unavailable("write lock poisoned".to_string()))
    }

    /// Append a dataset's rows in one batch
    pub fn import_dataset(&self, dataset: &Dataset) -> StorageResult<ImportStats> {
        let _guard = self.lock()?;
        let meta = self.cf(CF_META)?;
        let indices = self.cf(CF_INDICES)?;
        let mut batch = WriteBatch::default();

        let mut seq = self.read_sequence(CF_ENTITIES)?;
        let cf = self.cf(CF_ENTITIES)?;
        for row in &dataset.entities {
            let key = row_key(seq);
            batch.put_cf(&cf, &key, bincode::serialize(row)?);
            if let Some(id) = row.id {
                batch.put_cf(&indices, entity_index_key(id), &key);
            }
            seq += 1;
        }
        batch.put_cf(&meta, sequence_key(CF_ENTITIES), seq.to_be_bytes());

        let mut seq = self.read_sequence(CF_RELATIONSHIPS)?;
        let cf = self.cf(CF_RELATIONSHIPS)?;
        for row in &dataset.relationships {
            batch.put_cf(&cf, row_key(seq), bincode::serialize(row)?);
            seq += 1;
        }
        batch.put_cf(&meta, sequence_key(CF_RELATIONSHIPS), seq.to_be_bytes());

        let mut seq = self.read_sequence(CF_MENTIONS)?;
        let cf = self.cf(CF_MENTIONS)?;
        for row in &dataset.mentions {
            batch.put_cf(&cf, row_key(seq), bincode::serialize(row)?);
            seq += 1;
        }
        batch.put_cf(&meta, sequence_key(CF_MENTIONS), seq.to_be_bytes());

        let mut seq = self.read_sequence(CF_ACTIVITIES)?;
        let cf = self.cf(CF_ACTIVITIES)?;
        for row in &dataset.activities {
            let key = row_key(seq);
            batch.put_cf(&cf, &key, bincode::serialize(row)?);
            for &entity in &row.entity_ids {
                batch.put_cf(&indices, activity_index_key(entity, seq), &key);
            }
            seq += 1;
        }
        batch.put_cf(&meta, sequence_key(CF_ACTIVITIES), seq.to_be_bytes());

        self.db.write(batch)?;

        let stats = dataset.stats();
        info!(
            "Imported {} entities, {} relationships, {} mentions, {} activities",
            stats.entities, stats.relationships, stats.mentions, stats.activities
        );
        Ok(stats)
    }

    fn read_sequence(&self, table: &str) -> StorageResult<u64> {
        let meta = self.cf(CF_META)?;
        match self.db.get_cf(&meta, sequence_key(table))? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StorageError::Unavailable(format!("corrupt sequence counter for {}", table))
                })?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    /// Deserialize every value in a column family as of `view`
    fn scan_all<T: DeserializeOwned>(&self, view: &Snapshot<'_>, name: &str) -> StorageResult<Vec<T>> {
        let cf = self.cf(name)?;
        let mut rows = Vec::new();
        for item in view.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(bincode::deserialize(&value)?);
        }
        Ok(rows)
    }

    fn tables_at(&self, view: &Snapshot<'_>) -> StorageResult<GraphTables> {
        Ok(GraphTables {
            entities: self.scan_all(view, CF_ENTITIES)?,
            relationships: self.scan_all(view, CF_RELATIONSHIPS)?,
            mentions: self.scan_all(view, CF_MENTIONS)?,
        })
    }

    /// Values of every index entry under a key prefix
    fn scan_index(&self, prefix: &[u8]) -> StorageResult<Vec<Vec<u8>>> {
        let indices = self.cf(CF_INDICES)?;
        let mut targets = Vec::new();
        for item in self
            .db
            .iterator_cf(&indices, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            targets.push(value.to_vec());
        }
        Ok(targets)
    }

    /// Flush all data to disk
    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        debug!("Flushed storage to disk");
        Ok(())
    }
}

impl RecordSource for RocksStore {
    fn entity_rows(&self) -> StorageResult<Vec<EntityRow>> {
        self.scan_all(&self.db.snapshot(), CF_ENTITIES)
    }

    fn entity_row(&self, id: EntityId) -> StorageResult<Option<EntityRow>> {
        let indices = self.cf(CF_INDICES)?;
        let Some(row_key) = self.db.get_cf(&indices, entity_index_key(id.as_u64()))? else {
            return Ok(None);
        };
        let cf = self.cf(CF_ENTITIES)?;
        match self.db.get_cf(&cf, row_key)? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    fn relationship_rows(&self) -> StorageResult<Vec<RelationshipRow>> {
        self.scan_all(&self.db.snapshot(), CF_RELATIONSHIPS)
    }

    fn mention_rows(&self) -> StorageResult<Vec<MentionRow>> {
        self.scan_all(&self.db.snapshot(), CF_MENTIONS)
    }

    fn activity_rows(&self, entity: EntityId) -> StorageResult<Vec<ActivityRow>> {
        let prefix = activity_index_prefix(entity.as_u64());
        let row_keys = self.scan_index(&prefix)?;
        let cf = self.cf(CF_ACTIVITIES)?;

        let mut rows = Vec::with_capacity(row_keys.len());
        for key in row_keys {
            if let Some(value) = self.db.get_cf(&cf, key)? {
                rows.push(bincode::deserialize(&value)?);
            }
        }
        Ok(rows)
    }

    fn graph_tables(&self) -> StorageResult<GraphTables> {
        self.tables_at(&self.db.snapshot())
    }
}

impl SnapshotStore for RocksStore {
    fn replace_snapshot(&self, snapshot: &MetricSnapshot) -> WriteResult<u64> {
        let _guard = self.lock()?;
        let metrics = self.cf(CF_METRICS)?;
        let meta = self.cf(CF_META)?;

        let previous = self.latest_header()?;
        let run_id = previous.as_ref().map_or(1, |prev| prev.run_id + 1);
        let header = SnapshotHeader {
            run_id,
            ..snapshot.header.clone()
        };

        // The range delete comes first; a batch applies in order
        let mut batch = WriteBatch::default();
        if let Some(prev) = &previous {
            let (from, to) = run_key_range(prev.run_id);
            batch.delete_range_cf(&metrics, from, to);
        }
        for row in &snapshot.rows {
            batch.put_cf(
                &metrics,
                metric_key(run_id, row.entity_id.as_u64()),
                bincode::serialize(row).map_err(StorageError::from)?,
            );
        }
        batch.put_cf(
            &meta,
            LATEST_KEY,
            bincode::serialize(&header).map_err(StorageError::from)?,
        );

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db
            .write_opt(batch, &write_opts)
            .map_err(StorageError::from)?;

        info!(
            "Persisted snapshot run {} ({} rows)",
            run_id,
            snapshot.rows.len()
        );
        Ok(run_id)
    }

    fn latest_header(&self) -> StorageResult<Option<SnapshotHeader>> {
        let meta = self.cf(CF_META)?;
        match self.db.get_cf(&meta, LATEST_KEY)? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    fn latest_snapshot(&self) -> StorageResult<Option<MetricSnapshot>> {
        let meta = self.cf(CF_META)?;
        let metrics = self.cf(CF_METRICS)?;
        let view = self.db.snapshot();

        let header: SnapshotHeader = match view.get_cf(&meta, LATEST_KEY)? {
            Some(value) => bincode::deserialize(&value)?,
            None => return Ok(None),
        };

        let (from, _) = run_key_range(header.run_id);
        let mut rows = Vec::with_capacity(header.entity_count as usize);
        for item in view.iterator_cf(&metrics, IteratorMode::From(from.as_slice(), Direction::Forward)) {
            let (key, value) = item?;
            if !key.starts_with(from.as_slice()) {
                break;
            }
            let row: NetworkMetricRow = bincode::deserialize(&value)?;
            rows.push(row);
        }

        Ok(Some(MetricSnapshot { header, rows }))
    }
}

fn row_key(seq: u64) -> Vec<u8> {
    format!("{:016x}", seq).into_bytes()
}

fn sequence_key(table: &str) -> Vec<u8> {
    format!("seq:{}", table).into_bytes()
}

fn entity_index_key(entity: u64) -> Vec<u8> {
    format!("e:{:016x}", entity).into_bytes()
}

fn activity_index_prefix(entity: u64) -> Vec<u8> {
    format!("a:{:016x}:", entity).into_bytes()
}

fn activity_index_key(entity: u64, seq: u64) -> Vec<u8> {
    format!("a:{:016x}:{:016x}", entity, seq).into_bytes()
}

fn metric_key(run_id: u64, entity: u64) -> Vec<u8> {
    format!("{:016x}:{:016x}", run_id, entity).into_bytes()
}

/// `[from, to)` covering every metric key of a run (';' sorts right after ':')
fn run_key_range(run_id: u64) -> (Vec<u8>, Vec<u8>) {
    (
        format!("{:016x}:", run_id).into_bytes(),
        format!("{:016x};", run_id).into_bytes(),
    )
}
