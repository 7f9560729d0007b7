//! Graph Loader
//!
//! Reads entity, relationship and mention rows from a [`RecordSource`] and
//! builds an [`EntityGraph`]:
//! - every entity becomes a node, isolated ones included
//! - relationship rows merge into one edge per unordered pair
//! - two distinct entities mentioned in the same chunk add weight 1 to their
//!   pair's edge, once per shared chunk
//!
//! A row missing a required id fails the load. A row pointing at an entity
//! that is not in the entity table is dropped and counted.

use super::edge::Relationship;
use super::entity::Entity;
use super::store::EntityGraph;
use super::types::{ChunkId, DocumentId, EntityId, EntityKind, RelationshipType};
use crate::persistence::{EntityRow, GraphTables, RecordSource, RelationshipRow, StorageError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Load errors; fatal to a batch run
#[derive(Error, Debug)]
pub enum LoadError {
    /// Store unreachable or returned unreadable data
    #[error("Store unavailable: {0}")]
    Store(#[from] StorageError),

    /// A row lacks a required field
    #[error("Malformed {table} row: missing {field}")]
    Malformed {
        table: &'static str,
        field: &'static str,
    },
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Optional restriction of the loaded node set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadFilter {
    /// Keep only entities of these kinds
    pub entity_kinds: Option<BTreeSet<EntityKind>>,
    /// After edges are merged, drop entities with fewer neighbors
    pub min_degree: Option<usize>,
}

impl LoadFilter {
    pub fn is_empty(&self) -> bool {
        self.entity_kinds.is_none() && self.min_degree.is_none()
    }
}

/// Counts from one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub entity_rows: usize,
    pub relationship_rows: usize,
    pub mention_rows: usize,
    /// Relationship rows naming an unknown entity
    pub dangling_relationships: usize,
    /// Relationship rows linking an entity to itself
    pub self_relationships: usize,
    /// Relationship rows with a non-finite or non-positive weight
    pub invalid_weights: usize,
    /// Mention rows naming an unknown entity
    pub dangling_mentions: usize,
    /// Entity rows repeating an id already loaded
    pub duplicate_entities: usize,
    /// Entities removed by the load filter
    pub filtered_entities: usize,
    /// Co-occurrence contributions merged (one per pair per shared chunk)
    pub cooccurrences: usize,
}

impl LoadStats {
    /// Rows skipped for bad content (filtered entities are not counted)
    pub fn skipped_rows(&self) -> usize {
        self.dangling_relationships
            + self.self_relationships
            + self.invalid_weights
            + self.dangling_mentions
            + self.duplicate_entities
    }
}

/// A loaded graph plus how it was loaded
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub graph: EntityGraph,
    pub stats: LoadStats,
}

/// Builds an [`EntityGraph`] from a record source
pub struct GraphLoader<'a, S: RecordSource + ?Sized> {
    source: &'a S,
    filter: LoadFilter,
}

impl<'a, S: RecordSource + ?Sized> GraphLoader<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            filter: LoadFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: LoadFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Load the whole graph
    pub fn load(&self) -> LoadResult<LoadedGraph> {
        let mut graph = EntityGraph::new();
        let mut stats = LoadStats::default();
        if !self.filter.is_empty() {
            debug!("Loading with filter {:?}", self.filter);
        }

        let GraphTables {
            entities: entity_rows,
            relationships: relationship_rows,
            mentions: mention_rows,
        } = self.source.graph_tables()?;

        stats.entity_rows = entity_rows.len();
        let mut excluded: BTreeSet<EntityId> = BTreeSet::new();
        for row in entity_rows {
            let entity = entity_from_row(row)?;
            if graph.contains(entity.id) || excluded.contains(&entity.id) {
                stats.duplicate_entities += 1;
                continue;
            }
            if let Some(kinds) = &self.filter.entity_kinds {
                if !kinds.contains(&entity.kind) {
                    excluded.insert(entity.id);
                    continue;
                }
            }
            graph.insert_entity(entity);
        }
        stats.filtered_entities = excluded.len();
        debug!("Loaded {} entities", graph.entity_count());

        stats.relationship_rows = relationship_rows.len();
        for row in relationship_rows {
            let Some(relationship) = relationship_from_row(row)? else {
                stats.invalid_weights += 1;
                continue;
            };
            let (a, b) = (relationship.entity_a, relationship.entity_b);
            if a == b {
                stats.self_relationships += 1;
                continue;
            }
            if excluded.contains(&a) || excluded.contains(&b) {
                continue;
            }
            if graph.merge_relationship(&relationship).is_err() {
                stats.dangling_relationships += 1;
            }
        }

        stats.mention_rows = mention_rows.len();
        let mut chunks: FxHashMap<ChunkId, BTreeSet<EntityId>> = FxHashMap::default();
        for row in mention_rows {
            let entity = row
                .entity_id
                .map(EntityId::new)
                .ok_or(LoadError::Malformed { table: "mentions", field: "entity_id" })?;
            let chunk = row
                .chunk_id
                .map(ChunkId::from)
                .ok_or(LoadError::Malformed { table: "mentions", field: "chunk_id" })?;
            if excluded.contains(&entity) {
                continue;
            }
            if !graph.contains(entity) {
                stats.dangling_mentions += 1;
                continue;
            }
            chunks.entry(chunk).or_default().insert(entity);
        }

        let mut pair_counts: FxHashMap<(EntityId, EntityId), usize> = FxHashMap::default();
        for members in chunks.values() {
            let members: Vec<EntityId> = members.iter().copied().collect();
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    *pair_counts.entry((a, b)).or_insert(0) += 1;
                }
            }
        }
        for ((a, b), count) in pair_counts {
            for _ in 0..count {
                // Both endpoints are known: checked when the mention was read
                if graph.merge_cooccurrence(a, b).is_ok() {
                    stats.cooccurrences += 1;
                }
            }
        }

        if let Some(min_degree) = self.filter.min_degree {
            stats.filtered_entities += graph.retain_entities(|_, degree| degree >= min_degree);
        }

        if stats.dangling_relationships > 0 {
            warn!(
                "Dropped {} relationship rows referencing unknown entities",
                stats.dangling_relationships
            );
        }
        if stats.dangling_mentions > 0 {
            warn!(
                "Dropped {} mention rows referencing unknown entities",
                stats.dangling_mentions
            );
        }
        if stats.self_relationships + stats.invalid_weights + stats.duplicate_entities > 0 {
            warn!(
                "Dropped {} self-referencing, {} bad-weight relationship rows and {} duplicate entities",
                stats.self_relationships, stats.invalid_weights, stats.duplicate_entities
            );
        }

        info!(
            "Graph loaded: {} entities, {} edges ({} co-occurrences, {} rows skipped)",
            graph.entity_count(),
            graph.edge_count(),
            stats.cooccurrences,
            stats.skipped_rows()
        );

        Ok(LoadedGraph { graph, stats })
    }
}

/// Validate an entity row; the id is required, everything else defaults
pub fn entity_from_row(row: EntityRow) -> LoadResult<Entity> {
    let id = row
        .id
        .ok_or(LoadError::Malformed { table: "entities", field: "id" })?;
    Ok(Entity {
        id: EntityId::new(id),
        name: row.name.unwrap_or_default(),
        kind: row
            .entity_type
            .as_deref()
            .map_or(EntityKind::Other, EntityKind::parse),
        mention_count: row.mention_count.unwrap_or(0).max(0) as u64,
        document_count: row.document_count.unwrap_or(0).max(0) as u64,
    })
}

/// Validate a relationship row. Missing endpoints are an error; an unusable
/// weight yields `Ok(None)` so the row can be skipped.
fn relationship_from_row(row: RelationshipRow) -> LoadResult<Option<Relationship>> {
    let a = row
        .entity_a_id
        .ok_or(LoadError::Malformed { table: "relationships", field: "entity_a_id" })?;
    let b = row
        .entity_b_id
        .ok_or(LoadError::Malformed { table: "relationships", field: "entity_b_id" })?;

    let weight = row.weight.unwrap_or(1.0);
    if !weight.is_finite() || weight <= 0.0 {
        return Ok(None);
    }

    Ok(Some(Relationship {
        entity_a: EntityId::new(a),
        entity_b: EntityId::new(b),
        relationship_type: row
            .relationship_type
            .filter(|t| !t.trim().is_empty())
            .map(RelationshipType::new),
        weight,
        evidence: row
            .evidence_document_ids
            .into_iter()
            .map(DocumentId::new)
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{Dataset, MemoryStore, MentionRow};

    fn dataset() -> Dataset {
        Dataset {
            entities: vec![
                EntityRow::new(1, "Alice", "person"),
                EntityRow::new(2, "Acme", "organization"),
                EntityRow::new(3, "Island", "location"),
                EntityRow::new(4, "Loner", "person"),
            ],
            relationships: vec![
                RelationshipRow::new(1, 2, "employed_by").with_evidence(&[100]),
                RelationshipRow::new(2, 1, "associate").with_evidence(&[101]),
                RelationshipRow::new(1, 99, "associate"),
            ],
            mentions: vec![
                MentionRow::new(1, 500),
                MentionRow::new(2, 500),
                MentionRow::new(3, 500),
                MentionRow::new(1, 501),
                MentionRow::new(3, 501),
                MentionRow::new(1, 501),
                MentionRow::new(42, 501),
            ],
            activities: vec![],
        }
    }

    #[test]
    fn test_load_merges_explicit_and_cooccurrence() {
        let store = MemoryStore::with_dataset(dataset());
        let loaded = GraphLoader::new(&store).load().unwrap();
        let graph = &loaded.graph;

        assert_eq!(graph.entity_count(), 4);
        assert_eq!(graph.edge_count(), 3);

        // Two explicit rows + chunk 500
        let ab = graph.edge(EntityId::new(2), EntityId::new(1)).unwrap();
        assert_eq!(ab.weight, 3.0);
        assert_eq!(ab.explicit_rows, 2);
        assert_eq!(ab.evidence.len(), 2);
        assert_eq!(ab.relationship_types.len(), 2);

        // Chunks 500 and 501; repeated mention in 501 counts once
        let ac = graph.edge(EntityId::new(1), EntityId::new(3)).unwrap();
        assert_eq!(ac.weight, 2.0);
        assert!(!ac.is_explicit());

        assert_eq!(graph.degree(EntityId::new(4)), 0);
        assert_eq!(loaded.stats.dangling_relationships, 1);
        assert_eq!(loaded.stats.dangling_mentions, 1);
        assert_eq!(loaded.stats.skipped_rows(), 2);
    }

    #[test]
    fn test_missing_entity_id_is_fatal() {
        let mut data = dataset();
        data.entities.push(EntityRow { name: Some("ghost".into()), ..Default::default() });
        let store = MemoryStore::with_dataset(data);

        let err = GraphLoader::new(&store).load().unwrap_err();
        assert!(matches!(err, LoadError::Malformed { table: "entities", field: "id" }));
    }

    #[test]
    fn test_missing_chunk_id_is_fatal() {
        let mut data = dataset();
        data.mentions.push(MentionRow { entity_id: Some(1), chunk_id: None });
        let store = MemoryStore::with_dataset(data);

        assert!(matches!(
            GraphLoader::new(&store).load(),
            Err(LoadError::Malformed { table: "mentions", .. })
        ));
    }

    #[test]
    fn test_unreachable_store() {
        let store = MemoryStore::with_dataset(dataset());
        store.set_unavailable(true);
        assert!(matches!(GraphLoader::new(&store).load(), Err(LoadError::Store(_))));
    }

    #[test]
    fn test_bad_weight_and_self_loop_skipped() {
        let mut data = dataset();
        let mut heavy = RelationshipRow::new(3, 4, "associate");
        heavy.weight = Some(f64::NAN);
        data.relationships.push(heavy);
        data.relationships.push(RelationshipRow::new(4, 4, "alias"));
        let store = MemoryStore::with_dataset(data);

        let loaded = GraphLoader::new(&store).load().unwrap();
        assert_eq!(loaded.stats.invalid_weights, 1);
        assert_eq!(loaded.stats.self_relationships, 1);
        assert_eq!(loaded.graph.degree(EntityId::new(4)), 0);
    }

    #[test]
    fn test_kind_filter() {
        let store = MemoryStore::with_dataset(dataset());
        let filter = LoadFilter {
            entity_kinds: Some([EntityKind::Person, EntityKind::Location].into_iter().collect()),
            min_degree: None,
        };
        let loaded = GraphLoader::new(&store).with_filter(filter).load().unwrap();

        assert_eq!(loaded.graph.entity_count(), 3);
        assert!(!loaded.graph.contains(EntityId::new(2)));
        assert_eq!(loaded.graph.edge_count(), 1);
        assert_eq!(loaded.stats.filtered_entities, 1);
        assert_eq!(loaded.stats.dangling_relationships, 1);
    }

    #[test]
    fn test_min_degree_filter() {
        let store = MemoryStore::with_dataset(dataset());
        let filter = LoadFilter { entity_kinds: None, min_degree: Some(1) };
        let loaded = GraphLoader::new(&store).with_filter(filter).load().unwrap();

        assert!(!loaded.graph.contains(EntityId::new(4)));
        assert_eq!(loaded.graph.entity_count(), 3);
    }
}
