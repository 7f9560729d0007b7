//! In-memory entity graph
//!
//! Holds one batch run's nodes and merged edges. Built by the loader,
//! discarded after metrics are computed.

use super::edge::{canonical_pair, MergedEdge, Relationship};
use super::entity::Entity;
use super::types::EntityId;
use corpusgraph_algorithms::GraphView;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors that can occur while assembling the graph
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Entity {0} not found")]
    EntityNotFound(EntityId),

    #[error("Self loop on {0}")]
    SelfLoop(EntityId),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Undirected weighted multigraph with merged edges
///
/// - entities: EntityId -> Entity (every entity, isolated ones included)
/// - edges: (low, high) -> MergedEdge, one per unordered pair
/// - adjacency: EntityId -> neighbor set, ascending
#[derive(Debug, Default, Clone)]
pub struct EntityGraph {
    entities: BTreeMap<EntityId, Entity>,
    edges: BTreeMap<(EntityId, EntityId), MergedEdge>,
    adjacency: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entity
    pub fn insert_entity(&mut self, entity: Entity) {
        self.adjacency.entry(entity.id).or_default();
        self.entities.insert(entity.id, entity);
    }

    /// Merge an explicit relationship row into the pair's edge
    pub fn merge_relationship(&mut self, relationship: &Relationship) -> GraphResult<()> {
        self.edge_entry(relationship.entity_a, relationship.entity_b)?
            .absorb_relationship(relationship);
        Ok(())
    }

    /// Merge one shared chunk into the pair's edge
    pub fn merge_cooccurrence(&mut self, a: EntityId, b: EntityId) -> GraphResult<()> {
        self.edge_entry(a, b)?.absorb_cooccurrence();
        Ok(())
    }

    fn edge_entry(&mut self, a: EntityId, b: EntityId) -> GraphResult<&mut MergedEdge> {
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        for id in [a, b] {
            if !self.entities.contains_key(&id) {
                return Err(GraphError::EntityNotFound(id));
            }
        }
        let key = canonical_pair(a, b);
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        Ok(self.edges.entry(key).or_insert_with(|| MergedEdge::new(a, b)))
    }

    /// Drop entities (and their edges) the predicate rejects
    pub fn retain_entities<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Entity, usize) -> bool,
    {
        let doomed: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| !keep(e, self.degree(e.id)))
            .map(|e| e.id)
            .collect();

        for id in &doomed {
            self.entities.remove(id);
            if let Some(neighbors) = self.adjacency.remove(id) {
                for n in neighbors {
                    if let Some(set) = self.adjacency.get_mut(&n) {
                        set.remove(id);
                    }
                    self.edges.remove(&canonical_pair(*id, n));
                }
            }
        }
        doomed.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// All entities, ascending by id
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// All merged edges, ascending by (low, high)
    pub fn edges(&self) -> impl Iterator<Item = &MergedEdge> {
        self.edges.values()
    }

    /// The merged edge between two entities, in either order
    pub fn edge(&self, a: EntityId, b: EntityId) -> Option<&MergedEdge> {
        self.edges.get(&canonical_pair(a, b))
    }

    /// Neighbors ascending by id
    pub fn neighbors(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.adjacency.get(&id).into_iter().flatten().copied()
    }

    /// Count of distinct neighbors
    pub fn degree(&self, id: EntityId) -> usize {
        self.adjacency.get(&id).map_or(0, BTreeSet::len)
    }

    /// Dense CSR projection for the algorithm kernels
    pub fn view(&self) -> GraphView {
        let nodes: Vec<u64> = self.entities.keys().map(EntityId::as_u64).collect();
        let edges: Vec<(u64, u64, f64)> = self
            .edges
            .values()
            .map(|e| (e.low.as_u64(), e.high.as_u64(), e.weight))
            .collect();
        GraphView::from_edges(&nodes, &edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::EntityKind;

    fn person(id: u64) -> Entity {
        Entity::new(id, format!("P{}", id), EntityKind::Person)
    }

    #[test]
    fn test_merge_is_order_insensitive() {
        let mut graph = EntityGraph::new();
        graph.insert_entity(person(1));
        graph.insert_entity(person(2));

        graph.merge_relationship(&Relationship::new(2u64, 1u64, "associate")).unwrap();
        graph.merge_cooccurrence(EntityId::new(1), EntityId::new(2)).unwrap();

        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edge(EntityId::new(1), EntityId::new(2)).unwrap();
        assert_eq!(edge.weight, 2.0);
        assert_eq!(graph.degree(EntityId::new(1)), 1);
    }

    #[test]
    fn test_rejects_unknown_and_loops() {
        let mut graph = EntityGraph::new();
        graph.insert_entity(person(1));

        assert_eq!(
            graph.merge_cooccurrence(EntityId::new(1), EntityId::new(5)),
            Err(GraphError::EntityNotFound(EntityId::new(5)))
        );
        assert_eq!(
            graph.merge_cooccurrence(EntityId::new(1), EntityId::new(1)),
            Err(GraphError::SelfLoop(EntityId::new(1)))
        );
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_retain_drops_edges() {
        let mut graph = EntityGraph::new();
        for id in 1..=3 {
            graph.insert_entity(person(id));
        }
        graph.merge_cooccurrence(EntityId::new(1), EntityId::new(2)).unwrap();
        graph.merge_cooccurrence(EntityId::new(2), EntityId::new(3)).unwrap();

        let removed = graph.retain_entities(|e, _| e.id != EntityId::new(2));
        assert_eq!(removed, 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.degree(EntityId::new(1)), 0);
    }

    #[test]
    fn test_view_keeps_isolated_nodes() {
        let mut graph = EntityGraph::new();
        for id in [5, 1, 3] {
            graph.insert_entity(person(id));
        }
        graph.merge_cooccurrence(EntityId::new(1), EntityId::new(5)).unwrap();

        let view = graph.view();
        assert_eq!(view.node_count, 3);
        assert_eq!(view.index_to_node, vec![1, 3, 5]);
        assert_eq!(view.edge_count(), 1);
    }
}
