//! Evidence paths between entities

use super::{QueryError, QueryResult};
use crate::algo::{bfs, GraphView};
use crate::graph::{DocumentId, Entity, EntityGraph, EntityId, RelationshipType};
use serde::{Deserialize, Serialize};

/// One traversed edge and what supports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub from: EntityId,
    pub to: EntityId,
    /// Types of the explicit relationship rows behind the edge; empty when
    /// the edge comes only from shared chunks
    pub relationship_types: Vec<RelationshipType>,
    pub evidence: Vec<DocumentId>,
    pub weight: f64,
    pub shared_chunks: u32,
}

/// A shortest path with its entities and steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPath {
    pub source: EntityId,
    pub target: EntityId,
    /// Source to target inclusive
    pub entities: Vec<Entity>,
    pub steps: Vec<PathStep>,
}

impl EntityPath {
    pub fn hops(&self) -> usize {
        self.steps.len()
    }
}

/// Result of a path query; an unreachable target is not an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PathOutcome {
    Found(EntityPath),
    NotFound,
}

impl PathOutcome {
    pub fn path(&self) -> Option<&EntityPath> {
        match self {
            PathOutcome::Found(path) => Some(path),
            PathOutcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PathOutcome::Found(_))
    }
}

/// Breadth-first path search over one loaded graph
pub struct PathFinder<'a> {
    graph: &'a EntityGraph,
    view: GraphView,
}

impl<'a> PathFinder<'a> {
    pub fn new(graph: &'a EntityGraph) -> Self {
        Self {
            graph,
            view: graph.view(),
        }
    }

    /// Shortest path of at most `max_depth` hops. Neighbors are tried in
    /// ascending id order, so ties always resolve to the same path.
    pub fn find(&self, source: EntityId, target: EntityId, max_depth: usize) -> QueryResult<PathOutcome> {
        for id in [source, target] {
            if !self.graph.contains(id) {
                return Err(QueryError::EntityNotFound(id));
            }
        }

        let Some(found) = bfs(&self.view, source.as_u64(), target.as_u64(), max_depth) else {
            return Ok(PathOutcome::NotFound);
        };

        let ids: Vec<EntityId> = found.path.into_iter().map(EntityId::new).collect();
        let mut entities = Vec::with_capacity(ids.len());
        for id in &ids {
            let entity = self.graph.entity(*id).ok_or(QueryError::EntityNotFound(*id))?;
            entities.push(entity.clone());
        }

        let mut steps = Vec::with_capacity(ids.len().saturating_sub(1));
        for pair in ids.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let edge = self
                .graph
                .edge(from, to)
                .ok_or(QueryError::EntityNotFound(to))?;
            steps.push(PathStep {
                from,
                to,
                relationship_types: edge.relationship_types.iter().cloned().collect(),
                evidence: edge.evidence.iter().copied().collect(),
                weight: edge.weight,
                shared_chunks: edge.shared_chunks,
            });
        }

        Ok(PathOutcome::Found(EntityPath {
            source,
            target,
            entities,
            steps,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EntityKind, Relationship};

    fn graph() -> EntityGraph {
        // 1 - 2 - 4 and 1 - 3 - 4; 5 alone
        let mut graph = EntityGraph::new();
        for id in 1..=5 {
            graph.insert_entity(Entity::new(id, format!("E{}", id), EntityKind::Person));
        }
        graph
            .merge_relationship(&Relationship::new(1u64, 2u64, "associate").with_evidence([10]))
            .unwrap();
        graph
            .merge_relationship(&Relationship::new(2u64, 4u64, "employer").with_evidence([11, 12]))
            .unwrap();
        graph.merge_cooccurrence(EntityId::new(1), EntityId::new(3)).unwrap();
        graph.merge_cooccurrence(EntityId::new(3), EntityId::new(4)).unwrap();
        graph
    }

    #[test]
    fn test_path_with_evidence() {
        let graph = graph();
        let outcome = PathFinder::new(&graph)
            .find(EntityId::new(1), EntityId::new(4), 6)
            .unwrap();
        let path = outcome.path().unwrap();

        // Lower id neighbor (2) wins the tie
        let ids: Vec<u64> = path.entities.iter().map(|e| e.id.as_u64()).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert_eq!(path.hops(), 2);
        assert_eq!(path.steps[0].relationship_types, vec![RelationshipType::new("associate")]);
        assert_eq!(path.steps[1].evidence, vec![DocumentId::new(11), DocumentId::new(12)]);
    }

    #[test]
    fn test_cooccurrence_step_has_no_type() {
        let graph = graph();
        let outcome = PathFinder::new(&graph)
            .find(EntityId::new(1), EntityId::new(3), 6)
            .unwrap();
        let step = &outcome.path().unwrap().steps[0];
        assert!(step.relationship_types.is_empty());
        assert_eq!(step.shared_chunks, 1);
    }

    #[test]
    fn test_same_entity() {
        let graph = graph();
        let outcome = PathFinder::new(&graph)
            .find(EntityId::new(5), EntityId::new(5), 0)
            .unwrap();
        let path = outcome.path().unwrap();
        assert_eq!(path.entities.len(), 1);
        assert!(path.steps.is_empty());
    }

    #[test]
    fn test_depth_and_reachability() {
        let graph = graph();
        let finder = PathFinder::new(&graph);

        assert_eq!(finder.find(EntityId::new(1), EntityId::new(2), 0).unwrap(), PathOutcome::NotFound);
        assert!(finder.find(EntityId::new(1), EntityId::new(2), 1).unwrap().is_found());
        assert_eq!(finder.find(EntityId::new(1), EntityId::new(4), 1).unwrap(), PathOutcome::NotFound);
        assert_eq!(finder.find(EntityId::new(1), EntityId::new(5), 100).unwrap(), PathOutcome::NotFound);
    }

    #[test]
    fn test_unknown_entity() {
        let graph = graph();
        let err = PathFinder::new(&graph)
            .find(EntityId::new(1), EntityId::new(77), 6)
            .unwrap_err();
        assert!(matches!(err, QueryError::EntityNotFound(id) if id == EntityId::new(77)));
    }
}
