//! Relationship records and merged graph edges
//!
//! Any number of explicit relationship rows and chunk co-occurrences between
//! the same two entities collapse into one [`MergedEdge`]. The weight adds up
//! across all of them; relationship types and evidence documents are kept as
//! sets so path queries can cite them.

use super::types::{DocumentId, EntityId, RelationshipType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A validated explicit relationship row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub relationship_type: Option<RelationshipType>,
    /// Weight contributed to the merged edge (default 1.0)
    pub weight: f64,
    pub evidence: Vec<DocumentId>,
}

impl Relationship {
    pub fn new(a: impl Into<EntityId>, b: impl Into<EntityId>, relationship_type: &str) -> Self {
        Relationship {
            entity_a: a.into(),
            entity_b: b.into(),
            relationship_type: Some(RelationshipType::new(relationship_type)),
            weight: 1.0,
            evidence: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, documents: impl IntoIterator<Item = u64>) -> Self {
        self.evidence.extend(documents.into_iter().map(DocumentId::new));
        self
    }
}

/// Canonical undirected key: smaller id first
pub fn canonical_pair(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// One undirected graph edge after merging every row for a pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEdge {
    /// Smaller endpoint
    pub low: EntityId,
    /// Larger endpoint
    pub high: EntityId,
    /// Accumulated weight
    pub weight: f64,
    /// Types of the explicit rows merged in (empty for pure co-occurrence)
    pub relationship_types: BTreeSet<RelationshipType>,
    /// Union of supporting documents
    pub evidence: BTreeSet<DocumentId>,
    /// Number of explicit relationship rows merged
    pub explicit_rows: u32,
    /// Number of shared chunks merged
    pub shared_chunks: u32,
}

impl MergedEdge {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        let (low, high) = canonical_pair(a, b);
        MergedEdge {
            low,
            high,
            weight: 0.0,
            relationship_types: BTreeSet::new(),
            evidence: BTreeSet::new(),
            explicit_rows: 0,
            shared_chunks: 0,
        }
    }

    /// Fold an explicit relationship row into this edge
    pub fn absorb_relationship(&mut self, relationship: &Relationship) {
        self.weight += relationship.weight;
        self.explicit_rows += 1;
        if let Some(rel_type) = &relationship.relationship_type {
            self.relationship_types.insert(rel_type.clone());
        }
        self.evidence.extend(relationship.evidence.iter().copied());
    }

    /// Fold one shared chunk into this edge
    pub fn absorb_cooccurrence(&mut self) {
        self.weight += 1.0;
        self.shared_chunks += 1;
    }

    /// True when at least one explicit row backs this edge
    pub fn is_explicit(&self) -> bool {
        self.explicit_rows > 0
    }

    /// The endpoint opposite `id`
    pub fn other(&self, id: EntityId) -> EntityId {
        if id == self.low {
            self.high
        } else {
            self.low
        }
    }
}
