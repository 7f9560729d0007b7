//! Raw rows as the collaborating stores return them
//!
//! Every column is optional here. The graph loader and the temporal query
//! decide which fields are required and turn rows into typed records.

use crate::graph::{ActivityKind, EntityId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Row of the entity table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub mention_count: Option<i64>,
    #[serde(default)]
    pub document_count: Option<i64>,
}

impl EntityRow {
    pub fn new(id: u64, name: &str, entity_type: &str) -> Self {
        EntityRow {
            id: Some(id),
            name: Some(name.to_string()),
            entity_type: Some(entity_type.to_string()),
            mention_count: None,
            document_count: None,
        }
    }
}

/// Row of the relationship table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRow {
    #[serde(default)]
    pub entity_a_id: Option<u64>,
    #[serde(default)]
    pub entity_b_id: Option<u64>,
    #[serde(default)]
    pub relationship_type: Option<String>,
    /// Row weight; absent means 1
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub evidence_document_ids: Vec<u64>,
}

impl RelationshipRow {
    pub fn new(a: u64, b: u64, relationship_type: &str) -> Self {
        RelationshipRow {
            entity_a_id: Some(a),
            entity_b_id: Some(b),
            relationship_type: Some(relationship_type.to_string()),
            weight: None,
            evidence_document_ids: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, documents: &[u64]) -> Self {
        self.evidence_document_ids.extend_from_slice(documents);
        self
    }
}

/// Row of the entity-mention table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentionRow {
    #[serde(default)]
    pub entity_id: Option<u64>,
    #[serde(default)]
    pub chunk_id: Option<u64>,
}

impl MentionRow {
    pub fn new(entity_id: u64, chunk_id: u64) -> Self {
        MentionRow {
            entity_id: Some(entity_id),
            chunk_id: Some(chunk_id),
        }
    }
}

/// Row of one of the activity tables; `kind` names the table it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub kind: ActivityKind,
    #[serde(default)]
    pub activity_id: Option<u64>,
    #[serde(default)]
    pub activity_date: Option<NaiveDate>,
    #[serde(default)]
    pub entity_ids: Vec<u64>,
    #[serde(default)]
    pub document_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ActivityRow {
    pub fn new(kind: ActivityKind, activity_id: u64, date: NaiveDate, entity_ids: &[u64]) -> Self {
        ActivityRow {
            kind,
            activity_id: Some(activity_id),
            activity_date: Some(date),
            entity_ids: entity_ids.to_vec(),
            document_id: None,
            description: None,
        }
    }

    /// Whether `entity` is listed among the participants
    pub fn involves(&self, entity: EntityId) -> bool {
        self.entity_ids.contains(&entity.as_u64())
    }
}
