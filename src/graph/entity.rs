//! Entity (graph node)

use super::types::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};

/// An extracted entity. Counts are read from the store as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub mention_count: u64,
    pub document_count: u64,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, kind: EntityKind) -> Self {
        Entity {
            id: id.into(),
            name: name.into(),
            kind,
            mention_count: 0,
            document_count: 0,
        }
    }
}
