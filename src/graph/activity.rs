//! Dated activity records (flights, emails, timeline events, transactions)

use super::types::{ActivityKind, DocumentId, EntityId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A validated activity record. Read-only input to temporal clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: u64,
    pub kind: ActivityKind,
    pub date: NaiveDate,
    pub document_id: Option<DocumentId>,
    pub entity_ids: Vec<EntityId>,
    pub description: Option<String>,
}

impl ActivityRecord {
    pub fn new(id: u64, kind: ActivityKind, date: NaiveDate) -> Self {
        ActivityRecord {
            id,
            kind,
            date,
            document_id: None,
            entity_ids: Vec::new(),
            description: None,
        }
    }
}
