//! Bulk source records for import
//!
//! JSON layout:
//! ```json
//! {
//!   "entities":      [{"id": 1, "name": "...", "type": "person"}],
//!   "relationships": [{"entity_a_id": 1, "entity_b_id": 2, "relationship_type": "associate",
//!                      "evidence_document_ids": [10]}],
//!   "mentions":      [{"entity_id": 1, "chunk_id": 500}],
//!   "activities":    [{"kind": "flight", "activity_id": 7, "activity_date": "2002-03-01",
//!                      "entity_ids": [1, 2], "document_id": 10}]
//! }
//! ```

use super::records::{ActivityRow, EntityRow, MentionRow, RelationshipRow};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Source tables bundled together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub entities: Vec<EntityRow>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRow>,
    #[serde(default)]
    pub mentions: Vec<MentionRow>,
    #[serde(default)]
    pub activities: Vec<ActivityRow>,
}

/// Rows written by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub entities: usize,
    pub relationships: usize,
    pub mentions: usize,
    pub activities: usize,
}

impl Dataset {
    /// Parse a dataset from JSON
    pub fn from_json_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    /// Parse a dataset from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Ok(Self::from_json_reader(std::io::BufReader::new(file))?)
    }

    pub fn stats(&self) -> ImportStats {
        ImportStats {
            entities: self.entities.len(),
            relationships: self.relationships.len(),
            mentions: self.mentions.len(),
            activities: self.activities.len(),
        }
    }
}
