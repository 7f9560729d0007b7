//! Core type definitions for the entity graph

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entity (graph node)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    pub fn new(id: u64) -> Self {
        EntityId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        EntityId(id)
    }
}

/// Identifier of a source document cited as evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl DocumentId {
    pub fn new(id: u64) -> Self {
        DocumentId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        DocumentId(id)
    }
}

/// Identifier of a text chunk that entity mentions point into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ChunkId(pub u64);

impl From<u64> for ChunkId {
    fn from(id: u64) -> Self {
        ChunkId(id)
    }
}

/// Entity type as assigned by the extraction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    Aircraft,
    Vessel,
    Property,
    Account,
    /// Any type string the engine does not recognize
    Other,
}

impl EntityKind {
    /// Lenient parse; unknown strings map to [`EntityKind::Other`]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "person" => EntityKind::Person,
            "organization" | "organisation" => EntityKind::Organization,
            "location" => EntityKind::Location,
            "aircraft" => EntityKind::Aircraft,
            "vessel" => EntityKind::Vessel,
            "property" => EntityKind::Property,
            "account" => EntityKind::Account,
            _ => EntityKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Organization => "organization",
            EntityKind::Location => "location",
            EntityKind::Aircraft => "aircraft",
            EntityKind::Vessel => "vessel",
            EntityKind::Property => "property",
            EntityKind::Account => "account",
            EntityKind::Other => "other",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relationship type tag (e.g., "associate", "employed_by")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct RelationshipType(String);

impl RelationshipType {
    pub fn new(relationship_type: impl Into<String>) -> Self {
        RelationshipType(relationship_type.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RelationshipType {
    fn from(s: String) -> Self {
        RelationshipType(s)
    }
}

impl From<&str> for RelationshipType {
    fn from(s: &str) -> Self {
        RelationshipType(s.to_string())
    }
}

/// Kind of dated activity an entity takes part in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Flight,
    Email,
    TimelineEvent,
    FinancialTransaction,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Flight => "flight",
            ActivityKind::Email => "email",
            ActivityKind::TimelineEvent => "timeline_event",
            ActivityKind::FinancialTransaction => "financial_transaction",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        let id = EntityId::new(42);
        assert_eq!(id.as_u64(), 42);
        assert_eq!(format!("{}", id), "EntityId(42)");

        let id2: EntityId = 100.into();
        assert_eq!(id2.as_u64(), 100);
    }

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!(EntityKind::parse("Person"), EntityKind::Person);
        assert_eq!(EntityKind::parse(" organisation "), EntityKind::Organization);
        assert_eq!(EntityKind::parse("shell company"), EntityKind::Other);
        assert_eq!(EntityKind::Vessel.to_string(), "vessel");
    }

    #[test]
    fn test_relationship_type() {
        let rel = RelationshipType::new("associate");
        assert_eq!(rel.as_str(), "associate");
        assert_eq!(format!("{}", rel), "associate");
    }

    #[test]
    fn test_id_ordering() {
        assert!(EntityId::new(1) < EntityId::new(2));
        assert!(ActivityKind::Flight < ActivityKind::FinancialTransaction);
    }
}
