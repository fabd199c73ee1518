//! Relationship graph models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::storage::StorageUnit;

/// Inferred relationship vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationshipKind::OneToOne => write!(f, "OneToOne"),
            RelationshipKind::OneToMany => write!(f, "OneToMany"),
            RelationshipKind::ManyToOne => write!(f, "ManyToOne"),
            RelationshipKind::ManyToMany => write!(f, "ManyToMany"),
        }
    }
}

/// A directed edge as produced by one catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationEdge {
    pub from_table: String,
    pub to_table: String,
    pub kind: RelationshipKind,
}

impl RelationEdge {
    pub fn new(
        from_table: impl Into<String>,
        to_table: impl Into<String>,
        kind: RelationshipKind,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            to_table: to_table.into(),
            kind,
        }
    }
}

/// Outgoing relation of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GraphUnitRelationship {
    /// Related table name.
    pub name: String,
    pub relationship_type: RelationshipKind,
}

/// One node per enumerated storage unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GraphUnit {
    pub unit: StorageUnit,
    pub relations: Vec<GraphUnitRelationship>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_with_vocabulary_names() {
        let json = serde_json::to_string(&RelationshipKind::ManyToMany).unwrap();
        assert_eq!(json, "\"ManyToMany\"");
        assert_eq!(RelationshipKind::OneToMany.to_string(), "OneToMany");
    }
}
