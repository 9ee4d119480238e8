//! Relationship edges between codex entities and their enriched views

use super::entity::{CodexEntity, EntityType};
use super::ids::{EntityId, ProjectId, RelationshipId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_STRENGTH: u8 = 1;
pub const MAX_STRENGTH: u8 = 10;
pub const DEFAULT_STRENGTH: u8 = 5;

/// A directed, typed, weighted edge between two entities of one project
///
/// Inverse edges are stored as independent rows with no link back to the
/// edge they were created alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub project_id: ProjectId,
    pub source_id: EntityId,
    pub target_id: EntityId,
    /// Free-text label, e.g. "parentOf", "rivalOf"
    pub relationship_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 1..=10
    pub strength: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    pub fn new(
        project_id: ProjectId,
        source_id: EntityId,
        target_id: EntityId,
        relationship_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RelationshipId::new(),
            project_id,
            source_id,
            target_id,
            relationship_type: relationship_type.into(),
            description: None,
            strength: DEFAULT_STRENGTH,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_strength(mut self, strength: u8) -> Self {
        self.strength = strength;
        self
    }

    /// The uniqueness key of this edge
    pub fn key(&self) -> RelationshipKey<'_> {
        RelationshipKey {
            project_id: &self.project_id,
            source_id: &self.source_id,
            target_id: &self.target_id,
            relationship_type: &self.relationship_type,
        }
    }

    /// Returns the endpoint opposite to `entity`, with the direction seen from it
    pub fn other_end(&self, entity: &EntityId) -> (Direction, &EntityId) {
        if &self.source_id == entity {
            (Direction::Outgoing, &self.target_id)
        } else {
            (Direction::Incoming, &self.source_id)
        }
    }
}

/// Uniqueness key of a relationship: (project, source, target, type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationshipKey<'a> {
    pub project_id: &'a ProjectId,
    pub source_id: &'a EntityId,
    pub target_id: &'a EntityId,
    pub relationship_type: &'a str,
}

/// Input for creating a relationship
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRelationship {
    pub source_id: EntityId,
    pub target_id: EntityId,
    pub relationship_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub strength: Option<u8>,
    #[serde(default)]
    pub create_inverse: bool,
    #[serde(default)]
    pub inverse_type: Option<String>,
}

impl NewRelationship {
    pub fn new(source_id: EntityId, target_id: EntityId, relationship_type: impl Into<String>) -> Self {
        Self {
            source_id,
            target_id,
            relationship_type: relationship_type.into(),
            ..Default::default()
        }
    }

    pub fn with_inverse(mut self, inverse_type: Option<&str>) -> Self {
        self.create_inverse = true;
        self.inverse_type = inverse_type.map(str::to_string);
        self
    }

    pub fn with_strength(mut self, strength: u8) -> Self {
        self.strength = Some(strength);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Mutable-field patch; endpoints are fixed after creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipPatch {
    #[serde(default)]
    pub relationship_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub strength: Option<u8>,
}

/// Direction of an edge relative to a queried entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Display data for an edge endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub id: EntityId,
    pub name: String,
    /// `None` when the endpoint could not be resolved
    pub entity_type: Option<EntityType>,
}

impl EndpointSummary {
    pub const UNKNOWN_NAME: &'static str = "Unknown entity";

    pub fn of(entity: &CodexEntity) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            entity_type: Some(entity.entity_type),
        }
    }

    pub fn placeholder(id: &EntityId) -> Self {
        Self {
            id: id.clone(),
            name: Self::UNKNOWN_NAME.to_string(),
            entity_type: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.entity_type.is_none()
    }
}

/// An edge with both endpoints resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipView {
    #[serde(flatten)]
    pub relationship: Relationship,
    pub source: EndpointSummary,
    pub target: EndpointSummary,
}

/// An edge seen from one of its endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRelationshipView {
    #[serde(flatten)]
    pub relationship: Relationship,
    pub direction: Direction,
    pub other: EndpointSummary,
}

/// Result of a create call: the edge and, when requested, its inverse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedRelationships {
    pub relationship: RelationshipView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<RelationshipView>,
}
