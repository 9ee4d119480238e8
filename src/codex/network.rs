//! Node/edge view of the codex for graph visualization

use super::CodexGraph;
use crate::error::ManuscriptResult;
use crate::model::{CodexEntity, EntityId, EntityType, Relationship, RelationshipId};
use crate::storage::EntityFilter;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: EntityId,
    pub label: String,
    pub group: EntityType,
}

impl From<&CodexEntity> for NetworkNode {
    fn from(entity: &CodexEntity) -> Self {
        Self {
            id: entity.id.clone(),
            label: entity.name.clone(),
            group: entity.entity_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub id: RelationshipId,
    pub from: EntityId,
    pub to: EntityId,
    pub label: String,
    pub weight: u8,
    /// The description, or the type when there is none
    pub tooltip: String,
}

impl From<Relationship> for NetworkEdge {
    fn from(edge: Relationship) -> Self {
        let tooltip = edge
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| edge.relationship_type.clone());
        Self {
            id: edge.id,
            from: edge.source_id,
            to: edge.target_id,
            label: edge.relationship_type,
            weight: edge.strength,
            tooltip,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkExport {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl<'a> CodexGraph<'a> {
    /// Export entities, optionally restricted to `types`, and only the edges
    /// whose endpoints are both among them.
    pub fn network_export(&self, types: Option<Vec<EntityType>>) -> ManuscriptResult<NetworkExport> {
        let snapshot = self.store.load_codex(&self.project_id, &EntityFilter { types })?;

        let export = NetworkExport {
            nodes: snapshot.entities.iter().map(NetworkNode::from).collect(),
            edges: snapshot.relationships.into_iter().map(NetworkEdge::from).collect(),
        };
        debug!(
            project = %self.project_id,
            nodes = export.nodes.len(),
            edges = export.edges.len(),
            "network exported"
        );
        Ok(export)
    }
}
