//! Relationship edges: creation with optional inverse, lookup and upkeep

use super::CodexGraph;
use crate::error::{ManuscriptError, ManuscriptResult};
use crate::model::{
    CodexEntity, CreatedRelationships, EndpointSummary, EntityId, EntityRelationshipView,
    Listing, NewRelationship, Relationship, RelationshipId, RelationshipPatch, RelationshipView,
    DEFAULT_STRENGTH, MAX_STRENGTH, MIN_STRENGTH,
};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info, warn};

impl<'a> CodexGraph<'a> {
    /// Create an edge and, if asked, an independent inverse edge.
    ///
    /// Both endpoints must exist (`EntityNotFound`) and belong to this
    /// project (`EntityOutsideProject`). Each edge is checked against the
    /// (project, source, target, type) key before either is written; the two
    /// are then inserted in one transaction.
    pub fn create_relationship(&self, input: NewRelationship) -> ManuscriptResult<CreatedRelationships> {
        let relationship_type = require_type(&input.relationship_type)?;
        let strength = check_strength(input.strength.unwrap_or(DEFAULT_STRENGTH))?;
        let inverse_type = match (input.create_inverse, input.inverse_type.as_deref()) {
            (true, Some(label)) if !label.trim().is_empty() => Some(require_type(label)?),
            (true, _) => Some(relationship_type),
            (false, _) => None,
        };

        let source = self.get_entity(&input.source_id)?;
        let target = self.get_entity(&input.target_id)?;

        let primary = Relationship::new(
            self.project_id.clone(),
            source.id.clone(),
            target.id.clone(),
            relationship_type,
        )
        .with_description(input.description.clone())
        .with_strength(strength);
        self.ensure_unique(&primary)?;

        let inverse = match inverse_type {
            Some(label) => {
                let inverse = Relationship::new(
                    self.project_id.clone(),
                    target.id.clone(),
                    source.id.clone(),
                    label,
                )
                .with_description(input.description)
                .with_strength(strength);
                // A self-edge whose inverse has the same type is the same key
                if inverse.key() == primary.key() {
                    return Err(duplicate(&inverse));
                }
                self.ensure_unique(&inverse)?;
                Some(inverse)
            }
            None => None,
        };

        let mut batch = vec![primary.clone()];
        batch.extend(inverse.iter().cloned());
        self.store.insert_relationships(&batch)?;

        info!(
            project = %self.project_id,
            relationship = %primary.id,
            relationship_type = %primary.relationship_type,
            inverse = inverse.is_some(),
            "relationship created"
        );

        Ok(CreatedRelationships {
            relationship: view(primary, &source, &target),
            inverse: inverse.map(|edge| view(edge, &target, &source)),
        })
    }

    pub fn get_relationship(&self, id: &RelationshipId) -> ManuscriptResult<RelationshipView> {
        let relationship = self.load_relationship(id)?;
        let mut names = self.endpoint_lookup()?;
        Ok(self.enrich(relationship, &mut names))
    }

    /// Every edge touching `entity_id`, seen from that entity
    ///
    /// The entity row need not exist: a deleted entity has no edges left, so
    /// the listing is empty. An entity that does exist must belong to this
    /// project.
    pub fn relationships_for_entity(
        &self,
        entity_id: &EntityId,
    ) -> ManuscriptResult<Listing<EntityRelationshipView>> {
        if let Some(entity) = self.store.load_entity(entity_id)? {
            if entity.project_id != self.project_id {
                return Err(ManuscriptError::EntityOutsideProject {
                    entity: entity_id.clone(),
                    project: self.project_id.clone(),
                });
            }
        }

        let edges = self.store.relationships_for_entity(entity_id)?;
        let mut names = self.endpoint_lookup()?;

        let views = edges
            .into_iter()
            .filter(|relationship| relationship.project_id == self.project_id)
            .map(|relationship| {
                let (direction, other_id) = relationship.other_end(entity_id);
                let other = self.summary(other_id, &mut names);
                EntityRelationshipView {
                    relationship,
                    direction,
                    other,
                }
            })
            .collect::<Vec<_>>();

        debug!(entity = %entity_id, count = views.len(), "looked up relationships");
        Ok(Listing::new(views))
    }

    /// Every edge in the project with both endpoints resolved
    pub fn list_relationships(&self) -> ManuscriptResult<Listing<RelationshipView>> {
        let edges = self.store.list_relationships(&self.project_id)?;
        let mut names = self.endpoint_lookup()?;
        let views = edges
            .into_iter()
            .map(|edge| self.enrich(edge, &mut names))
            .collect::<Vec<_>>();
        Ok(Listing::new(views))
    }

    /// Patch type, description or strength. Endpoints never change.
    ///
    /// There is no pre-check of the uniqueness key here; a type that
    /// collides with a sibling edge is refused by the store's unique index.
    pub fn update_relationship(
        &self,
        id: &RelationshipId,
        patch: RelationshipPatch,
    ) -> ManuscriptResult<RelationshipView> {
        let mut relationship = self.load_relationship(id)?;

        if let Some(label) = patch.relationship_type {
            relationship.relationship_type = require_type(&label)?.to_string();
        }
        if let Some(description) = patch.description {
            relationship.description = Some(description);
        }
        if let Some(strength) = patch.strength {
            relationship.strength = check_strength(strength)?;
        }
        relationship.updated_at = Utc::now();

        if !self.store.update_relationship(&relationship)? {
            return Err(ManuscriptError::RelationshipNotFound(id.clone()));
        }
        debug!(relationship = %id, "relationship updated");

        let mut names = self.endpoint_lookup()?;
        Ok(self.enrich(relationship, &mut names))
    }

    /// Delete one edge; an inverse created alongside it stays
    pub fn delete_relationship(&self, id: &RelationshipId) -> ManuscriptResult<()> {
        self.load_relationship(id)?;
        if !self.store.delete_relationship(id)? {
            return Err(ManuscriptError::RelationshipNotFound(id.clone()));
        }
        info!(project = %self.project_id, relationship = %id, "relationship deleted");
        Ok(())
    }

    fn load_relationship(&self, id: &RelationshipId) -> ManuscriptResult<Relationship> {
        self.store
            .load_relationship(id)?
            .filter(|r| r.project_id == self.project_id)
            .ok_or_else(|| ManuscriptError::RelationshipNotFound(id.clone()))
    }

    fn ensure_unique(&self, relationship: &Relationship) -> ManuscriptResult<()> {
        if self.store.find_relationship(relationship.key())?.is_some() {
            return Err(duplicate(relationship));
        }
        Ok(())
    }

    /// Project entities keyed by id, for resolving endpoint display data
    fn endpoint_lookup(&self) -> ManuscriptResult<HashMap<EntityId, EndpointSummary>> {
        let listing = self.list_entities(None)?;
        Ok(listing
            .items
            .iter()
            .map(|e| (e.id.clone(), EndpointSummary::of(e)))
            .collect())
    }

    fn summary(&self, id: &EntityId, names: &mut HashMap<EntityId, EndpointSummary>) -> EndpointSummary {
        names
            .entry(id.clone())
            .or_insert_with(|| {
                warn!(project = %self.project_id, entity = %id, "relationship endpoint unresolved");
                EndpointSummary::placeholder(id)
            })
            .clone()
    }

    fn enrich(&self, relationship: Relationship, names: &mut HashMap<EntityId, EndpointSummary>) -> RelationshipView {
        let source = self.summary(&relationship.source_id, names);
        let target = self.summary(&relationship.target_id, names);
        RelationshipView {
            relationship,
            source,
            target,
        }
    }
}

fn view(relationship: Relationship, source: &CodexEntity, target: &CodexEntity) -> RelationshipView {
    RelationshipView {
        relationship,
        source: EndpointSummary::of(source),
        target: EndpointSummary::of(target),
    }
}

fn duplicate(relationship: &Relationship) -> ManuscriptError {
    ManuscriptError::DuplicateRelationship {
        source_id: relationship.source_id.clone(),
        target_id: relationship.target_id.clone(),
        relationship_type: relationship.relationship_type.clone(),
    }
}

fn require_type(label: &str) -> ManuscriptResult<&str> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(ManuscriptError::invalid("relationship type is required"));
    }
    Ok(trimmed)
}

fn check_strength(strength: u8) -> ManuscriptResult<u8> {
    if !(MIN_STRENGTH..=MAX_STRENGTH).contains(&strength) {
        return Err(ManuscriptError::invalid(format!(
            "strength must be between {MIN_STRENGTH} and {MAX_STRENGTH}, got {strength}"
        )));
    }
    Ok(strength)
}
