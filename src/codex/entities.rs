//! Codex entity management

use super::CodexGraph;
use crate::error::{ManuscriptError, ManuscriptResult};
use crate::model::{CodexEntity, EntityId, EntityPatch, EntityType, Listing, NewEntity};
use crate::storage::EntityFilter;
use chrono::Utc;
use tracing::info;

impl<'a> CodexGraph<'a> {
    /// Create an entity with its full descriptive payload
    pub fn create_entity(&self, input: NewEntity) -> ManuscriptResult<CodexEntity> {
        let name = require_name(&input.name)?;
        let mut entity = CodexEntity::new(self.project_id.clone(), input.entity_type, name);
        entity.description = input.description;
        entity.attributes = input.attributes;
        entity.images = input.images;
        entity.tags = input.tags;

        self.store.save_entity(&entity)?;
        info!(
            project = %self.project_id,
            entity = %entity.id,
            entity_type = %entity.entity_type,
            attributes = entity.attributes.len(),
            "entity created"
        );
        Ok(entity)
    }

    /// Resolve an entity, confirming it belongs to this project
    pub fn get_entity(&self, id: &EntityId) -> ManuscriptResult<CodexEntity> {
        let entity = self
            .store
            .load_entity(id)?
            .ok_or_else(|| ManuscriptError::EntityNotFound(id.clone()))?;

        if entity.project_id != self.project_id {
            return Err(ManuscriptError::EntityOutsideProject {
                entity: id.clone(),
                project: self.project_id.clone(),
            });
        }
        Ok(entity)
    }

    pub fn list_entities(&self, types: Option<Vec<EntityType>>) -> ManuscriptResult<Listing<CodexEntity>> {
        let filter = EntityFilter { types };
        Ok(Listing::new(self.store.find_entities(&self.project_id, &filter)?))
    }

    /// Patch descriptive fields; the type is fixed
    pub fn update_entity(&self, id: &EntityId, patch: EntityPatch) -> ManuscriptResult<CodexEntity> {
        let mut entity = self.get_entity(id)?;

        if let Some(name) = patch.name {
            entity.name = require_name(&name)?.to_string();
        }
        if let Some(description) = patch.description {
            entity.description = Some(description);
        }
        if let Some(attributes) = patch.attributes {
            entity.attributes = attributes;
        }
        if let Some(images) = patch.images {
            entity.images = images;
        }
        if let Some(tags) = patch.tags {
            entity.tags = tags;
        }
        entity.updated_at = Utc::now();

        self.store.save_entity(&entity)?;
        Ok(entity)
    }

    /// Delete an entity together with every relationship touching it.
    /// Returns how many relationships went with it.
    pub fn delete_entity(&self, id: &EntityId) -> ManuscriptResult<usize> {
        self.get_entity(id)?;
        let removed = self
            .store
            .delete_entity(id)?
            .ok_or_else(|| ManuscriptError::EntityNotFound(id.clone()))?;

        info!(project = %self.project_id, entity = %id, relationships = removed, "entity deleted");
        Ok(removed)
    }
}

fn require_name(name: &str) -> ManuscriptResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ManuscriptError::invalid("entity name is required"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{AttributeValue, Attributes};
    use crate::storage::ManuscriptStore;

    #[test]
    fn create_and_list_by_type() {
        let (store, project) = store_with_project();
        let codex = CodexGraph::new(&store, project);
        add_entity(&codex, EntityType::Character, "Mara");
        add_entity(&codex, EntityType::Location, "Harbor");
        add_entity(&codex, EntityType::Item, "Compass");

        assert_eq!(codex.list_entities(None).unwrap().count, 3);

        let places = codex.list_entities(Some(vec![EntityType::Location])).unwrap();
        assert_eq!(places.count, 1);
        assert_eq!(places.items[0].name, "Harbor");
    }

    #[test]
    fn empty_name_is_rejected() {
        let (store, project) = store_with_project();
        let err = CodexGraph::new(&store, project)
            .create_entity(NewEntity::new(EntityType::Concept, "  "))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn create_stores_full_payload() {
        let (store, project) = store_with_project();
        let codex = CodexGraph::new(&store, project);
        let created = codex
            .create_entity(
                NewEntity::new(EntityType::Location, " Harbor ")
                    .with_description("where the ships wait")
                    .with_attribute("population", 1200i64)
                    .with_attribute("walled", true)
                    .with_image("harbor.png")
                    .with_tag("coast"),
            )
            .unwrap();

        let loaded = store.load_entity(&created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.name, "Harbor");
        assert_eq!(loaded.attributes["population"], AttributeValue::Int(1200));
        assert_eq!(loaded.attributes["walled"], AttributeValue::Bool(true));
        assert_eq!(loaded.images, vec!["harbor.png".to_string()]);
        assert_eq!(loaded.tags, vec!["coast".to_string()]);
    }

    #[test]
    fn update_replaces_bag_and_keeps_type() {
        let (store, project) = store_with_project();
        let codex = CodexGraph::new(&store, project);
        let mara = add_entity(&codex, EntityType::Character, "Mara");

        let mut attributes = Attributes::new();
        attributes.insert("rank".into(), AttributeValue::from("captain"));
        let updated = codex
            .update_entity(
                &mara.id,
                EntityPatch {
                    name: Some("Mara Voss".into()),
                    attributes: Some(attributes),
                    tags: Some(vec!["crew".into()]),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Mara Voss");
        assert_eq!(updated.entity_type, EntityType::Character);
        let loaded = store.load_entity(&mara.id).unwrap().unwrap();
        assert_eq!(loaded.attributes["rank"], AttributeValue::from("captain"));
        assert_eq!(loaded.tags, vec!["crew".to_string()]);
    }

    #[test]
    fn entity_from_other_project_is_rejected() {
        let (store, project) = store_with_project();
        let elsewhere = second_project(&store);
        let stranger = add_entity(&CodexGraph::new(&store, elsewhere), EntityType::Character, "Stranger");

        let err = CodexGraph::new(&store, project).get_entity(&stranger.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}
