//! Transport-independent API layer
//!
//! `ManuscriptApi` is the single entry point for consumer-facing operations.
//! Every call names the caller; the project an operation touches is resolved
//! (directly, or from the chapter, version, entity or relationship it names)
//! and passed through the ownership check before any state is read or
//! written. Work is then delegated to a project-scoped `ChapterOrdering`,
//! `VersionLog` or `CodexGraph`.

use std::sync::Arc;

use crate::access::{OwnershipCheck, StoreOwnership};
use crate::chapters::ChapterOrdering;
use crate::codex::{CodexGraph, NetworkExport};
use crate::error::{ManuscriptError, ManuscriptResult};
use crate::model::{
    Chapter, ChapterId, ChapterPatch, CodexEntity, Content, CreatedRelationships, EntityId,
    EntityPatch, EntityRelationshipView, EntityType, Listing, NewEntity, NewRelationship, Project,
    ProjectId, RelationshipId, RelationshipPatch, RelationshipView, UserId, Version, VersionId,
    VersionSummary,
};
use crate::storage::{ChapterRemoval, ManuscriptStore};
use crate::versions::{RestoreOutcome, VersionLog};

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct ManuscriptApi {
    store: Arc<dyn ManuscriptStore>,
    ownership: Arc<dyn OwnershipCheck>,
}

impl ManuscriptApi {
    pub fn new(store: Arc<dyn ManuscriptStore>, ownership: Arc<dyn OwnershipCheck>) -> Self {
        Self { store, ownership }
    }

    /// API whose ownership check reads project records from `store`
    pub fn with_store(store: Arc<dyn ManuscriptStore>) -> Self {
        let ownership = Arc::new(StoreOwnership::new(Arc::clone(&store)));
        Self::new(store, ownership)
    }

    // --- Projects ---

    pub fn register_project(&self, caller: &UserId, title: &str) -> ManuscriptResult<Project> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ManuscriptError::invalid("project title is required"));
        }
        let project = Project::new(caller.clone(), title);
        self.store.save_project(&project)?;
        tracing::info!(project = %project.id, owner = %caller, "project created");
        Ok(project)
    }

    pub fn get_project(&self, caller: &UserId, project_id: &ProjectId) -> ManuscriptResult<Project> {
        self.ownership.authorize(project_id, caller)
    }

    /// Remove a project with its chapters, versions, entities and relationships
    pub fn delete_project(&self, caller: &UserId, project_id: &ProjectId) -> ManuscriptResult<()> {
        self.ownership.authorize(project_id, caller)?;
        if !self.store.delete_project(project_id)? {
            return Err(ManuscriptError::ProjectNotFound(project_id.clone()));
        }
        tracing::info!(project = %project_id, "project deleted");
        Ok(())
    }

    // --- Chapters ---

    pub fn create_chapter(
        &self,
        caller: &UserId,
        project_id: &ProjectId,
        title: &str,
        content: Option<Content>,
        notes: Option<String>,
    ) -> ManuscriptResult<Chapter> {
        self.chapters(caller, project_id)?.create_chapter(title, content, notes)
    }

    pub fn list_chapters(&self, caller: &UserId, project_id: &ProjectId) -> ManuscriptResult<Listing<Chapter>> {
        self.chapters(caller, project_id)?.list_chapters()
    }

    pub fn get_chapter(&self, caller: &UserId, chapter_id: &ChapterId) -> ManuscriptResult<Chapter> {
        self.chapters_of(caller, chapter_id)?.get_chapter(chapter_id)
    }

    pub fn update_chapter(
        &self,
        caller: &UserId,
        chapter_id: &ChapterId,
        patch: ChapterPatch,
    ) -> ManuscriptResult<Chapter> {
        self.chapters_of(caller, chapter_id)?.update_chapter(chapter_id, patch)
    }

    pub fn delete_chapter(&self, caller: &UserId, chapter_id: &ChapterId) -> ManuscriptResult<ChapterRemoval> {
        self.chapters_of(caller, chapter_id)?.delete_chapter(chapter_id)
    }

    pub fn reorder_chapters(
        &self,
        caller: &UserId,
        project_id: &ProjectId,
        order: &[ChapterId],
    ) -> ManuscriptResult<Listing<Chapter>> {
        self.chapters(caller, project_id)?.reorder(order)
    }

    // --- Versions ---

    pub fn create_version(
        &self,
        caller: &UserId,
        chapter_id: &ChapterId,
        description: Option<String>,
    ) -> ManuscriptResult<Version> {
        let project_id = self.chapter_project(caller, chapter_id)?;
        VersionLog::new(self.store.as_ref(), project_id).snapshot(chapter_id, description)
    }

    pub fn list_versions(&self, caller: &UserId, chapter_id: &ChapterId) -> ManuscriptResult<Listing<VersionSummary>> {
        let project_id = self.chapter_project(caller, chapter_id)?;
        VersionLog::new(self.store.as_ref(), project_id).list(chapter_id)
    }

    pub fn get_version(&self, caller: &UserId, version_id: &VersionId) -> ManuscriptResult<Version> {
        self.versions_of(caller, version_id)?.get(version_id)
    }

    pub fn restore_version(&self, caller: &UserId, version_id: &VersionId) -> ManuscriptResult<RestoreOutcome> {
        self.versions_of(caller, version_id)?.restore(version_id)
    }

    // --- Codex entities ---

    pub fn create_entity(
        &self,
        caller: &UserId,
        project_id: &ProjectId,
        input: NewEntity,
    ) -> ManuscriptResult<CodexEntity> {
        self.codex(caller, project_id)?.create_entity(input)
    }

    pub fn list_entities(
        &self,
        caller: &UserId,
        project_id: &ProjectId,
        types: Option<Vec<EntityType>>,
    ) -> ManuscriptResult<Listing<CodexEntity>> {
        self.codex(caller, project_id)?.list_entities(types)
    }

    pub fn get_entity(&self, caller: &UserId, entity_id: &EntityId) -> ManuscriptResult<CodexEntity> {
        self.codex_of_entity(caller, entity_id)?.get_entity(entity_id)
    }

    pub fn update_entity(
        &self,
        caller: &UserId,
        entity_id: &EntityId,
        patch: EntityPatch,
    ) -> ManuscriptResult<CodexEntity> {
        self.codex_of_entity(caller, entity_id)?.update_entity(entity_id, patch)
    }

    /// Returns the number of relationships removed with the entity
    pub fn delete_entity(&self, caller: &UserId, entity_id: &EntityId) -> ManuscriptResult<usize> {
        self.codex_of_entity(caller, entity_id)?.delete_entity(entity_id)
    }

    // --- Relationships ---

    pub fn create_relationship(
        &self,
        caller: &UserId,
        project_id: &ProjectId,
        input: NewRelationship,
    ) -> ManuscriptResult<CreatedRelationships> {
        self.codex(caller, project_id)?.create_relationship(input)
    }

    pub fn get_relationship(&self, caller: &UserId, id: &RelationshipId) -> ManuscriptResult<RelationshipView> {
        self.codex_of_relationship(caller, id)?.get_relationship(id)
    }

    /// Edges touching an entity of `project_id`. A deleted or unknown
    /// entity yields an empty listing.
    pub fn relationships_for_entity(
        &self,
        caller: &UserId,
        project_id: &ProjectId,
        entity_id: &EntityId,
    ) -> ManuscriptResult<Listing<EntityRelationshipView>> {
        self.codex(caller, project_id)?.relationships_for_entity(entity_id)
    }

    pub fn list_relationships(
        &self,
        caller: &UserId,
        project_id: &ProjectId,
    ) -> ManuscriptResult<Listing<RelationshipView>> {
        self.codex(caller, project_id)?.list_relationships()
    }

    pub fn update_relationship(
        &self,
        caller: &UserId,
        id: &RelationshipId,
        patch: RelationshipPatch,
    ) -> ManuscriptResult<RelationshipView> {
        self.codex_of_relationship(caller, id)?.update_relationship(id, patch)
    }

    pub fn delete_relationship(&self, caller: &UserId, id: &RelationshipId) -> ManuscriptResult<()> {
        self.codex_of_relationship(caller, id)?.delete_relationship(id)
    }

    pub fn network_export(
        &self,
        caller: &UserId,
        project_id: &ProjectId,
        types: Option<Vec<EntityType>>,
    ) -> ManuscriptResult<NetworkExport> {
        self.codex(caller, project_id)?.network_export(types)
    }

    // --- Scope resolution ---

    fn authorize(&self, caller: &UserId, project_id: &ProjectId) -> ManuscriptResult<ProjectId> {
        Ok(self.ownership.authorize(project_id, caller)?.id)
    }

    fn chapters(&self, caller: &UserId, project_id: &ProjectId) -> ManuscriptResult<ChapterOrdering<'_>> {
        let project_id = self.authorize(caller, project_id)?;
        Ok(ChapterOrdering::new(self.store.as_ref(), project_id))
    }

    fn chapter_project(&self, caller: &UserId, chapter_id: &ChapterId) -> ManuscriptResult<ProjectId> {
        let chapter = self
            .store
            .load_chapter(chapter_id)?
            .ok_or_else(|| ManuscriptError::ChapterNotFound(chapter_id.clone()))?;
        self.authorize(caller, &chapter.project_id)
    }

    fn chapters_of(&self, caller: &UserId, chapter_id: &ChapterId) -> ManuscriptResult<ChapterOrdering<'_>> {
        let project_id = self.chapter_project(caller, chapter_id)?;
        Ok(ChapterOrdering::new(self.store.as_ref(), project_id))
    }

    fn versions_of(&self, caller: &UserId, version_id: &VersionId) -> ManuscriptResult<VersionLog<'_>> {
        let version = self
            .store
            .load_version(version_id)?
            .ok_or_else(|| ManuscriptError::VersionNotFound(version_id.clone()))?;
        let project_id = self.authorize(caller, &version.project_id)?;
        Ok(VersionLog::new(self.store.as_ref(), project_id))
    }

    fn codex(&self, caller: &UserId, project_id: &ProjectId) -> ManuscriptResult<CodexGraph<'_>> {
        let project_id = self.authorize(caller, project_id)?;
        Ok(CodexGraph::new(self.store.as_ref(), project_id))
    }

    fn codex_of_entity(&self, caller: &UserId, entity_id: &EntityId) -> ManuscriptResult<CodexGraph<'_>> {
        let entity = self
            .store
            .load_entity(entity_id)?
            .ok_or_else(|| ManuscriptError::EntityNotFound(entity_id.clone()))?;
        self.codex(caller, &entity.project_id)
    }

    fn codex_of_relationship(&self, caller: &UserId, id: &RelationshipId) -> ManuscriptResult<CodexGraph<'_>> {
        let relationship = self
            .store
            .load_relationship(id)?
            .ok_or_else(|| ManuscriptError::RelationshipNotFound(id.clone()))?;
        self.codex(caller, &relationship.project_id)
    }
}
