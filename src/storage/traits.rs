//! Storage trait definitions

use crate::model::{
    Chapter, ChapterId, CodexEntity, EntityId, EntityType, Project, ProjectId, Relationship,
    RelationshipId, RelationshipKey, Version, VersionId, VersionSummary,
};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Connection lock poisoned")]
    LockPoisoned,
}

// Uniqueness and foreign-key violations are split out from other database
// failures so callers can report them as rejected input.
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => StorageError::Constraint(err.to_string()),
            _ => StorageError::Database(err),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filter criteria for querying entities
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    /// Restrict to these types; `None` means every type
    pub types: Option<Vec<EntityType>>,
}

impl EntityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = EntityType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }
}

/// Outcome of deleting a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ChapterRemoval {
    /// Index the deleted chapter held
    pub order_index: u32,
    /// Chapters shifted down by one to close the gap
    pub renumbered: usize,
}

/// Outcome of a restore: the chapter as rewritten plus the safety snapshot
#[derive(Debug, Clone)]
pub struct Restoration {
    pub chapter: Chapter,
    pub safety_snapshot: Version,
}

/// Entities and the edges among them, read in one consistent snapshot
#[derive(Debug, Clone, Default)]
pub struct CodexSnapshot {
    pub entities: Vec<CodexEntity>,
    /// Only edges whose endpoints are both in `entities`
    pub relationships: Vec<Relationship>,
}

/// Trait for manuscript storage backends
///
/// Implementations must be thread-safe (Send + Sync). Every compound
/// operation documented as atomic must apply completely or not at all.
pub trait ManuscriptStore: Send + Sync {
    // === Projects ===

    /// Create or update a project
    fn save_project(&self, project: &Project) -> StorageResult<()>;

    fn load_project(&self, id: &ProjectId) -> StorageResult<Option<Project>>;

    /// Delete a project with its chapters, versions, entities and relationships
    fn delete_project(&self, id: &ProjectId) -> StorageResult<bool>;

    // === Chapters ===

    /// Insert a chapter at the end of its project, returning it with the
    /// assigned `order_index`. Appends are serialized per store.
    fn append_chapter(&self, chapter: &Chapter) -> StorageResult<Chapter>;

    fn load_chapter(&self, id: &ChapterId) -> StorageResult<Option<Chapter>>;

    /// All chapters of a project in `order_index` order
    fn list_chapters(&self, project_id: &ProjectId) -> StorageResult<Vec<Chapter>>;

    /// Persist title, content, word count, notes and completion. Never
    /// touches `order_index`.
    fn update_chapter(&self, chapter: &Chapter) -> StorageResult<bool>;

    /// Atomically delete a chapter (and its versions) and shift every later
    /// chapter of the project down by one.
    fn delete_chapter(&self, id: &ChapterId) -> StorageResult<Option<ChapterRemoval>>;

    /// Atomically assign `position + 1` to each listed chapter of the project.
    /// Ids not in the project are skipped. Returns the number of chapters moved.
    fn reorder_chapters(&self, project_id: &ProjectId, order: &[ChapterId]) -> StorageResult<usize>;

    // === Versions ===

    fn insert_version(&self, version: &Version) -> StorageResult<()>;

    fn load_version(&self, id: &VersionId) -> StorageResult<Option<Version>>;

    /// Versions of a chapter, newest first, without content
    fn list_versions(&self, chapter_id: &ChapterId) -> StorageResult<Vec<VersionSummary>>;

    /// Atomically snapshot the owning chapter's current state under
    /// `safety_description`, then overwrite the chapter with the version's
    /// content and word count. `None` when the version or chapter is gone.
    fn restore_version(&self, id: &VersionId, safety_description: &str) -> StorageResult<Option<Restoration>>;

    // === Entities ===

    /// Create or update an entity
    fn save_entity(&self, entity: &CodexEntity) -> StorageResult<()>;

    fn load_entity(&self, id: &EntityId) -> StorageResult<Option<CodexEntity>>;

    fn find_entities(&self, project_id: &ProjectId, filter: &EntityFilter) -> StorageResult<Vec<CodexEntity>>;

    /// Atomically delete an entity and every relationship incident on it.
    /// Returns the number of relationships removed, `None` if no such entity.
    fn delete_entity(&self, id: &EntityId) -> StorageResult<Option<usize>>;

    // === Relationships ===

    /// Insert all edges in one transaction; a uniqueness violation on any
    /// edge leaves none of them persisted.
    fn insert_relationships(&self, relationships: &[Relationship]) -> StorageResult<()>;

    fn load_relationship(&self, id: &RelationshipId) -> StorageResult<Option<Relationship>>;

    fn find_relationship(&self, key: RelationshipKey<'_>) -> StorageResult<Option<Relationship>>;

    /// Persist type, description and strength
    fn update_relationship(&self, relationship: &Relationship) -> StorageResult<bool>;

    fn delete_relationship(&self, id: &RelationshipId) -> StorageResult<bool>;

    /// Edges where the entity is source or target
    fn relationships_for_entity(&self, entity_id: &EntityId) -> StorageResult<Vec<Relationship>>;

    fn list_relationships(&self, project_id: &ProjectId) -> StorageResult<Vec<Relationship>>;

    /// Entities matching `filter` and the edges with both endpoints among them
    fn load_codex(&self, project_id: &ProjectId, filter: &EntityFilter) -> StorageResult<CodexSnapshot>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: ManuscriptStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
