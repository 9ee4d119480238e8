//! Persisted records and the views built from them

mod chapter;
mod content;
mod entity;
mod ids;
mod listing;
mod project;
mod relationship;
mod version;

pub use chapter::{Chapter, ChapterPatch};
pub use content::{word_count, Block, Content, Document};
pub use entity::{AttributeValue, Attributes, CodexEntity, EntityPatch, EntityType, NewEntity};
pub use ids::{ChapterId, EntityId, ProjectId, RelationshipId, UserId, VersionId};
pub use listing::Listing;
pub use project::Project;
pub use relationship::{
    CreatedRelationships, Direction, EndpointSummary, EntityRelationshipView, NewRelationship,
    Relationship, RelationshipKey, RelationshipPatch, RelationshipView, DEFAULT_STRENGTH,
    MAX_STRENGTH, MIN_STRENGTH,
};
pub use version::{default_description, Version, VersionSummary, PRE_RESTORE_DESCRIPTION};
