//! Manuscript: chapter ordering, version history and story codex
//!
//! A storage-backed engine for long-form writing projects.
//!
//! # Core Concepts
//!
//! - **Chapters**: ordered units of a project, always numbered `1..=N`
//! - **Versions**: immutable snapshots of a chapter; restoring one first
//!   snapshots the current state
//! - **Codex**: typed entities (characters, locations, ...) connected by
//!   directed, weighted relationships
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use manuscript::{ManuscriptApi, OpenStore, SqliteStore, UserId};
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let api = ManuscriptApi::with_store(Arc::new(store));
//! let me = UserId::from("me");
//! let project = api.register_project(&me, "Novel").unwrap();
//! let chapter = api.create_chapter(&me, &project.id, "Opening", None, None).unwrap();
//! assert_eq!(chapter.order_index, 1);
//! ```

pub mod access;
pub mod api;
pub mod chapters;
pub mod codex;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod versions;

pub use access::{OwnershipCheck, StoreOwnership};
pub use api::ManuscriptApi;
pub use chapters::ChapterOrdering;
pub use codex::{CodexGraph, NetworkEdge, NetworkExport, NetworkNode};
pub use config::{default_db_path, Config, Environment};
pub use error::{ErrorKind, ErrorReport, ManuscriptError, ManuscriptResult};
pub use model::{
    word_count, AttributeValue, Attributes, Block, Chapter, ChapterId, ChapterPatch, CodexEntity,
    Content, CreatedRelationships, Direction, Document, EndpointSummary, EntityId, EntityPatch,
    EntityRelationshipView, EntityType, Listing, NewEntity, NewRelationship, Project, ProjectId,
    Relationship, RelationshipId, RelationshipPatch, RelationshipView, UserId, Version,
    VersionId, VersionSummary,
};
pub use storage::{ManuscriptStore, OpenStore, SqliteStore, StorageError, StorageResult};
pub use versions::{RestoreOutcome, VersionLog};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
