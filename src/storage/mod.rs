//! Storage backends
//!
//! Persistence goes through the `ManuscriptStore` trait. The bundled
//! implementation is `SqliteStore`.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    ChapterRemoval, CodexSnapshot, EntityFilter, ManuscriptStore, OpenStore, Restoration,
    StorageError, StorageResult,
};
