//! The codex: narrative entities and the relationship graph between them
//!
//! `CodexGraph` is scoped to one project. Entity management lives in
//! `entities`, edge creation, lookup and maintenance in `relationships`, and
//! the visualization view in `network`.

mod entities;
mod network;
mod relationships;

pub use network::{NetworkEdge, NetworkExport, NetworkNode};

use crate::model::ProjectId;
use crate::storage::ManuscriptStore;

/// Codex operations scoped to a single, already-authorized project
pub struct CodexGraph<'a> {
    store: &'a dyn ManuscriptStore,
    project_id: ProjectId,
}

impl<'a> CodexGraph<'a> {
    pub fn new(store: &'a dyn ManuscriptStore, project_id: ProjectId) -> Self {
        Self { store, project_id }
    }
}
