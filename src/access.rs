//! Project ownership gate
//!
//! Every operation resolves its project through an `OwnershipCheck` before
//! reading or writing chapter, version, entity or relationship state.

use crate::error::{ManuscriptError, ManuscriptResult};
use crate::model::{Project, ProjectId, UserId};
use crate::storage::ManuscriptStore;
use std::sync::Arc;

/// Resolves a project and confirms the caller owns it
pub trait OwnershipCheck: Send + Sync {
    /// `ProjectNotFound` if the project does not exist, `Forbidden` if it
    /// belongs to someone else.
    fn authorize(&self, project_id: &ProjectId, caller: &UserId) -> ManuscriptResult<Project>;
}

/// Ownership check backed by the store's project records
#[derive(Clone)]
pub struct StoreOwnership {
    store: Arc<dyn ManuscriptStore>,
}

impl StoreOwnership {
    pub fn new(store: Arc<dyn ManuscriptStore>) -> Self {
        Self { store }
    }
}

impl OwnershipCheck for StoreOwnership {
    fn authorize(&self, project_id: &ProjectId, caller: &UserId) -> ManuscriptResult<Project> {
        let project = self
            .store
            .load_project(project_id)?
            .ok_or_else(|| ManuscriptError::ProjectNotFound(project_id.clone()))?;

        if !project.is_owned_by(caller) {
            tracing::debug!(project = %project_id, caller = %caller, "ownership check failed");
            return Err(ManuscriptError::Forbidden(project_id.clone()));
        }
        Ok(project)
    }
}
