//! Domain errors and their caller-facing classification

use crate::config::Environment;
use crate::model::{ChapterId, EntityId, ProjectId, RelationshipId, VersionId};
use crate::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Stable failure classes reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    BadRequest,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in manuscript operations
#[derive(Debug, Error)]
pub enum ManuscriptError {
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Chapter not found: {0}")]
    ChapterNotFound(ChapterId),

    #[error("Version not found: {0}")]
    VersionNotFound(VersionId),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Relationship not found: {0}")]
    RelationshipNotFound(RelationshipId),

    #[error("Access to project {0} denied")]
    Forbidden(ProjectId),

    #[error("Entity {entity} does not belong to project {project}")]
    EntityOutsideProject { entity: EntityId, project: ProjectId },

    #[error("Relationship '{relationship_type}' from {source_id} to {target_id} already exists")]
    DuplicateRelationship {
        source_id: EntityId,
        target_id: EntityId,
        relationship_type: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ManuscriptError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ManuscriptError::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ManuscriptError::ProjectNotFound(_)
            | ManuscriptError::ChapterNotFound(_)
            | ManuscriptError::VersionNotFound(_)
            | ManuscriptError::EntityNotFound(_)
            | ManuscriptError::RelationshipNotFound(_) => ErrorKind::NotFound,
            ManuscriptError::Forbidden(_) => ErrorKind::Forbidden,
            ManuscriptError::EntityOutsideProject { .. }
            | ManuscriptError::DuplicateRelationship { .. }
            | ManuscriptError::InvalidInput(_) => ErrorKind::BadRequest,
            // Uniqueness indexes reject writes that pre-checks could not see
            ManuscriptError::Storage(StorageError::Constraint(_)) => ErrorKind::BadRequest,
            ManuscriptError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand to the caller. Internal failures only carry
    /// storage detail in development.
    pub fn public_message(&self, environment: Environment) -> String {
        match (self.kind(), environment) {
            (ErrorKind::Internal, Environment::Production) => "Internal error".to_string(),
            (ErrorKind::BadRequest, Environment::Production)
                if matches!(self, ManuscriptError::Storage(_)) =>
            {
                "Conflicts with an existing record".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub fn report(&self, environment: Environment) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.public_message(environment),
        }
    }
}

/// Serializable failure: stable kind plus human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

/// Result type for manuscript operations
pub type ManuscriptResult<T> = Result<T, ManuscriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(ManuscriptError::ChapterNotFound("c".into()).kind(), ErrorKind::NotFound);
        assert_eq!(ManuscriptError::Forbidden("p".into()).kind(), ErrorKind::Forbidden);
        assert_eq!(ManuscriptError::invalid("title is required").kind(), ErrorKind::BadRequest);
        assert_eq!(
            ManuscriptError::EntityOutsideProject {
                entity: "e".into(),
                project: "p".into()
            }
            .kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            ManuscriptError::Storage(StorageError::Constraint("UNIQUE".into())).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            ManuscriptError::Storage(StorageError::LockPoisoned).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn internal_detail_hidden_in_production() {
        let err = ManuscriptError::Storage(StorageError::DateParse("bad timestamp in chapters".into()));

        assert_eq!(err.public_message(Environment::Production), "Internal error");
        assert!(err
            .public_message(Environment::Development)
            .contains("bad timestamp in chapters"));
    }

    #[test]
    fn domain_messages_are_kept_in_production() {
        let err = ManuscriptError::DuplicateRelationship {
            source_id: "a".into(),
            target_id: "b".into(),
            relationship_type: "parentOf".into(),
        };
        let report = err.report(Environment::Production);
        assert_eq!(report.kind, ErrorKind::BadRequest);
        assert!(report.message.contains("already exists"));
    }

    #[test]
    fn constraint_detail_hidden_in_production() {
        let err = ManuscriptError::Storage(StorageError::Constraint(
            "UNIQUE constraint failed: relationships.project_id".into(),
        ));
        assert_eq!(err.public_message(Environment::Production), "Conflicts with an existing record");
    }
}
