//! Version history for chapters
//!
//! Versions are append-only. A restore first captures the chapter as it is
//! now, so every restore can itself be undone.

use crate::error::{ManuscriptError, ManuscriptResult};
use crate::model::{
    Chapter, ChapterId, Listing, ProjectId, Version, VersionId, VersionSummary,
    PRE_RESTORE_DESCRIPTION,
};
use crate::storage::ManuscriptStore;
use serde::Serialize;
use tracing::{debug, info};

/// Result of restoring a version
#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    /// The chapter after the restore
    pub chapter: Chapter,
    /// Snapshot of the chapter taken just before it was overwritten
    pub safety_snapshot: VersionSummary,
    pub restored_from: VersionId,
}

/// Version operations scoped to a single, already-authorized project
pub struct VersionLog<'a> {
    store: &'a dyn ManuscriptStore,
    project_id: ProjectId,
}

impl<'a> VersionLog<'a> {
    pub fn new(store: &'a dyn ManuscriptStore, project_id: ProjectId) -> Self {
        Self { store, project_id }
    }

    fn chapter(&self, id: &ChapterId) -> ManuscriptResult<Chapter> {
        self.store
            .load_chapter(id)?
            .filter(|c| c.project_id == self.project_id)
            .ok_or_else(|| ManuscriptError::ChapterNotFound(id.clone()))
    }

    /// Capture the chapter's current content. A blank or missing
    /// description gets a dated default.
    pub fn snapshot(&self, chapter_id: &ChapterId, description: Option<String>) -> ManuscriptResult<Version> {
        let chapter = self.chapter(chapter_id)?;
        let description = description.filter(|d| !d.trim().is_empty());

        let version = Version::capture(&chapter, description);
        self.store.insert_version(&version)?;

        info!(
            chapter = %chapter_id,
            version = %version.id,
            word_count = version.word_count,
            "version captured"
        );
        Ok(version)
    }

    /// Versions of a chapter, newest first, without content
    pub fn list(&self, chapter_id: &ChapterId) -> ManuscriptResult<Listing<VersionSummary>> {
        self.chapter(chapter_id)?;
        let versions = self.store.list_versions(chapter_id)?;
        debug!(chapter = %chapter_id, count = versions.len(), "listed versions");
        Ok(Listing::new(versions))
    }

    /// A single version including its content
    pub fn get(&self, version_id: &VersionId) -> ManuscriptResult<Version> {
        self.store
            .load_version(version_id)?
            .filter(|v| v.project_id == self.project_id)
            .ok_or_else(|| ManuscriptError::VersionNotFound(version_id.clone()))
    }

    /// Put a version's content back on its chapter.
    ///
    /// The pre-restore snapshot and the overwrite commit together. The
    /// restored version is left untouched and can be restored again.
    pub fn restore(&self, version_id: &VersionId) -> ManuscriptResult<RestoreOutcome> {
        let target = self.get(version_id)?;
        self.chapter(&target.chapter_id)?;

        let restoration = self
            .store
            .restore_version(version_id, PRE_RESTORE_DESCRIPTION)?
            .ok_or_else(|| ManuscriptError::VersionNotFound(version_id.clone()))?;

        info!(
            chapter = %restoration.chapter.id,
            restored_from = %version_id,
            safety_snapshot = %restoration.safety_snapshot.id,
            "version restored"
        );
        Ok(RestoreOutcome {
            safety_snapshot: restoration.safety_snapshot.summary(),
            chapter: restoration.chapter,
            restored_from: version_id.clone(),
        })
    }
}
