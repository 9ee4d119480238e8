//! Immutable chapter snapshots

use super::chapter::Chapter;
use super::content::Content;
use super::ids::{ChapterId, ProjectId, VersionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Description attached to the snapshot captured right before a restore
pub const PRE_RESTORE_DESCRIPTION: &str = "Auto-saved before restore";

/// A point-in-time copy of a chapter's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub project_id: ProjectId,
    pub chapter_id: ChapterId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    pub word_count: u32,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Capture the chapter's current content and word count
    pub fn capture(chapter: &Chapter, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VersionId::new(),
            project_id: chapter.project_id.clone(),
            chapter_id: chapter.id.clone(),
            content: chapter.content.clone(),
            word_count: chapter.word_count,
            description: description.unwrap_or_else(|| default_description(now)),
            created_at: now,
        }
    }

    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            id: self.id.clone(),
            chapter_id: self.chapter_id.clone(),
            word_count: self.word_count,
            description: self.description.clone(),
            created_at: self.created_at,
        }
    }
}

/// Listing view of a version; content is fetched separately
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub id: VersionId,
    pub chapter_id: ChapterId,
    pub word_count: u32,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Label used when a snapshot is taken without a description
pub fn default_description(at: DateTime<Utc>) -> String {
    format!("Version saved {}", at.format("%Y-%m-%d %H:%M UTC"))
}
