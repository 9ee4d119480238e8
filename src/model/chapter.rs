//! Chapters: ordered units of manuscript content

use super::content::{word_count, Content};
use super::ids::{ChapterId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chapter of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub project_id: ProjectId,
    pub title: String,
    /// 1-based position within the project, assigned by the store
    pub order_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Derived from `content`; never set directly
    pub word_count: u32,
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    /// Create an unplaced chapter; the store assigns `order_index` on insert.
    pub fn new(project_id: ProjectId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ChapterId::new(),
            project_id,
            title: title.into(),
            order_index: 0,
            content: None,
            word_count: 0,
            is_complete: false,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.set_content(Some(content));
        self
    }

    /// Replace the content and recompute the word count
    pub fn set_content(&mut self, content: Option<Content>) {
        self.word_count = word_count(content.as_ref());
        self.content = content;
    }
}

/// Field patch for a chapter. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_complete: Option<bool>,
}

impl ChapterPatch {
    /// True when the patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.notes.is_none() && self.is_complete.is_none()
    }
}
