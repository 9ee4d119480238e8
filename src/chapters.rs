//! Chapter ordering and editing within one project
//!
//! Keeps `order_index` dense: appends take `max + 1`, deletes shift every
//! later chapter down by one, and reorders renumber from a caller-supplied
//! sequence. Each of these runs as a single store transaction.

use crate::error::{ManuscriptError, ManuscriptResult};
use crate::model::{Chapter, ChapterId, ChapterPatch, Content, Listing, ProjectId};
use crate::storage::{ChapterRemoval, ManuscriptStore};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Chapter operations scoped to a single, already-authorized project
pub struct ChapterOrdering<'a> {
    store: &'a dyn ManuscriptStore,
    project_id: ProjectId,
}

impl<'a> ChapterOrdering<'a> {
    pub fn new(store: &'a dyn ManuscriptStore, project_id: ProjectId) -> Self {
        Self { store, project_id }
    }

    /// Create a chapter at the end of the project
    pub fn create_chapter(
        &self,
        title: &str,
        content: Option<Content>,
        notes: Option<String>,
    ) -> ManuscriptResult<Chapter> {
        let title = require_title(title)?;

        let mut chapter = Chapter::new(self.project_id.clone(), title);
        chapter.set_content(content);
        chapter.notes = notes;

        let placed = self.store.append_chapter(&chapter)?;
        info!(
            project = %self.project_id,
            chapter = %placed.id,
            order_index = placed.order_index,
            word_count = placed.word_count,
            "chapter appended"
        );
        Ok(placed)
    }

    pub fn get_chapter(&self, id: &ChapterId) -> ManuscriptResult<Chapter> {
        self.store
            .load_chapter(id)?
            .filter(|c| c.project_id == self.project_id)
            .ok_or_else(|| ManuscriptError::ChapterNotFound(id.clone()))
    }

    /// Chapters in reading order
    pub fn list_chapters(&self) -> ManuscriptResult<Listing<Chapter>> {
        let chapters = self.store.list_chapters(&self.project_id)?;
        debug!(project = %self.project_id, count = chapters.len(), "listed chapters");
        Ok(Listing::new(chapters))
    }

    /// Patch title, content, notes or completion. A content change
    /// recomputes the word count; the position is never patched here.
    pub fn update_chapter(&self, id: &ChapterId, patch: ChapterPatch) -> ManuscriptResult<Chapter> {
        let mut chapter = self.get_chapter(id)?;
        if patch.is_empty() {
            return Ok(chapter);
        }

        if let Some(title) = patch.title {
            chapter.title = require_title(&title)?.to_string();
        }
        if let Some(content) = patch.content {
            chapter.set_content(Some(content));
        }
        if let Some(notes) = patch.notes {
            chapter.notes = Some(notes);
        }
        if let Some(is_complete) = patch.is_complete {
            chapter.is_complete = is_complete;
        }
        chapter.updated_at = Utc::now();

        if !self.store.update_chapter(&chapter)? {
            return Err(ManuscriptError::ChapterNotFound(id.clone()));
        }
        debug!(chapter = %id, word_count = chapter.word_count, "chapter updated");
        Ok(chapter)
    }

    /// Delete a chapter with its versions and close the gap it leaves
    pub fn delete_chapter(&self, id: &ChapterId) -> ManuscriptResult<ChapterRemoval> {
        // Confirms project membership before anything is removed
        self.get_chapter(id)?;

        let removal = self
            .store
            .delete_chapter(id)?
            .ok_or_else(|| ManuscriptError::ChapterNotFound(id.clone()))?;

        info!(
            project = %self.project_id,
            chapter = %id,
            order_index = removal.order_index,
            renumbered = removal.renumbered,
            "chapter deleted"
        );
        Ok(removal)
    }

    /// Assign position `i + 1` to the chapter at `order[i]`.
    ///
    /// Ids that do not belong to the project are skipped but still take up
    /// their position. The sequence is not checked for completeness; a
    /// chapter left out keeps its index, and if that index is claimed by a
    /// listed chapter the store rejects the whole reorder.
    pub fn reorder(&self, order: &[ChapterId]) -> ManuscriptResult<Listing<Chapter>> {
        let moved = self.store.reorder_chapters(&self.project_id, order)?;

        let mut distinct: Vec<&ChapterId> = order.iter().collect();
        distinct.sort();
        distinct.dedup();
        if moved < distinct.len() {
            warn!(
                project = %self.project_id,
                supplied = distinct.len(),
                moved,
                "reorder skipped ids outside the project"
            );
        }
        info!(project = %self.project_id, moved, "chapters reordered");

        self.list_chapters()
    }
}

fn require_title(title: &str) -> ManuscriptResult<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ManuscriptError::invalid("chapter title is required"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{Project, UserId};
    use crate::storage::{OpenStore, SqliteStore};

    fn setup() -> (SqliteStore, ProjectId) {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = Project::new(UserId::from("me"), "Book");
        store.save_project(&project).unwrap();
        (store, project.id)
    }

    fn titles(listing: &Listing<Chapter>) -> Vec<(&str, u32)> {
        listing
            .items
            .iter()
            .map(|c| (c.title.as_str(), c.order_index))
            .collect()
    }

    #[test]
    fn create_appends_and_sizes_content() {
        let (store, project) = setup();
        let chapters = ChapterOrdering::new(&store, project);

        let first = chapters
            .create_chapter("Arrival", Some(Content::plain("It was raining.")), None)
            .unwrap();
        let second = chapters.create_chapter("  Departure ", None, Some("rewrite".into())).unwrap();

        assert_eq!(first.order_index, 1);
        assert_eq!(first.word_count, 3);
        assert_eq!(second.order_index, 2);
        assert_eq!(second.title, "Departure");
        assert_eq!(second.word_count, 0);
    }

    #[test]
    fn blank_title_is_rejected() {
        let (store, project) = setup();
        let err = ChapterOrdering::new(&store, project)
            .create_chapter("   ", None, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn delete_middle_shifts_only_later_chapters() {
        let (store, project) = setup();
        let chapters = ChapterOrdering::new(&store, project);
        let ids: Vec<ChapterId> = ["a", "b", "c", "d"]
            .iter()
            .map(|t| chapters.create_chapter(t, None, None).unwrap().id)
            .collect();

        let removal = chapters.delete_chapter(&ids[2]).unwrap();
        assert_eq!(removal.order_index, 3);

        let listing = chapters.list_chapters().unwrap();
        assert_eq!(listing.count, 3);
        assert_eq!(titles(&listing), vec![("a", 1), ("b", 2), ("d", 3)]);
    }

    #[test]
    fn delete_unknown_chapter_is_not_found() {
        let (store, project) = setup();
        let err = ChapterOrdering::new(&store, project)
            .delete_chapter(&ChapterId::from("ghost"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn chapter_of_another_project_is_not_found() {
        let (store, project) = setup();
        let other = Project::new(UserId::from("me"), "Other");
        store.save_project(&other).unwrap();
        let foreign = ChapterOrdering::new(&store, other.id)
            .create_chapter("x", None, None)
            .unwrap();

        let err = ChapterOrdering::new(&store, project)
            .delete_chapter(&foreign.id)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(store.load_chapter(&foreign.id).unwrap().is_some());
    }

    #[test]
    fn update_recomputes_word_count_and_keeps_position() {
        let (store, project) = setup();
        let chapters = ChapterOrdering::new(&store, project);
        chapters.create_chapter("a", None, None).unwrap();
        let b = chapters.create_chapter("b", None, None).unwrap();

        let updated = chapters
            .update_chapter(
                &b.id,
                ChapterPatch {
                    content: Some(Content::blocks(["one two", "three"])),
                    is_complete: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.word_count, 3);
        assert!(updated.is_complete);
        assert_eq!(updated.order_index, 2);
        assert_eq!(store.load_chapter(&b.id).unwrap().unwrap().word_count, 3);
    }

    #[test]
    fn empty_patch_leaves_chapter_untouched() {
        let (store, project) = setup();
        let chapters = ChapterOrdering::new(&store, project);
        let a = chapters.create_chapter("a", Some(Content::plain("kept")), None).unwrap();
        let before = store.load_chapter(&a.id).unwrap().unwrap();

        let after = chapters.update_chapter(&a.id, ChapterPatch::default()).unwrap();
        assert_eq!(after, before);
        assert_eq!(store.load_chapter(&a.id).unwrap().unwrap().updated_at, before.updated_at);
    }

    #[test]
    fn reorder_with_complete_sequence() {
        let (store, project) = setup();
        let chapters = ChapterOrdering::new(&store, project);
        let a = chapters.create_chapter("a", None, None).unwrap();
        let b = chapters.create_chapter("b", None, None).unwrap();
        let c = chapters.create_chapter("c", None, None).unwrap();

        let listing = chapters.reorder(&[b.id, c.id, a.id]).unwrap();
        assert_eq!(titles(&listing), vec![("b", 1), ("c", 2), ("a", 3)]);
    }

    #[test]
    fn reorder_conflicting_with_omitted_chapter_changes_nothing() {
        let (store, project) = setup();
        let chapters = ChapterOrdering::new(&store, project);
        let a = chapters.create_chapter("a", None, None).unwrap();
        chapters.create_chapter("b", None, None).unwrap();

        let err = chapters.reorder(&[ChapterId::from("unknown"), a.id]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(titles(&chapters.list_chapters().unwrap()), vec![("a", 1), ("b", 2)]);
    }
}
