//! Entity cache
//!
//! Local mirrors of the notebook service's collections, one per entity type
//! and parent scope:
//! - wordbooks (single scope)
//! - chapters of a wordbook
//! - words of a chapter
//! - tags (single scope, per user)
//!
//! Reconciliation rules: a successful `list` replaces the scope's mirror; a
//! successful single-entity mutation touches exactly one entry by id; any
//! failure leaves the mirror exactly as it was.

pub mod resources;
pub mod store;
mod words;

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::RemoteResult;
use crate::gateway::{self, Gateway};
use crate::models::{
    Chapter, ChapterId, ChapterPatch, DisplayMode, NewChapter, NewTag, NewWordbook, Tag, TagId,
    TagPatch, Wordbook, WordbookId, WordbookPatch,
};
use crate::view::{DisplayOrder, TagFilter};

pub use resources::{Chapters, Tags, Words, Wordbooks};
pub use store::{EntityStore, Resource};

#[derive(Debug, Default)]
struct ViewState {
    filter: TagFilter,
    display_mode: DisplayMode,
    orders: HashMap<ChapterId, DisplayOrder>,
}

pub struct NotebookCache<G> {
    gateway: G,
    wordbooks: EntityStore<Wordbooks>,
    chapters: EntityStore<Chapters>,
    words: EntityStore<Words>,
    tags: EntityStore<Tags>,
    current_wordbook: RwLock<Option<Wordbook>>,
    view: RwLock<ViewState>,
}

impl<G: Gateway> NotebookCache<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            wordbooks: EntityStore::new(),
            chapters: EntityStore::new(),
            words: EntityStore::new(),
            tags: EntityStore::new(),
            current_wordbook: RwLock::new(None),
            view: RwLock::new(ViewState::default()),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    // ========== Wordbooks ==========

    pub fn wordbooks(&self) -> Option<Vec<Wordbook>> {
        self.wordbooks.mirror(())
    }

    pub fn current_wordbook(&self) -> Option<Wordbook> {
        self.current_wordbook.read().clone()
    }

    pub async fn list_wordbooks(&self) -> RemoteResult<Vec<Wordbook>> {
        self.wordbooks.list(&self.gateway, ()).await
    }

    /// Loads one wordbook as the current one and refreshes its mirror entry.
    pub async fn fetch_wordbook(&self, id: WordbookId) -> RemoteResult<Wordbook> {
        let path = Wordbooks::item_path((), id);
        let wordbook: Wordbook = gateway::get(&self.gateway, &path).await?;
        self.wordbooks.replace_by_id((), wordbook.clone());
        *self.current_wordbook.write() = Some(wordbook.clone());
        Ok(wordbook)
    }

    pub async fn create_wordbook(&self, draft: &NewWordbook) -> RemoteResult<Wordbook> {
        self.wordbooks.create(&self.gateway, (), draft).await
    }

    pub async fn update_wordbook(
        &self,
        id: WordbookId,
        patch: &WordbookPatch,
    ) -> RemoteResult<Wordbook> {
        let updated = self.wordbooks.update(&self.gateway, (), id, patch).await?;
        let mut current = self.current_wordbook.write();
        if current.as_ref().is_some_and(|wb| wb.id == id) {
            *current = Some(updated.clone());
        }
        Ok(updated)
    }

    /// Deletes a wordbook and drops every mirror scoped beneath it.
    pub async fn delete_wordbook(&self, id: WordbookId) -> RemoteResult<()> {
        self.wordbooks.delete(&self.gateway, (), id).await?;

        {
            let mut current = self.current_wordbook.write();
            if current.as_ref().is_some_and(|wb| wb.id == id) {
                *current = None;
            }
        }

        if let Some(chapters) = self.chapters.mirror(id) {
            for chapter in chapters {
                self.drop_chapter_views(chapter.id);
            }
        }
        self.chapters.invalidate(id);
        Ok(())
    }

    // ========== Chapters ==========

    pub fn chapters(&self, wordbook_id: WordbookId) -> Option<Vec<Chapter>> {
        self.chapters.mirror(wordbook_id)
    }

    pub async fn list_chapters(&self, wordbook_id: WordbookId) -> RemoteResult<Vec<Chapter>> {
        let chapters = self.chapters.list(&self.gateway, wordbook_id).await?;
        for chapter in chapters.iter().filter(|c| c.wordbook_id != wordbook_id) {
            warn!(
                wordbook_id,
                chapter_id = chapter.id,
                owner = chapter.wordbook_id,
                "chapter listed under a different wordbook"
            );
        }
        Ok(chapters)
    }

    pub async fn create_chapter(
        &self,
        wordbook_id: WordbookId,
        draft: &NewChapter,
    ) -> RemoteResult<Chapter> {
        self.chapters.create(&self.gateway, wordbook_id, draft).await
    }

    pub async fn update_chapter(
        &self,
        wordbook_id: WordbookId,
        chapter_id: ChapterId,
        patch: &ChapterPatch,
    ) -> RemoteResult<Chapter> {
        self.chapters
            .update(&self.gateway, wordbook_id, chapter_id, patch)
            .await
    }

    pub async fn delete_chapter(
        &self,
        wordbook_id: WordbookId,
        chapter_id: ChapterId,
    ) -> RemoteResult<()> {
        self.chapters
            .delete(&self.gateway, wordbook_id, chapter_id)
            .await?;
        self.drop_chapter_views(chapter_id);
        Ok(())
    }

    fn drop_chapter_views(&self, chapter_id: ChapterId) {
        self.words.invalidate(chapter_id);
        self.view.write().orders.remove(&chapter_id);
    }

    // ========== Tags ==========

    pub fn tags(&self) -> Option<Vec<Tag>> {
        self.tags.mirror(())
    }

    /// Replaces the tag mirror, then prunes tags that no longer exist from
    /// every loaded word mirror and from the current selection.
    pub async fn list_tags(&self) -> RemoteResult<Vec<Tag>> {
        let tags = self.tags.list(&self.gateway, ()).await?;
        let known: HashSet<TagId> = tags.iter().map(|t| t.id).collect();

        let mut pruned = 0usize;
        self.words.update_all(|word| {
            let before = word.tags.len();
            word.tags.retain(|t| known.contains(&t.id));
            pruned += before - word.tags.len();
        });
        if pruned > 0 {
            debug!(pruned, "removed stale tag associations from word mirrors");
        }
        self.view.write().filter.retain_known(&known);

        Ok(tags)
    }

    pub async fn create_tag(&self, draft: &NewTag) -> RemoteResult<Tag> {
        self.tags.create(&self.gateway, (), draft).await
    }

    pub async fn update_tag(&self, id: TagId, patch: &TagPatch) -> RemoteResult<Tag> {
        self.tags.update(&self.gateway, (), id, patch).await
    }

    /// Word tag sets keep the id until the next word or tag list.
    pub async fn delete_tag(&self, id: TagId) -> RemoteResult<()> {
        self.tags.delete(&self.gateway, (), id).await?;
        let mut view = self.view.write();
        if view.filter.contains(id) {
            view.filter.toggle(id);
        }
        Ok(())
    }

    // ========== View state ==========

    pub fn selected_tags(&self) -> Vec<TagId> {
        self.view.read().filter.ids()
    }

    pub fn toggle_tag_filter(&self, tag_id: TagId) -> bool {
        self.view.write().filter.toggle(tag_id)
    }

    pub fn clear_tag_filters(&self) {
        self.view.write().filter.clear();
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.view.read().display_mode
    }

    pub fn set_display_mode(&self, mode: DisplayMode) {
        self.view.write().display_mode = mode;
    }
}
