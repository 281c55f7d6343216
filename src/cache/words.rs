use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{NotebookCache, Words};
use crate::error::{ErrorKind, RemoteError, RemoteResult};
use crate::gateway::{self, Gateway, Method};
use crate::models::{BatchOutcome, ChapterId, NewWord, TagId, Word, WordId, WordPatch};
use crate::view::{self, DisplayOrder};

#[derive(Debug, Serialize)]
struct TagSetBody<'a> {
    tag_ids: &'a [TagId],
}

#[derive(Debug, Serialize)]
struct BatchDeleteBody<'a> {
    word_ids: &'a [WordId],
}

#[derive(Debug, Serialize)]
struct BatchTagsBody<'a> {
    word_ids: &'a [WordId],
    add_tag_ids: &'a [TagId],
    remove_tag_ids: &'a [TagId],
}

impl<G: Gateway> NotebookCache<G> {
    pub fn words(&self, chapter_id: ChapterId) -> Option<Vec<Word>> {
        self.words.mirror(chapter_id)
    }

    /// Replaces the chapter's word mirror and discards any shuffled order.
    pub async fn list_words(&self, chapter_id: ChapterId) -> RemoteResult<Vec<Word>> {
        let words = self.words.list(&self.gateway, chapter_id).await?;
        self.view.write().orders.remove(&chapter_id);
        Ok(words)
    }

    pub async fn create_word(&self, chapter_id: ChapterId, draft: &NewWord) -> RemoteResult<Word> {
        self.words.create(&self.gateway, chapter_id, draft).await
    }

    pub async fn update_word(
        &self,
        chapter_id: ChapterId,
        word_id: WordId,
        patch: &WordPatch,
    ) -> RemoteResult<Word> {
        self.words
            .update(&self.gateway, chapter_id, word_id, patch)
            .await
    }

    pub async fn delete_word(&self, chapter_id: ChapterId, word_id: WordId) -> RemoteResult<()> {
        self.words.delete(&self.gateway, chapter_id, word_id).await
    }

    // ========== Tag association ==========

    /// Adds `tag_id` to the word's mirrored tag set and submits the full set.
    ///
    /// Returns `Ok(None)` without calling the service when the word is not in
    /// the mirror. The submitted set is only as fresh as the mirror: a change
    /// made elsewhere since the last list is overwritten.
    pub async fn attach_tag(
        &self,
        chapter_id: ChapterId,
        word_id: WordId,
        tag_id: TagId,
    ) -> RemoteResult<Option<Word>> {
        self.ensure_known_tags(&[tag_id])?;
        let Some(word) = self.words.find(chapter_id, word_id) else {
            debug!(chapter_id, word_id, tag_id, "attach skipped, word not in mirror");
            return Ok(None);
        };
        let mut tag_ids = word.tag_ids();
        if !tag_ids.contains(&tag_id) {
            tag_ids.push(tag_id);
        }
        self.submit_tag_set(chapter_id, word_id, &tag_ids).await.map(Some)
    }

    /// Removes `tag_id` from the word's mirrored tag set and submits the rest.
    pub async fn detach_tag(
        &self,
        chapter_id: ChapterId,
        word_id: WordId,
        tag_id: TagId,
    ) -> RemoteResult<Option<Word>> {
        let Some(word) = self.words.find(chapter_id, word_id) else {
            debug!(chapter_id, word_id, tag_id, "detach skipped, word not in mirror");
            return Ok(None);
        };
        let tag_ids: Vec<TagId> = word
            .tag_ids()
            .into_iter()
            .filter(|&id| id != tag_id)
            .collect();
        self.submit_tag_set(chapter_id, word_id, &tag_ids).await.map(Some)
    }

    /// Replaces the word's tag set with exactly `tag_ids`.
    pub async fn set_word_tags(
        &self,
        chapter_id: ChapterId,
        word_id: WordId,
        tag_ids: &[TagId],
    ) -> RemoteResult<Word> {
        self.ensure_known_tags(tag_ids)?;
        self.submit_tag_set(chapter_id, word_id, tag_ids).await
    }

    async fn submit_tag_set(
        &self,
        chapter_id: ChapterId,
        word_id: WordId,
        tag_ids: &[TagId],
    ) -> RemoteResult<Word> {
        let path = Words::tags_path(chapter_id, word_id);
        let updated: Word = gateway::send(&self.gateway, Method::Put, &path, &TagSetBody { tag_ids })
            .await
            .inspect_err(|err| warn!(chapter_id, word_id, error = %err, "tag set update failed"))?;
        self.words.replace_by_id(chapter_id, updated.clone());
        Ok(updated)
    }

    /// Rejects tag ids missing from a loaded tag mirror. With no tag mirror
    /// loaded there is nothing to check against and the service decides.
    fn ensure_known_tags(&self, tag_ids: &[TagId]) -> RemoteResult<()> {
        let Some(tags) = self.tags.mirror(()) else {
            return Ok(());
        };
        match tag_ids.iter().find(|id| !tags.iter().any(|t| t.id == **id)) {
            Some(unknown) => Err(RemoteError::local(
                ErrorKind::ValidationError,
                format!("unknown tag id {unknown}"),
            )),
            None => Ok(()),
        }
    }

    // ========== Batch ==========

    /// Deletes several words in one request and filters them out locally.
    pub async fn batch_delete_words(
        &self,
        chapter_id: ChapterId,
        word_ids: &[WordId],
    ) -> RemoteResult<BatchOutcome> {
        let body = gateway::encode(&BatchDeleteBody { word_ids })?;
        let response = self
            .gateway
            .request(Method::Delete, &Words::batch_path(chapter_id), Some(body))
            .await
            .inspect_err(|err| warn!(chapter_id, error = %err, "batch delete failed"))?;
        let outcome = batch_outcome(response)?;
        let removed = self.words.remove_ids(chapter_id, word_ids);
        debug!(chapter_id, removed, affected = outcome.affected, "batch delete reconciled");
        Ok(outcome)
    }

    /// Adds and removes tags on several words, then re-lists the chapter.
    ///
    /// Each word may have started from a different tag set, so the result is
    /// taken from a fresh list rather than computed locally.
    pub async fn batch_update_tags(
        &self,
        chapter_id: ChapterId,
        word_ids: &[WordId],
        add_tag_ids: &[TagId],
        remove_tag_ids: &[TagId],
    ) -> RemoteResult<Vec<Word>> {
        self.ensure_known_tags(add_tag_ids)?;
        let body = BatchTagsBody {
            word_ids,
            add_tag_ids,
            remove_tag_ids,
        };
        gateway::execute(
            &self.gateway,
            Method::Post,
            &Words::batch_tags_path(chapter_id),
            Some(gateway::encode(&body)?),
        )
        .await
        .inspect_err(|err| warn!(chapter_id, error = %err, "batch tag update failed"))?;
        self.list_words(chapter_id).await
    }

    // ========== Derived views ==========

    /// The chapter's words in display order, narrowed by the tag filter.
    /// Recomputed from the mirror on every call.
    pub fn filtered_words(&self, chapter_id: ChapterId) -> Vec<Word> {
        let words = self.words.mirror(chapter_id).unwrap_or_default();
        let state = self.view.read();
        let ordered = match state.orders.get(&chapter_id) {
            Some(order) => order.apply(&words),
            None => words,
        };
        view::filter_words(&ordered, &state.filter)
    }

    /// Shuffles the chapter's display order until its next list.
    pub fn shuffle_words(&self, chapter_id: ChapterId) {
        let words = self.words.mirror(chapter_id).unwrap_or_default();
        let order = DisplayOrder::shuffled(&words);
        self.view.write().orders.insert(chapter_id, order);
    }
}

fn batch_outcome(response: Value) -> RemoteResult<BatchOutcome> {
    if response.is_null() {
        return Ok(BatchOutcome::default());
    }
    gateway::decode(response)
}
