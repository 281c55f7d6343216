use super::store::Resource;
use crate::models::{
    Chapter, ChapterId, ChapterPatch, NewChapter, NewTag, NewWord, NewWordbook, Tag, TagPatch,
    Word, WordPatch, Wordbook, WordbookId, WordbookPatch,
};

pub struct Wordbooks;

impl Resource for Wordbooks {
    type Entity = Wordbook;
    type Scope = ();
    type Draft = NewWordbook;
    type Patch = WordbookPatch;

    const NAME: &'static str = "wordbook";

    fn collection_path(_: ()) -> String {
        "/wordbooks".to_string()
    }
}

pub struct Chapters;

impl Resource for Chapters {
    type Entity = Chapter;
    type Scope = WordbookId;
    type Draft = NewChapter;
    type Patch = ChapterPatch;

    const NAME: &'static str = "chapter";

    fn collection_path(wordbook_id: WordbookId) -> String {
        format!("/wordbooks/{wordbook_id}/chapters")
    }
}

pub struct Words;

impl Resource for Words {
    type Entity = Word;
    type Scope = ChapterId;
    type Draft = NewWord;
    type Patch = WordPatch;

    const NAME: &'static str = "word";

    fn collection_path(chapter_id: ChapterId) -> String {
        format!("/chapters/{chapter_id}/words")
    }
}

impl Words {
    pub fn tags_path(chapter_id: ChapterId, word_id: i32) -> String {
        format!("{}/tags", Self::item_path(chapter_id, word_id))
    }

    pub fn batch_path(chapter_id: ChapterId) -> String {
        format!("{}/batch", Self::collection_path(chapter_id))
    }

    pub fn batch_tags_path(chapter_id: ChapterId) -> String {
        format!("{}/batch/tags", Self::collection_path(chapter_id))
    }
}

pub struct Tags;

impl Resource for Tags {
    type Entity = Tag;
    type Scope = ();
    type Draft = NewTag;
    type Patch = TagPatch;

    const NAME: &'static str = "tag";

    fn collection_path(_: ()) -> String {
        "/tags".to_string()
    }
}
