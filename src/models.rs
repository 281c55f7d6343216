use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type WordbookId = i32;
pub type ChapterId = i32;
pub type WordId = i32;
pub type TagId = i32;

/// Anything mirrored by the cache, identified by its server-assigned id.
pub trait Entity {
    fn id(&self) -> i32;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wordbook {
    pub id: WordbookId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub wordbook_id: WordbookId,
    pub name: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub chapter_id: ChapterId,
    pub source: String,
    pub translation: String,
    #[serde(default)]
    pub note: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Word {
    pub fn tag_ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|t| t.id).collect()
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }
}

impl Entity for Wordbook {
    fn id(&self) -> i32 {
        self.id
    }
}

impl Entity for Chapter {
    fn id(&self) -> i32 {
        self.id
    }
}

impl Entity for Word {
    fn id(&self) -> i32 {
        self.id
    }
}

impl Entity for Tag {
    fn id(&self) -> i32 {
        self.id
    }
}

// Drafts and patches. `None` fields are left out of the request body so the
// server only touches what the caller set.

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewWordbook {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WordbookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewChapter {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChapterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewWord {
    pub source: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TagPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Result body of the batch word endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    #[serde(default)]
    pub affected: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Original,
    Translation,
    Bilingual,
}

impl DisplayMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "original" => Some(Self::Original),
            "translation" => Some(Self::Translation),
            "bilingual" => Some(Self::Bilingual),
            _ => None,
        }
    }
}
