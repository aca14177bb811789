// src/model.rs
//! Entities held by the content store and the shapes the API serializes.
//! JSON uses camelCase so the existing web client can consume it unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    /// Dedup key: unique among stored articles.
    pub original_url: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source_id: String,
    pub source_name: String,
    pub category_id: Option<u64>,
    pub ai_processed: bool,
    pub created_at: DateTime<Utc>,
    pub view_count: u64,
}

/// Insert payload; id, slug, timestamps and counters are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub original_url: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source_id: String,
    pub source_name: String,
    pub category_id: Option<u64>,
}

/// Partial update: only `Some` fields are merged into the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<u64>,
    pub ai_processed: Option<bool>,
}

impl ArticlePatch {
    pub fn ai_processed(done: bool) -> Self {
        Self {
            ai_processed: Some(done),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, a: &mut Article) {
        if let Some(v) = self.title {
            a.title = v;
        }
        if let Some(v) = self.content {
            a.content = v;
        }
        if let Some(v) = self.summary {
            a.summary = v;
        }
        if let Some(v) = self.image_url {
            a.image_url = Some(v);
        }
        if let Some(v) = self.category_id {
            a.category_id = Some(v);
        }
        if let Some(v) = self.ai_processed {
            a.ai_processed = v;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: String,
}

impl NewCategory {
    /// Name-only category; slug derived from the name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slugify(name),
            description: String::new(),
            image_url: String::new(),
        }
    }
}

/// Category as listed by the API, with its current article count.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub article_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleTag {
    pub id: u64,
    pub article_id: u64,
    pub tag_id: u64,
}

/// Article with its category and tags resolved, as served to readers.
/// A view of an article still being enriched is valid: no category yet,
/// `aiProcessed == false`, tags possibly empty.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: Article,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
}

/// Limit/offset window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 20;
    pub const MAX_LIMIT: usize = 100;

    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset,
        }
    }

    pub fn from_query(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self::new(
            limit.unwrap_or(Self::DEFAULT_LIMIT),
            offset.unwrap_or_default(),
        )
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}

/// URL-safe slug: lowercase, non-word characters dropped, whitespace/underscore runs -> `-`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }
    out
}
