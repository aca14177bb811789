// src/store.rs
//! In-memory content store: the single owner of articles, categories, tags
//! and article<->tag links. Every method takes the lock once and never awaits,
//! so each call is atomic with respect to every other store call.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::model::{
    slugify, Article, ArticlePatch, ArticleTag, ArticleView, Category, CategorySummary,
    NewArticle, NewCategory, Page, Tag,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },
    #[error("article with url {0} already exists")]
    DuplicateUrl(String),
    #[error("category {0} already exists")]
    DuplicateCategory(String),
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl StoreError {
    fn article(id: u64) -> Self {
        Self::NotFound {
            kind: "article",
            key: id.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Default)]
struct Tables {
    articles: BTreeMap<u64, Article>,
    categories: BTreeMap<u64, Category>,
    tags: BTreeMap<u64, Tag>,
    article_tags: BTreeMap<u64, ArticleTag>,
    // secondary indexes
    url_index: HashMap<String, u64>,
    article_slugs: HashMap<String, u64>,
    tag_slugs: HashMap<String, u64>,
    links: HashSet<(u64, u64)>,
    // id counters: monotonic, never reused
    next_article: u64,
    next_category: u64,
    next_tag: u64,
    next_link: u64,
}

fn bump(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Debug)]
pub struct ContentStore {
    inner: RwLock<Tables>,
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore {
    /// Store seeded with the starter taxonomy.
    pub fn new() -> Self {
        Self::with_categories(default_categories())
    }

    /// Store seeded with the given categories (in id order). Duplicates are skipped.
    pub fn with_categories(seed: Vec<NewCategory>) -> Self {
        let store = Self {
            inner: RwLock::new(Tables::default()),
        };
        for c in seed {
            if let Err(e) = store.create_category(c) {
                tracing::warn!(error = %e, "skipping seed category");
            }
        }
        store
    }

    // Mutations validate before their first write; a poisoned lock still guards consistent tables.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /* ----------------------------
    Articles
    ---------------------------- */

    pub fn create_article(&self, new: NewArticle) -> StoreResult<Article> {
        if new.title.trim().is_empty() {
            return Err(StoreError::Invalid {
                field: "title",
                reason: "must not be empty",
            });
        }
        if new.original_url.trim().is_empty() {
            return Err(StoreError::Invalid {
                field: "original_url",
                reason: "must not be empty",
            });
        }

        let mut t = self.write();
        if t.url_index.contains_key(&new.original_url) {
            return Err(StoreError::DuplicateUrl(new.original_url));
        }
        if let Some(cid) = new.category_id {
            if !t.categories.contains_key(&cid) {
                return Err(StoreError::NotFound {
                    kind: "category",
                    key: cid.to_string(),
                });
            }
        }

        let slug = unique_article_slug(&t.article_slugs, &new.title, &new.original_url);
        let id = bump(&mut t.next_article);
        let article = Article {
            id,
            slug: slug.clone(),
            title: new.title,
            content: new.content,
            summary: new.summary,
            original_url: new.original_url,
            image_url: new.image_url,
            published_at: new.published_at,
            source_id: new.source_id,
            source_name: new.source_name,
            category_id: new.category_id,
            ai_processed: false,
            created_at: Utc::now(),
            view_count: 0,
        };
        t.url_index.insert(article.original_url.clone(), id);
        t.article_slugs.insert(slug, id);
        t.articles.insert(id, article.clone());
        Ok(article)
    }

    pub fn update_article(&self, id: u64, patch: ArticlePatch) -> StoreResult<Article> {
        let mut t = self.write();
        if let Some(cid) = patch.category_id {
            if !t.categories.contains_key(&cid) {
                return Err(StoreError::NotFound {
                    kind: "category",
                    key: cid.to_string(),
                });
            }
        }
        let article = t.articles.get_mut(&id).ok_or_else(|| StoreError::article(id))?;
        patch.apply(article);
        Ok(article.clone())
    }

    pub fn increment_view_count(&self, id: u64) -> StoreResult<Article> {
        let mut t = self.write();
        let article = t.articles.get_mut(&id).ok_or_else(|| StoreError::article(id))?;
        article.view_count = article.view_count.saturating_add(1);
        Ok(article.clone())
    }

    pub fn get_article(&self, id: u64) -> Option<Article> {
        self.read().articles.get(&id).cloned()
    }

    pub fn get_article_by_url(&self, url: &str) -> Option<Article> {
        let t = self.read();
        t.url_index.get(url).and_then(|id| t.articles.get(id)).cloned()
    }

    pub fn get_article_by_slug(&self, slug: &str) -> Option<Article> {
        let t = self.read();
        t.article_slugs
            .get(slug)
            .and_then(|id| t.articles.get(id))
            .cloned()
    }

    pub fn article_count(&self) -> usize {
        self.read().articles.len()
    }

    /// Newest-first by `published_at`, ties by ascending id.
    pub fn list_articles(&self, page: Page) -> Vec<Article> {
        let t = self.read();
        paginate(newest_first(t.articles.values()), page)
    }

    pub fn list_articles_by_category(&self, category_id: u64, page: Page) -> Vec<Article> {
        let t = self.read();
        let hits = t
            .articles
            .values()
            .filter(|a| a.category_id == Some(category_id));
        paginate(newest_first(hits), page)
    }

    pub fn list_articles_by_tag(&self, tag_id: u64, page: Page) -> Vec<Article> {
        let t = self.read();
        let hits = t
            .articles
            .values()
            .filter(|a| t.links.contains(&(a.id, tag_id)));
        paginate(newest_first(hits), page)
    }

    /// Featured = most recently published article.
    pub fn featured_article(&self) -> Option<Article> {
        let t = self.read();
        t.articles.values().min_by(|a, b| recency(a, b)).cloned()
    }

    /// Most viewed first; equal counts fall back to newest-first order.
    pub fn trending_articles(&self, page: Page) -> Vec<Article> {
        let t = self.read();
        let mut v: Vec<&Article> = t.articles.values().collect();
        v.sort_by(|a, b| b.view_count.cmp(&a.view_count).then_with(|| recency(a, b)));
        paginate(v, page)
    }

    /// Case-insensitive substring match over title, summary and content.
    /// Linear scan; fine at in-memory scale.
    pub fn search_articles(&self, query: &str, page: Page) -> Vec<Article> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let t = self.read();
        let hits = t.articles.values().filter(|a| {
            a.title.to_lowercase().contains(&needle)
                || a.summary.to_lowercase().contains(&needle)
                || a.content.to_lowercase().contains(&needle)
        });
        paginate(newest_first(hits), page)
    }

    /// Article with category and tags resolved under a single read lock.
    pub fn view(&self, article: Article) -> ArticleView {
        let t = self.read();
        view_locked(&t, article)
    }

    pub fn views(&self, articles: Vec<Article>) -> Vec<ArticleView> {
        let t = self.read();
        articles.into_iter().map(|a| view_locked(&t, a)).collect()
    }

    /* ----------------------------
    Categories
    ---------------------------- */

    pub fn create_category(&self, new: NewCategory) -> StoreResult<Category> {
        if new.name.trim().is_empty() || new.slug.is_empty() {
            return Err(StoreError::Invalid {
                field: "category",
                reason: "name and slug are required",
            });
        }
        let mut t = self.write();
        let clash = t.categories.values().any(|c| {
            c.slug == new.slug || c.name.eq_ignore_ascii_case(new.name.trim())
        });
        if clash {
            return Err(StoreError::DuplicateCategory(new.name));
        }
        let id = bump(&mut t.next_category);
        let category = Category {
            id,
            name: new.name.trim().to_string(),
            slug: new.slug,
            description: new.description,
            image_url: new.image_url,
        };
        t.categories.insert(id, category.clone());
        Ok(category)
    }

    /// Categories in id order (the first one is the ingestion fallback).
    pub fn list_categories(&self) -> Vec<Category> {
        self.read().categories.values().cloned().collect()
    }

    pub fn category_summaries(&self) -> Vec<CategorySummary> {
        let t = self.read();
        let mut counts: HashMap<u64, usize> = HashMap::new();
        for cid in t.articles.values().filter_map(|a| a.category_id) {
            *counts.entry(cid).or_default() += 1;
        }
        t.categories
            .values()
            .map(|c| CategorySummary {
                category: c.clone(),
                article_count: counts.get(&c.id).copied().unwrap_or(0),
            })
            .collect()
    }

    pub fn category_names(&self) -> Vec<String> {
        self.read()
            .categories
            .values()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn get_category(&self, id: u64) -> Option<Category> {
        self.read().categories.get(&id).cloned()
    }

    pub fn get_category_by_slug(&self, slug: &str) -> Option<Category> {
        self.read()
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned()
    }

    /// Exact name match, ignoring ASCII case and surrounding whitespace.
    pub fn get_category_by_name(&self, name: &str) -> Option<Category> {
        let name = name.trim();
        self.read()
            .categories
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    /* ----------------------------
    Tags
    ---------------------------- */

    pub fn get_tag_by_slug(&self, slug: &str) -> Option<Tag> {
        let t = self.read();
        t.tag_slugs.get(slug).and_then(|id| t.tags.get(id)).cloned()
    }

    /// Looks the tag up by the slug of `name`; creates it when absent.
    pub fn get_or_create_tag(&self, name: &str) -> StoreResult<Tag> {
        let name = name.trim();
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(StoreError::Invalid {
                field: "tag",
                reason: "name has no slug-able characters",
            });
        }
        let mut t = self.write();
        if let Some(tag) = t.tag_slugs.get(&slug).and_then(|id| t.tags.get(id)) {
            return Ok(tag.clone());
        }
        let id = bump(&mut t.next_tag);
        let tag = Tag {
            id,
            name: name.to_string(),
            slug: slug.clone(),
        };
        t.tag_slugs.insert(slug, id);
        t.tags.insert(id, tag.clone());
        Ok(tag)
    }

    pub fn list_tags(&self) -> Vec<Tag> {
        self.read().tags.values().cloned().collect()
    }

    /// Links an article to a tag. `(article, tag)` is unique: an existing link
    /// is returned unchanged.
    pub fn create_article_tag(&self, article_id: u64, tag_id: u64) -> StoreResult<ArticleTag> {
        let mut t = self.write();
        if !t.articles.contains_key(&article_id) {
            return Err(StoreError::article(article_id));
        }
        if !t.tags.contains_key(&tag_id) {
            return Err(StoreError::NotFound {
                kind: "tag",
                key: tag_id.to_string(),
            });
        }
        if t.links.contains(&(article_id, tag_id)) {
            if let Some(existing) = t
                .article_tags
                .values()
                .find(|l| l.article_id == article_id && l.tag_id == tag_id)
            {
                return Ok(*existing);
            }
        }
        let id = bump(&mut t.next_link);
        let link = ArticleTag {
            id,
            article_id,
            tag_id,
        };
        t.links.insert((article_id, tag_id));
        t.article_tags.insert(id, link);
        Ok(link)
    }

    pub fn article_tag_count(&self) -> usize {
        self.read().article_tags.len()
    }

    /// Tags of an article in link order.
    pub fn tags_for_article(&self, article_id: u64) -> Vec<Tag> {
        let t = self.read();
        tags_locked(&t, article_id)
    }
}

fn tags_locked(t: &Tables, article_id: u64) -> Vec<Tag> {
    t.article_tags
        .values()
        .filter(|l| l.article_id == article_id)
        .filter_map(|l| t.tags.get(&l.tag_id).cloned())
        .collect()
}

fn view_locked(t: &Tables, article: Article) -> ArticleView {
    let category = article
        .category_id
        .and_then(|id| t.categories.get(&id).cloned());
    let tags = tags_locked(t, article.id);
    ArticleView {
        article,
        category,
        tags,
    }
}

fn recency(a: &Article, b: &Article) -> std::cmp::Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| a.id.cmp(&b.id))
}

fn newest_first<'a>(it: impl Iterator<Item = &'a Article>) -> Vec<&'a Article> {
    let mut v: Vec<&Article> = it.collect();
    v.sort_by(|a, b| recency(a, b));
    v
}

fn paginate(sorted: Vec<&Article>, page: Page) -> Vec<Article> {
    sorted
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .cloned()
        .collect()
}

/// Title slug; on collision a short url digest keeps it unique.
fn unique_article_slug(taken: &HashMap<String, u64>, title: &str, url: &str) -> String {
    let base = slugify(title);
    let base = if base.is_empty() {
        "article".to_string()
    } else {
        base
    };
    if !taken.contains_key(&base) {
        return base;
    }
    let digest = Sha256::digest(url.as_bytes());
    let mut suffix = String::with_capacity(8);
    for b in digest.iter().take(4) {
        use std::fmt::Write as _;
        let _ = write!(&mut suffix, "{:02x}", b);
    }
    let mut candidate = format!("{base}-{suffix}");
    let mut n = 2u32;
    while taken.contains_key(&candidate) {
        candidate = format!("{base}-{suffix}-{n}");
        n += 1;
    }
    candidate
}

/// Starter taxonomy. Exhaustive for the enrichment prompts.
pub fn default_categories() -> Vec<NewCategory> {
    let seed = [
        (
            "AI",
            "ai",
            "Artificial intelligence, machine learning and the models reshaping software.",
            "https://images.unsplash.com/photo-1620712943543-bcc4688e7485",
        ),
        (
            "Gadgets",
            "gadgets",
            "Phones, laptops, wearables and the hardware in your pocket.",
            "https://images.unsplash.com/photo-1600267175161-cfaa711b4a81",
        ),
        (
            "Software",
            "software",
            "Developer tools, platforms, apps and the craft of shipping code.",
            "https://images.unsplash.com/photo-1515879218367-8466d910aaa4",
        ),
        (
            "Cybersecurity",
            "cybersecurity",
            "Breaches, vulnerabilities, privacy and the people defending systems.",
            "https://images.unsplash.com/photo-1526666923127-b2970f64b422",
        ),
        (
            "Blockchain",
            "blockchain",
            "Crypto, web3 and distributed ledgers beyond the hype.",
            "https://images.unsplash.com/photo-1620288627223-53302f4e8c74",
        ),
        (
            "Quantum Computing",
            "quantum-computing",
            "Qubits, error correction and the road to practical quantum machines.",
            "https://images.unsplash.com/photo-1551739440-5dd934d3a94a",
        ),
    ];
    seed.into_iter()
        .map(|(name, slug, description, image_url)| NewCategory {
            name: name.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
            image_url: image_url.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn new_article(title: &str, url: &str, hours_ago: i64) -> NewArticle {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        NewArticle {
            title: title.into(),
            content: format!("{title} body"),
            summary: String::new(),
            original_url: url.into(),
            image_url: None,
            published_at: base - Duration::hours(hours_ago),
            source_id: "test".into(),
            source_name: "Test".into(),
            category_id: None,
        }
    }

    #[test]
    fn seeds_default_taxonomy_in_order() {
        let s = ContentStore::new();
        let names = s.category_names();
        assert_eq!(names.first().map(String::as_str), Some("AI"));
        assert_eq!(names.len(), 6);
        assert!(s.get_category_by_slug("quantum-computing").is_some());
    }

    #[test]
    fn duplicate_url_is_rejected() {
        let s = ContentStore::new();
        s.create_article(new_article("One", "https://x.test/1", 1))
            .unwrap();
        let err = s
            .create_article(new_article("Other title", "https://x.test/1", 2))
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateUrl("https://x.test/1".into()));
        assert_eq!(s.article_count(), 1);
    }

    #[test]
    fn colliding_titles_get_distinct_slugs() {
        let s = ContentStore::new();
        let a = s
            .create_article(new_article("Same Title", "https://x.test/a", 1))
            .unwrap();
        let b = s
            .create_article(new_article("Same Title", "https://x.test/b", 1))
            .unwrap();
        assert_eq!(a.slug, "same-title");
        assert_ne!(a.slug, b.slug);
        assert!(b.slug.starts_with("same-title-"));
        assert_eq!(s.get_article_by_slug(&b.slug).map(|x| x.id), Some(b.id));
    }

    #[test]
    fn newest_first_breaks_ties_by_id() {
        let s = ContentStore::new();
        let a = s.create_article(new_article("A", "u1", 5)).unwrap();
        let b = s.create_article(new_article("B", "u2", 5)).unwrap();
        let c = s.create_article(new_article("C", "u3", 1)).unwrap();
        let ids: Vec<u64> = s.list_articles(Page::default()).iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);
    }

    #[test]
    fn article_tag_links_are_unique() {
        let s = ContentStore::new();
        let a = s.create_article(new_article("A", "u1", 1)).unwrap();
        let tag = s.get_or_create_tag("Machine Learning").unwrap();
        assert_eq!(tag.slug, "machine-learning");
        let l1 = s.create_article_tag(a.id, tag.id).unwrap();
        let l2 = s.create_article_tag(a.id, tag.id).unwrap();
        assert_eq!(l1, l2);
        assert_eq!(s.article_tag_count(), 1);
        assert!(s.create_article_tag(a.id, 999).is_err());
    }

    #[test]
    fn unknown_category_in_patch_is_not_found() {
        let s = ContentStore::new();
        let a = s.create_article(new_article("A", "u1", 1)).unwrap();
        let err = s
            .update_article(
                a.id,
                ArticlePatch {
                    category_id: Some(42),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "category", .. }));
    }
}
