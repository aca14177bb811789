// src/api.rs
//! Read-only JSON API over the content store.

use std::sync::Arc;

use serde::Deserialize;
use shuttle_axum::axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::enrich::{ConnectionStatus, EnrichmentClient};
use crate::history::{IngestHistory, DEFAULT_HISTORY_CAPACITY};
use crate::ingest::IngestReport;
use crate::model::{ArticleView, CategorySummary, Page, Tag};
use crate::store::{ContentStore, StoreError};

pub const MAX_QUERY_CHARS: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub enricher: Arc<EnrichmentClient>,
    pub history: Arc<IngestHistory>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => Self::NotFound(e.to_string()),
            StoreError::Invalid { .. } => Self::BadRequest(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(target: "api", error = %self, "request failed");
        }
        let body = serde_json::json!({ "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Query string extraction whose failures keep the JSON error body.
type QueryParams<T> = Result<Query<T>, QueryRejection>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/articles", get(list_articles))
        .route("/api/articles/trending", get(trending_articles))
        .route("/api/articles/{id_or_slug}", get(get_article))
        .route("/api/featured-article", get(featured_article))
        .route("/api/categories", get(list_categories))
        .route("/api/categories/{slug}", get(get_category))
        .route("/api/categories/{slug}/articles", get(category_articles))
        .route("/api/tags", get(list_tags))
        .route("/api/tags/{slug}/articles", get(tag_articles))
        .route("/api/search", get(search))
        .route("/api/ai-status", get(ai_status))
        .route("/api/ingest/runs", get(ingest_runs))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

impl PageQuery {
    fn page(&self) -> Page {
        Page::from_query(self.limit, self.offset)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(alias = "q")]
    query: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn list_articles(
    State(state): State<AppState>,
    q: QueryParams<PageQuery>,
) -> ApiResult<Vec<ArticleView>> {
    let Query(q) = q?;
    let articles = state.store.list_articles(q.page());
    Ok(Json(state.store.views(articles)))
}

/// Most viewed first.
async fn trending_articles(
    State(state): State<AppState>,
    q: QueryParams<PageQuery>,
) -> ApiResult<Vec<ArticleView>> {
    let Query(q) = q?;
    let articles = state.store.trending_articles(q.page());
    Ok(Json(state.store.views(articles)))
}

/// Numeric ids are tried first, then slugs. Each hit counts as a view.
async fn get_article(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> ApiResult<ArticleView> {
    let found = id_or_slug
        .parse::<u64>()
        .ok()
        .and_then(|id| state.store.get_article(id))
        .or_else(|| state.store.get_article_by_slug(&id_or_slug))
        .ok_or_else(|| ApiError::NotFound("Article not found".to_string()))?;
    let article = state.store.increment_view_count(found.id)?;
    Ok(Json(state.store.view(article)))
}

async fn featured_article(State(state): State<AppState>) -> ApiResult<ArticleView> {
    let article = state
        .store
        .featured_article()
        .ok_or_else(|| ApiError::NotFound("No featured article found".to_string()))?;
    Ok(Json(state.store.view(article)))
}

async fn list_categories(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    Json(state.store.category_summaries())
}

async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<CategorySummary> {
    state
        .store
        .category_summaries()
        .into_iter()
        .find(|c| c.category.slug == slug)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))
}

async fn category_articles(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    q: QueryParams<PageQuery>,
) -> ApiResult<Vec<ArticleView>> {
    let Query(q) = q?;
    let category = state
        .store
        .get_category_by_slug(&slug)
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;
    let articles = state.store.list_articles_by_category(category.id, q.page());
    Ok(Json(state.store.views(articles)))
}

async fn list_tags(State(state): State<AppState>) -> Json<Vec<Tag>> {
    Json(state.store.list_tags())
}

async fn tag_articles(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    q: QueryParams<PageQuery>,
) -> ApiResult<Vec<ArticleView>> {
    let Query(q) = q?;
    let tag = state
        .store
        .get_tag_by_slug(&slug)
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;
    let articles = state.store.list_articles_by_tag(tag.id, q.page());
    Ok(Json(state.store.views(articles)))
}

async fn search(
    State(state): State<AppState>,
    q: QueryParams<SearchQuery>,
) -> ApiResult<Vec<ArticleView>> {
    let Query(q) = q?;
    let query = q.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Search query is required".to_string()));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Search query must be at most {MAX_QUERY_CHARS} characters"
        )));
    }
    let page = Page::from_query(q.limit, q.offset);
    let articles = state.store.search_articles(query, page);
    tracing::debug!(target: "api", query, hits = articles.len(), "search");
    Ok(Json(state.store.views(articles)))
}

async fn ai_status(State(state): State<AppState>) -> Json<ConnectionStatus> {
    Json(state.enricher.test_connection().await)
}

/// Newest run first.
async fn ingest_runs(State(state): State<AppState>) -> Json<Vec<IngestReport>> {
    let mut runs = state.history.snapshot_last_n(DEFAULT_HISTORY_CAPACITY);
    runs.reverse();
    Json(runs)
}
