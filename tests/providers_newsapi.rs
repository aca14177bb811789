// tests/providers_newsapi.rs
//
// NewsAPI provider against a local stub server, plus the fetcher's
// degrade-to-fixtures path when the feed is unreachable.

use std::collections::HashMap;
use std::time::Duration;

use axum::{extract::Query, http::HeaderMap, http::StatusCode, routing::get, Json, Router};
use serde_json::json;
use sillygeeks_news::ingest::fetcher::{BatchSource, NewsFetcher};
use sillygeeks_news::ingest::providers::NewsApiProvider;
use sillygeeks_news::ingest::types::SourceProvider;

async fn everything(
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<serde_json::Value>) {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": "error", "code": "apiKeyInvalid", "message": "bad key"})),
        );
    }
    assert_eq!(q.get("language").map(String::as_str), Some("en"));
    assert_eq!(q.get("sortBy").map(String::as_str), Some("publishedAt"));
    assert_eq!(q.get("q").map(String::as_str), Some("robotics"));
    assert!(q.get("sources").is_some_and(|s| s.contains("techcrunch")));

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "totalResults": 3,
            "articles": [
                {
                    "source": {"id": "techcrunch", "name": "TechCrunch"},
                    "author": "A. Writer",
                    "title": "Warehouse robots get a vision upgrade",
                    "description": "Short description.",
                    "url": "https://techcrunch.test/robots",
                    "urlToImage": "https://techcrunch.test/robots.jpg",
                    "publishedAt": "2025-02-11T08:15:00Z",
                    "content": "Robots in fulfilment centres now see in 3D… [+1873 chars]"
                },
                {
                    "source": {"id": null, "name": "[Removed]"},
                    "title": "[Removed]",
                    "description": "[Removed]",
                    "url": "https://removed.com",
                    "publishedAt": "1970-01-01T00:00:00Z",
                    "content": "[Removed]"
                },
                {
                    "source": {"id": null, "name": "Hacker News"},
                    "title": "Show HN: a robot arm in 200 lines",
                    "description": "Tiny controller.",
                    "url": "https://news.ycombinator.test/item?id=1",
                    "urlToImage": null,
                    "publishedAt": "2025-02-11T07:00:00Z",
                    "content": null
                }
            ]
        })),
    )
}

async fn spawn_stub() -> String {
    let app = Router::new().route("/v2/everything", get(everything));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v2")
}

#[tokio::test]
async fn newsapi_articles_are_mapped_and_filtered() {
    let base = spawn_stub().await;
    let p = NewsApiProvider::new("test-key".into(), vec!["robotics".into()], Duration::from_secs(5))
        .unwrap()
        .with_base_url(base);

    let items = p.fetch_latest().await.expect("fetch from stub");

    assert_eq!(items.len(), 2);
    let tc = &items[0];
    assert_eq!(tc.source_id, "techcrunch");
    assert_eq!(tc.content, "Robots in fulfilment centres now see in 3D…");
    assert_eq!(tc.image_url.as_deref(), Some("https://techcrunch.test/robots.jpg"));

    let hn = &items[1];
    assert_eq!(hn.source_id, "hacker-news");
    assert_eq!(hn.content, "Tiny controller.");
}

#[tokio::test]
async fn rejected_key_is_an_error_and_the_fetcher_degrades() {
    let base = spawn_stub().await;
    let p = NewsApiProvider::new("wrong".into(), vec!["robotics".into()], Duration::from_secs(5))
        .unwrap()
        .with_base_url(base);
    assert!(p.fetch_latest().await.is_err());

    let fetcher = NewsFetcher::with_provider(Box::new(p), Duration::from_secs(5));
    let batch = fetcher.fetch_batch().await;
    assert_eq!(batch.source, BatchSource::Fixtures);
    assert_eq!(batch.items.len(), 5);
}

#[tokio::test]
async fn unreachable_feed_degrades_to_fixtures() {
    // nothing listens on port 9 locally
    let p = NewsApiProvider::new("k".into(), vec!["ai".into()], Duration::from_secs(2))
        .unwrap()
        .with_base_url("http://127.0.0.1:9/v2");
    let fetcher = NewsFetcher::with_provider(Box::new(p), Duration::from_secs(3));

    let batch = fetcher.fetch_batch().await;
    assert_eq!(batch.source, BatchSource::Fixtures);
    assert!(!batch.items.is_empty());
}
