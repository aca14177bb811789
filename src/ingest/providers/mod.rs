// src/ingest/providers/mod.rs
pub mod fixtures;
pub mod newsapi;
pub mod rss;

pub use fixtures::fixture_items;
pub use newsapi::NewsApiProvider;
pub use rss::RssProvider;
