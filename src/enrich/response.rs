// src/enrich/response.rs
//! Parsing of backend answers. `None` means the answer was unusable and the
//! caller must fall back.

use std::collections::HashSet;

use crate::enrich::fallback::MAX_TAGS;
use crate::model::slugify;

/// Minimum Jaro-Winkler similarity for a fuzzy category match.
pub const CATEGORY_SIMILARITY: f64 = 0.88;

/// Trimmed, whitespace-collapsed summary; empty answers are unusable.
pub fn clean_summary(raw: &str) -> Option<String> {
    let s = raw
        .trim()
        .trim_matches('"')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!s.is_empty()).then_some(s)
}

/// Maps a free-text (or `{"category": ..}`) answer onto one of the candidates.
pub fn coerce_category(raw: &str, candidates: &[String]) -> Option<String> {
    let answer = serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v.get("category").and_then(|c| c.as_str()).map(String::from))
        .unwrap_or_else(|| raw.to_string());
    let answer = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '*')
        .trim_end_matches(['.', '!', ','])
        .trim();
    if answer.is_empty() {
        return None;
    }

    if let Some(exact) = candidates.iter().find(|c| c.eq_ignore_ascii_case(answer)) {
        return Some(exact.clone());
    }

    let lowered = answer.to_lowercase();
    candidates
        .iter()
        .map(|c| (c, strsim::jaro_winkler(&lowered, &c.to_lowercase())))
        .filter(|(_, score)| *score >= CATEGORY_SIMILARITY)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c.clone())
}

/// Accepts `{"tags": [..]}` or a bare JSON array of strings.
/// Tags are trimmed, `#` stripped, de-duplicated by slug and capped.
pub fn parse_tags(raw: &str) -> Option<Vec<String>> {
    let v: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    let items = match &v {
        serde_json::Value::Array(a) => a,
        serde_json::Value::Object(o) => o.get("tags")?.as_array()?,
        _ => return None,
    };

    let mut seen = HashSet::new();
    let tags: Vec<String> = items
        .iter()
        .filter_map(|t| t.as_str())
        .map(|t| t.trim().trim_start_matches('#').trim().to_string())
        .filter(|t| {
            let slug = slugify(t);
            !slug.is_empty() && seen.insert(slug)
        })
        .take(MAX_TAGS)
        .collect();
    (!tags.is_empty()).then_some(tags)
}
