// src/config/topics.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_TOPICS_PATH: &str = "INGEST_TOPICS_PATH";

/// Built-in search topics; one is picked at random per fetch.
pub fn default_topics() -> Vec<String> {
    [
        "technology",
        "ai",
        "artificial intelligence",
        "machine learning",
        "blockchain",
        "quantum computing",
        "gadgets",
        "smartphones",
        "cybersecurity",
        "software",
        "hardware",
        "robotics",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Load topics from an explicit path. Supports TOML or JSON formats.
pub fn load_topics_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading topics from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_topics(&content, ext.as_str())
}

/// Load topics using env var + fallbacks:
/// 1) $INGEST_TOPICS_PATH
/// 2) config/ingest_topics.toml
/// 3) config/ingest_topics.json
///
/// Returns an empty list when nothing is configured.
pub fn load_topics_default() -> Result<Vec<String>> {
    if let Ok(p) = std::env::var(ENV_TOPICS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_topics_from(&pb);
        } else {
            return Err(anyhow!("INGEST_TOPICS_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/ingest_topics.toml");
    if toml_p.exists() {
        return load_topics_from(&toml_p);
    }
    let json_p = PathBuf::from("config/ingest_topics.json");
    if json_p.exists() {
        return load_topics_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_topics(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    if hint_ext == "json" || s.trim_start().starts_with('[') {
        return parse_json(s);
    }
    parse_toml(s)
        .or_else(|_| parse_json(s))
        .map_err(|_| anyhow!("unsupported topics format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlTopics {
        topics: Vec<String>,
    }
    let v: TomlTopics = toml::from_str(s)?;
    Ok(clean_list(v.topics))
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::BTreeSet;
    items
        .iter()
        .map(|it| it.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn toml_and_json_are_trimmed_and_deduped() {
        let toml = r#"topics = [" Robotics ", "", "ai", "AI"]"#;
        assert_eq!(
            parse_topics(toml, "toml").unwrap(),
            vec!["ai".to_string(), "robotics".to_string()]
        );
        let json = r#"["  chips ", "", "cloud"]"#;
        assert_eq!(
            parse_topics(json, "").unwrap(),
            vec!["chips".to_string(), "cloud".to_string()]
        );
        assert!(parse_topics("not = [valid", "toml").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_wins_and_missing_path_errors() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_TOPICS_PATH);
        assert!(load_topics_default().unwrap().is_empty());

        let p = tmp.path().join("topics.json");
        fs::write(&p, r#"["Gadgets"]"#).unwrap();
        env::set_var(ENV_TOPICS_PATH, p.display().to_string());
        assert_eq!(load_topics_default().unwrap(), vec!["gadgets".to_string()]);

        env::set_var(ENV_TOPICS_PATH, tmp.path().join("nope.toml").display().to_string());
        assert!(load_topics_default().is_err());
        env::remove_var(ENV_TOPICS_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
