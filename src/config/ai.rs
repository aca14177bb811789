// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use super::{env_u64, ENV_OPENAI_API_KEY};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";
pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";
/// One day.
pub const MAX_REPROBE_MINUTES: u64 = 24 * 60;

fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_reprobe_minutes() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiConfig {
    /// Empty key => local fallback ("demo mode") for every enrichment call.
    /// "ENV" means: read from OPENAI_API_KEY.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// How long a failed backend is skipped before one trial call is allowed.
    #[serde(default = "default_reprobe_minutes")]
    pub reprobe_minutes: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            reprobe_minutes: default_reprobe_minutes(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AiConfig = serde_json::from_str(&data)?;

        // Resolve api key if "ENV"; a missing variable is demo mode, not an error
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = env::var(ENV_OPENAI_API_KEY).unwrap_or_default();
        }
        cfg.api_key = cfg.api_key.trim().to_string();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn from_env() -> Self {
        let mut cfg = Self {
            api_key: env::var(ENV_OPENAI_API_KEY)
                .unwrap_or_default()
                .trim()
                .to_string(),
            model: env::var("OPENAI_MODEL")
                .ok()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(default_model),
            timeout_secs: env_u64("AI_TIMEOUT_SECS").unwrap_or_else(default_timeout_secs),
            reprobe_minutes: env_u64("AI_REPROBE_MINUTES").unwrap_or_else(default_reprobe_minutes),
        };
        cfg.sanitize();
        cfg
    }

    /// 1) $AI_CONFIG_PATH  2) config/ai.json  3) environment only.
    /// An unreadable file is logged and the environment is used instead.
    pub fn load_default() -> Self {
        let path = env::var(ENV_AI_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_AI_CONFIG_PATH));
        if !path.exists() {
            return Self::from_env();
        }
        match Self::load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = ?e, path = %path.display(), "ai config unreadable, using env");
                Self::from_env()
            }
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn reprobe_after(&self) -> Duration {
        Duration::from_secs(self.reprobe_minutes.saturating_mul(60))
    }

    fn sanitize(&mut self) {
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.model.trim().is_empty() {
            self.model = default_model();
        }
        self.reprobe_minutes = self.reprobe_minutes.min(MAX_REPROBE_MINUTES);
    }
}
