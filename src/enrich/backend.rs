// src/enrich/backend.rs
//! Generative-text backends. A backend only performs the remote call; retry
//! policy, timeouts and fallbacks live in `EnrichmentClient`.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// What a prompt asks for; lets test doubles answer per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Summarize,
    Categorize,
    Tags,
    Probe,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Summarize => "summarize",
            Task::Categorize => "categorize",
            Task::Tags => "tags",
            Task::Probe => "probe",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub task: Task,
    pub system: Option<String>,
    pub user: String,
    /// Ask the backend for a JSON object response.
    pub json: bool,
    pub max_tokens: u32,
}

#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Raw completion text for the prompt.
    async fn complete(&self, prompt: &Prompt) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// OpenAI Chat Completions backend.
pub struct OpenAiBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(cfg: &AiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("sillygeeks-news/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(cfg.timeout())
            .build()
            .context("building openai http client")?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

#[async_trait]
impl TextBackend for OpenAiBackend {
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        if self.api_key.is_empty() {
            bail!("openai api key not configured");
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = prompt.system.as_deref() {
            messages.push(Msg {
                role: "system",
                content: sys,
            });
        }
        messages.push(Msg {
            role: "user",
            content: &prompt.user,
        });

        let req = ChatReq {
            model: &self.model,
            messages,
            temperature: 0.2,
            max_tokens: prompt.max_tokens,
            response_format: prompt.json.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let resp = self
            .http
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("openai returned HTTP {status}");
        }
        let body: ChatResp = resp.json().await.context("decoding openai response")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            bail!("openai returned an empty completion");
        }
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
