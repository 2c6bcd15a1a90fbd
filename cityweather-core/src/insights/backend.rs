use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Request};
use serde::{Deserialize, Serialize};
use std::{env, fmt::Debug, time::Duration};

use crate::model::Credential;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OLLAMA_API_KEY_ENV: &str = "OLLAMA_API_KEY";

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OLLAMA_LOCAL_URL: &str = "http://localhost:11434/api/generate";
const OLLAMA_CLOUD_URL: &str = "https://ollama.com/api/chat";

/// A text-completion service that turns a prompt into a reply.
#[async_trait]
pub trait ChatBackend: Send + Sync + Debug {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    OpenAi,
    OllamaLocal,
    OllamaCloud,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "openai",
            BackendKind::OllamaLocal => "ollama-local",
            BackendKind::OllamaCloud => "ollama-cloud",
        }
    }

    fn default_url(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => OPENAI_URL,
            BackendKind::OllamaLocal => OLLAMA_LOCAL_URL,
            BackendKind::OllamaCloud => OLLAMA_CLOUD_URL,
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "gpt-4o-mini",
            BackendKind::OllamaLocal | BackendKind::OllamaCloud => "llama3.2",
        }
    }

    fn timeout(&self) -> Duration {
        match self {
            BackendKind::OpenAi => Duration::from_secs(60),
            BackendKind::OllamaLocal | BackendKind::OllamaCloud => Duration::from_secs(120),
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct OpenAiReply {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct GenerateReply {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    message: Option<ReplyMessage>,
}

/// One HTTP chat service: OpenAI chat completions, Ollama `/api/generate`
/// or Ollama cloud `/api/chat`.
#[derive(Debug, Clone)]
pub struct LlmBackend {
    kind: BackendKind,
    http: Client,
    url: String,
    model: String,
    api_key: Option<Credential>,
}

impl LlmBackend {
    pub fn new(kind: BackendKind, api_key: Option<Credential>) -> Result<Self> {
        let http = Client::builder()
            .timeout(kind.timeout())
            .build()
            .with_context(|| format!("Failed to build HTTP client for {}", kind.as_str()))?;

        Ok(Self {
            kind,
            http,
            url: kind.default_url().to_string(),
            model: kind.default_model().to_string(),
            api_key,
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// The POST sent for one prompt. Keys travel as a bearer header, never in the URL.
    pub fn request(&self, prompt: &str) -> reqwest::Result<Request> {
        let mut builder = self.http.post(&self.url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose());
        }

        let messages = [ChatMessage { role: "user", content: prompt }];
        let model = self.model.as_str();
        builder = match self.kind {
            BackendKind::OpenAi => builder.json(&ChatRequest { model, messages, stream: None }),
            BackendKind::OllamaCloud => {
                builder.json(&ChatRequest { model, messages, stream: Some(false) })
            }
            BackendKind::OllamaLocal => {
                builder.json(&GenerateRequest { model, prompt, stream: false })
            }
        };

        builder.build()
    }
}

#[async_trait]
impl ChatBackend for LlmBackend {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let req = self.request(prompt).context("Failed to build request")?;
        let res = self
            .http
            .execute(req)
            .await
            .with_context(|| format!("Request to {} failed", self.url))?;

        let status = res.status();
        let body = res.text().await.context("Failed to read response body")?;
        if !status.is_success() {
            return Err(anyhow!("{} returned HTTP {status}", self.name()));
        }

        parse_reply(self.kind, &body).ok_or_else(|| anyhow!("{} reply had no text", self.name()))
    }
}

/// Pull the reply text out of a backend's JSON body. Blank text counts as none.
pub fn parse_reply(kind: BackendKind, body: &str) -> Option<String> {
    let text = match kind {
        BackendKind::OpenAi => {
            let reply: OpenAiReply = serde_json::from_str(body).ok()?;
            reply.choices.into_iter().next()?.message.content?
        }
        BackendKind::OllamaLocal => serde_json::from_str::<GenerateReply>(body).ok()?.response?,
        BackendKind::OllamaCloud => {
            serde_json::from_str::<ChatReply>(body).ok()?.message?.content?
        }
    };

    Some(text).filter(|t| !t.trim().is_empty())
}

/// Chain order: OpenAI (if keyed), local Ollama, Ollama cloud (if keyed).
pub fn backends_for(
    openai_key: Option<Credential>,
    ollama_key: Option<Credential>,
) -> Result<Vec<Box<dyn ChatBackend>>> {
    let mut backends: Vec<Box<dyn ChatBackend>> = Vec::new();
    if let Some(key) = openai_key.filter(|k| !k.is_empty()) {
        backends.push(Box::new(LlmBackend::new(BackendKind::OpenAi, Some(key))?));
    }
    backends.push(Box::new(LlmBackend::new(BackendKind::OllamaLocal, None)?));
    if let Some(key) = ollama_key.filter(|k| !k.is_empty()) {
        backends.push(Box::new(LlmBackend::new(BackendKind::OllamaCloud, Some(key))?));
    }
    Ok(backends)
}

pub fn backends_from_env() -> Result<Vec<Box<dyn ChatBackend>>> {
    let key = |name: &str| env::var(name).ok().map(Credential::new);
    backends_for(key(OPENAI_API_KEY_ENV), key(OLLAMA_API_KEY_ENV))
}
