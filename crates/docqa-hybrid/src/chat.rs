use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use docqa_core::config::LlmConfig;
use docqa_core::traits::LanguageModel;
use docqa_vector::{api_key_from_env, openai_endpoint};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI-compatible `/v1/chat/completions` client. One user message per call.
pub struct OpenAiChat {
    client: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(api_key: String, cfg: &LlmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: openai_endpoint(&cfg.base_url, "chat/completions"),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
        })
    }

    /// Reads the key from `OPENAI_API_KEY`.
    pub fn from_env(cfg: &LlmConfig) -> Result<Self> {
        Self::new(api_key_from_env("the chat model")?, cfg)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LanguageModel for OpenAiChat {
    fn generate(&self, prompt: &str) -> Result<String> {
        let req = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };
        let resp: ChatResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .with_context(|| format!("chat request to {}", self.endpoint))?
            .error_for_status()?
            .json()?;
        debug!(model = %self.model, prompt_chars = prompt.len(), "chat completion");
        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no content"))
    }
}
