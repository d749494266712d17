//! OpenAI-compatible chat completions client.
//!
//! Works against api.openai.com and local servers that speak the same API
//! (llama.cpp server, vLLM, LM Studio, Ollama).

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use ragdb_core::settings::{GenerationConfig, Provider};
use ragdb_core::traits::Generator;
use ragdb_core::{Error, Result};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug)]
pub struct ChatCompletionsGenerator {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsGenerator {
    /// Build a client for the configured provider.
    ///
    /// The `openai` provider needs its key in the env var named by `api_key_env`.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        config.validate()?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let base = match config.provider {
            Provider::Local => config.endpoint.clone(),
            Provider::OpenAi => {
                let key = std::env::var(&config.api_key_env)
                    .map_err(|_| Error::config(format!("{} is not set for the openai provider", config.api_key_env)))?;
                let value = HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|e| Error::config(format!("invalid API key format: {e}")))?;
                headers.insert(AUTHORIZATION, value);
                OPENAI_BASE_URL.to_string()
            }
        };
        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        let url = completions_url(&base);
        tracing::info!(provider = config.provider.as_str(), %url, model = %config.model, "chat completions client ready");
        Ok(Self { client, url, model: config.model.clone(), temperature: config.temperature, max_tokens: config.max_tokens })
    }

    pub fn url(&self) -> &str { &self.url }
}

#[async_trait]
impl Generator for ChatCompletionsGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [Message { role: "system", content: system }, Message { role: "user", content: prompt }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        tracing::debug!(url = %self.url, prompt_chars = prompt.len(), "sending chat completion");
        let response = self.client.post(&self.url).json(&request).send().await.context("chat completion request failed")?;
        let status = response.status();
        let body = response.text().await.context("failed to read chat completion body")?;
        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
            return Err(anyhow!("chat completion returned {status}: {detail}"));
        }
        parse_completion(&body)
    }
}

/// `{base}/chat/completions`, tolerating a trailing slash on the base URL.
pub fn completions_url(base: &str) -> String { format!("{}/chat/completions", base.trim_end_matches('/')) }

/// Extract the first choice's message content from a chat completions body.
pub fn parse_completion(body: &str) -> anyhow::Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body).context("malformed chat completion response")?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("chat completion response has no message content"))
}
