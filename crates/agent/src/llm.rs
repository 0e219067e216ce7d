//! Language model clients.
//!
//! `LlmClient` is the only seam the agents know about; the concrete clients
//! speak the OpenAI-compatible chat protocol or the Anthropic messages
//! protocol over plain reqwest. Replies are treated as untrusted text: the
//! callers strip markdown fences and validate any JSON before using it.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use offersense_core::config::{LlmConfig, LlmProvider};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Remove a ```json ... ``` (or bare ```) wrapper from a model reply.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

pub struct OpenAiChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OpenAiChatClient {
    pub fn new(
        base_url: String,
        api_key: Option<SecretString>,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key, model })
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: 0.0,
        };

        let mut builder =
            self.client.post(format!("{}/v1/chat/completions", self.base_url)).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.context("chat completion request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("chat completion returned {status}: {body}"));
        }

        let parsed: ChatResponse =
            response.json().await.context("chat completion response was not valid JSON")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no choices"))
    }
}

pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<MessageBlock>,
}

#[derive(Deserialize)]
struct MessageBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicClient {
    pub fn new(
        base_url: String,
        api_key: SecretString,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .context("failed to build http client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key, model })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: 1024,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .context("messages request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("messages endpoint returned {status}: {body}"));
        }

        let parsed: MessagesResponse =
            response.json().await.context("messages response was not valid JSON")?;
        Ok(parsed.content.into_iter().map(|block| block.text).collect::<Vec<_>>().join(""))
    }
}

/// Build the configured client. Ollama speaks the OpenAI-compatible protocol,
/// so it shares the chat client with OpenAI.
pub fn client_from_config(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    match config.provider {
        LlmProvider::OpenAi | LlmProvider::Ollama => {
            let default_base = match config.provider {
                LlmProvider::OpenAi => "https://api.openai.com",
                _ => "http://localhost:11434",
            };
            Ok(Box::new(OpenAiChatClient::new(
                config.base_url.clone().unwrap_or_else(|| default_base.to_string()),
                config.api_key.clone(),
                config.model.clone(),
                config.timeout_secs,
            )?))
        }
        LlmProvider::Anthropic => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| anyhow!("anthropic provider requires llm.api_key"))?;
            Ok(Box::new(AnthropicClient::new(
                config.base_url.clone().unwrap_or_else(|| "https://api.anthropic.com".to_string()),
                api_key,
                config.model.clone(),
                config.timeout_secs,
            )?))
        }
    }
}

/// Scripted client for tests: returns queued replies in order, then errors.
#[derive(Default)]
pub struct ScriptedLlmClient {
    replies: std::sync::Mutex<std::collections::VecDeque<Result<String, String>>>,
}

impl ScriptedLlmClient {
    pub fn with_replies(replies: Vec<&str>) -> Self {
        Self {
            replies: std::sync::Mutex::new(
                replies.into_iter().map(|reply| Ok(reply.to_string())).collect(),
            ),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            replies: std::sync::Mutex::new(
                std::iter::once(Err(message.to_string())).collect(),
            ),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        let next = self
            .replies
            .lock()
            .expect("script lock is never poisoned")
            .pop_front()
            .ok_or_else(|| anyhow!("scripted client has no replies left"))?;
        next.map_err(|message| anyhow!(message))
    }
}

#[cfg(test)]
mod tests {
    use super::strip_code_fences;

    #[test]
    fn strips_json_fences() {
        let reply = "```json\n{\"supplier\": \"QuickFix\"}\n```";
        assert_eq!(strip_code_fences(reply), "{\"supplier\": \"QuickFix\"}");
    }

    #[test]
    fn strips_bare_fences() {
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
    }

    #[test]
    fn leaves_plain_replies_untouched() {
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }
}
