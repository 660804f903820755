use crate::error::{Result, SqlPromptError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-coder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            temperature: 0.1,
            max_tokens: 2000,
            timeout: Duration::from_secs(120),
        }
    }
}

impl ModelConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("LLM_API_KEY")
            .or_else(|| get("DEEPSEEK_API_KEY"))
            .ok_or_else(|| {
                SqlPromptError::Config(
                    "no llm api key configured, set LLM_API_KEY or DEEPSEEK_API_KEY".to_string(),
                )
            })?;

        let defaults = Self::default();
        Ok(Self {
            endpoint: get("LLM_ENDPOINT").unwrap_or(defaults.endpoint),
            model: get("LLM_MODEL").unwrap_or(defaults.model),
            api_key,
            ..defaults
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Message,
}

/// anything that turns a conversation into a reply
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn generate(&self, messages: Vec<Message>) -> Result<String>;
}

/// chat-completions client; transport only, no retries
pub struct ChatModel {
    client: reqwest::Client,
    config: ModelConfig,
}

impl ChatModel {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        tracing::info!("chat model {} at {}", config.model, config.endpoint);

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatCompletion for ChatModel {
    #[tracing::instrument(skip(self, messages), fields(message_count = messages.len(), model = %self.config.model))]
    async fn generate(&self, messages: Vec<Message>) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SqlPromptError::Llm(format!("{} {}", status, text)));
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| SqlPromptError::Llm("response contained no choices".to_string()))?;

        tracing::debug!("generated {} chars", content.len());

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("test");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "test");
    }

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(config.model, "deepseek-coder");
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_tokens, 2000);
    }

    #[test]
    fn test_model_config_requires_key() {
        let err = ModelConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, SqlPromptError::Config(_)));
    }

    #[test]
    fn test_model_config_falls_back_to_deepseek_key() {
        let config = ModelConfig::from_lookup(|key| match key {
            "DEEPSEEK_API_KEY" => Some("sk-test".to_string()),
            "LLM_MODEL" => Some("deepseek-chat".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_request_wire_format() {
        let messages = vec![Message::user("list users")];
        let body = ChatRequest {
            model: "deepseek-coder",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 2000,
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "deepseek-coder",
                "messages": [{"role": "user", "content": "list users"}],
                "temperature": 0.5,
                "max_tokens": 2000
            })
        );
    }

    #[test]
    fn test_response_reads_first_choice() {
        let reply: ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "SELECT 1;"}}]
        }))
        .unwrap();
        assert_eq!(reply.choices[0].message.role, MessageRole::Assistant);
        assert_eq!(reply.choices[0].message.content, "SELECT 1;");
    }
}
