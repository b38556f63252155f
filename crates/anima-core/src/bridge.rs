//! Companion bridge: the only network boundary. OpenAI-compatible chat
//! completions against OpenRouter.
//!
//! The engine runs entirely before any call lands here; the bridge only
//! receives the already-built system directive and the raw user message.
//! API key: `anima.toml` first, then `OPENROUTER_API_KEY`.

use crate::config::UserConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("bridge request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("empty completion from upstream")]
    EmptyResponse,
}

/// One completed exchange from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeReply {
    pub text: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Reqwest-backed OpenRouter client for conversational turns and the
/// supplementary reflection generation.
pub struct CompanionBridge {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl CompanionBridge {
    /// Key priority: anima.toml > OPENROUTER_API_KEY. `None` when no key is
    /// available — the gateway then serves its offline fallback reply.
    pub fn from_env() -> Option<Self> {
        let user_config = UserConfig::load();
        let api_key = user_config
            .get_api_key()
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok());
        let key = api_key?.trim().to_string();
        if key.is_empty() {
            return None;
        }
        let mut bridge = Self::new(key);
        if let Some(model) = user_config.model {
            bridge = bridge.with_model(&model);
        }
        Some(bridge)
    }

    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            model: DEFAULT_MODEL.to_string(),
            client,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One conversational turn: the full system directive plus the raw user
    /// message. Temperature leans warm; the directive carries the state.
    pub async fn converse(
        &self,
        system_directive: &str,
        user_message: &str,
    ) -> Result<BridgeReply, BridgeError> {
        let text = self
            .complete(system_directive, user_message, 0.8, Some(1024))
            .await?;
        Ok(BridgeReply { text })
    }

    /// Supplementary reflection on a significant exchange. Returns `None`
    /// when the model produces nothing usable — the turn proceeds without.
    pub async fn reflect(&self, user_message: &str, reply: &str) -> Option<String> {
        let prompt = crate::prompts::reflection_prompt(user_message, reply);
        match self
            .complete("You are the companion's subconscious.", &prompt, 0.9, Some(256))
            .await
        {
            Ok(text) => {
                let cleaned = text.trim().replace(['"', '\''], "");
                if cleaned.is_empty() {
                    None
                } else {
                    Some(cleaned)
                }
            }
            Err(e) => {
                tracing::warn!(target: "anima::bridge", error = %e, "reflection generation failed");
                None
            }
        }
    }

    /// A self-directed generation (introspection, dream, proactive reach-out):
    /// the prompt is the whole instruction, there is no user message.
    pub async fn self_directed(&self, prompt: &str) -> Result<String, BridgeError> {
        self.complete(prompt, "…", 0.9, Some(512)).await
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String, BridgeError> {
        let url = format!("{}/chat/completions", OPENROUTER_API_BASE);
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: Some(temperature),
            max_tokens,
        };

        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-Title", "Anima-Companion")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(BridgeError::Api { status, body });
        }

        let parsed: ChatResponse = res.json().await?;
        let text = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(BridgeError::EmptyResponse)?;

        Ok(text)
    }
}
