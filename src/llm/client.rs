//! Provider abstraction for answer generation.

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::types::{AppError, Result};

pub const TOGETHER_API_BASE: &str = "https://api.together.xyz/v1";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Tuning knobs passed through to the provider with each request.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
        }
    }
}

/// A generated answer plus a coarse provider-level confidence.
///
/// Chat APIs do not report calibrated confidence, so each provider carries
/// a fixed value reflecting how reliable its responses tend to be.
#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    pub answer: String,
    pub confidence: f32,
}

/// Generic generation client trait, one implementation per provider.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for a fully composed prompt.
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<GeneratedAnswer>;

    /// The model identifier requests are issued against.
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection.
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API (or any endpoint speaking its chat-completions format).
    OpenAi {
        api_key: String,
        api_base: String,
        model: String,
    },
    /// Together AI. Same wire format as OpenAI, fixed base URL.
    Together { api_key: String, model: String },
    /// Local Ollama server.
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Pick a provider from the configured credentials.
    ///
    /// Preference order follows availability: Together, then OpenAI, then
    /// Ollama as the local fallback.
    pub fn from_config(config: &LlmConfig) -> Self {
        if let Some(key) = &config.together_api_key {
            Provider::Together {
                api_key: key.clone(),
                model: config.model.clone(),
            }
        } else if let Some(key) = &config.openai_api_key {
            Provider::OpenAi {
                api_key: key.clone(),
                api_base: OPENAI_API_BASE.to_string(),
                model: config.model.clone(),
            }
        } else {
            Provider::Ollama {
                base_url: config.ollama_url.clone(),
                model: config.model.clone(),
            }
        }
    }

    /// Create a client instance for this provider.
    pub fn create_client(&self) -> Result<Box<dyn GenerationProvider>> {
        match self {
            Provider::OpenAi {
                api_key,
                api_base,
                model,
            } => Ok(Box::new(super::chat::ChatCompletionClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                0.9,
            )?)),

            Provider::Together { api_key, model } => {
                Ok(Box::new(super::chat::ChatCompletionClient::new(
                    api_key.clone(),
                    TOGETHER_API_BASE.to_string(),
                    model.clone(),
                    0.8,
                )?))
            }

            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone())?,
            )),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAi { model, .. } => write!(f, "openai ({})", model),
            Provider::Together { model, .. } => write!(f, "together ({})", model),
            Provider::Ollama { model, .. } => write!(f, "ollama ({})", model),
        }
    }
}

/// Shared validation for providers that require a key.
pub(super) fn require_key(api_key: &str, provider: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(AppError::Config(format!("{} API key is empty", provider)));
    }
    Ok(())
}
