//! OpenAI-compatible chat-completions client.
//!
//! Serves both OpenAI itself and Together AI, which exposes the same
//! `/chat/completions` wire format.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::llm::client::{require_key, GeneratedAnswer, GenerationOptions, GenerationProvider};
use crate::types::{AppError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct ChatCompletionClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    confidence: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl ChatCompletionClient {
    pub fn new(api_key: String, api_base: String, model: String, confidence: f32) -> Result<Self> {
        require_key(&api_key, "chat completion")?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Llm(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            confidence,
        })
    }
}

#[async_trait::async_trait]
impl GenerationProvider for ChatCompletionClient {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<GeneratedAnswer> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("chat completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "chat completion API error ({}): {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("malformed chat completion response: {}", e)))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Llm("chat completion returned no choices".to_string()))?;

        Ok(GeneratedAnswer {
            answer,
            confidence: self.confidence,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
