//! Local Ollama chat client (`/api/chat`, non-streaming).

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::llm::client::{GeneratedAnswer, GenerationOptions, GenerationProvider};
use crate::types::{AppError, Result};

// Local models can be slow to load on first request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Local inference reports lower confidence than the hosted providers.
const LOCAL_CONFIDENCE: f32 = 0.7;

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Llm(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

#[async_trait::async_trait]
impl GenerationProvider for OllamaClient {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<GeneratedAnswer> {
        let url = format!("{}/api/chat", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
            "options": {
                "num_predict": options.max_tokens,
                "temperature": options.temperature,
            },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, detail
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("malformed Ollama response: {}", e)))?;

        Ok(GeneratedAnswer {
            answer: parsed.message.content,
            confidence: LOCAL_CONFIDENCE,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_non_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({ "stream": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": { "role": "assistant", "content": "Local answer." }
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama3.2".into()).unwrap();
        let answer = client
            .generate("hi", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(answer.answer, "Local answer.");
        assert!((answer.confidence - LOCAL_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_llm_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "missing".into()).unwrap();
        let err = client
            .generate("hi", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
