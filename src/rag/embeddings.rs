//! Embedding encoders.
//!
//! All encoders sit behind [`EmbeddingProvider`]; the orchestrator never
//! knows which one it is talking to. The remote provider speaks the
//! OpenAI-compatible `/embeddings` wire format; the local provider loads an
//! ONNX model via fastembed and is gated behind the `local-embeddings`
//! feature because ort does not link on every platform.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::EmbeddingConfig;
use crate::types::{AppError, Result};

/// Maps text to fixed-dimension vectors where geometric closeness
/// approximates semantic similarity.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        batch
            .pop()
            .ok_or_else(|| AppError::Embedding("encoder returned no vectors".into()))
    }

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}

impl std::fmt::Debug for dyn EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("model", &self.model_name())
            .finish()
    }
}

/// Select an embedding provider from configuration.
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "remote" => Ok(Arc::new(RemoteEmbedder::new(
            config.api_base.clone(),
            config.api_key.clone(),
            config.model.clone(),
        )?)),
        #[cfg(feature = "local-embeddings")]
        "local" => Ok(Arc::new(local::LocalEmbedder::new(&config.model)?)),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => Err(AppError::Config(
            "EMBEDDING_PROVIDER=local requires the 'local-embeddings' feature".into(),
        )),
        other => Err(AppError::Config(format!(
            "unknown embedding provider '{}'; use 'local' or 'remote'",
            other
        ))),
    }
}

// ============================================================================
// Remote provider (OpenAI-compatible /embeddings)
// ============================================================================

/// Embedding encoder backed by an OpenAI-compatible HTTP endpoint.
#[derive(Debug)]
pub struct RemoteEmbedder {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    pub fn new(api_base: String, api_key: Option<String>, model: String) -> Result<Self> {
        let api_key = api_key.ok_or_else(|| {
            AppError::Config("remote embedding provider needs EMBEDDING_API_KEY".into())
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_base,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("embeddings request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "embeddings endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("bad embeddings response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "expected {} vectors, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Local provider (fastembed)
// ============================================================================

#[cfg(feature = "local-embeddings")]
mod local {
    use super::*;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;

    /// Embedding encoder backed by a local fastembed ONNX model.
    pub struct LocalEmbedder {
        model: Mutex<TextEmbedding>,
        name: String,
    }

    /// Resolve a configured model name to the fastembed model it loads.
    /// Unsupported names are a configuration error, never a silent
    /// substitution.
    fn resolve_model(name: &str) -> Result<EmbeddingModel> {
        match name {
            "BAAI/bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
            "BAAI/bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
            "BAAI/bge-large-en-v1.5" => Ok(EmbeddingModel::BGELargeENV15),
            "sentence-transformers/all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
            other => Err(AppError::Config(format!(
                "unsupported local embedding model '{}'",
                other
            ))),
        }
    }

    impl LocalEmbedder {
        pub fn new(name: &str) -> Result<Self> {
            let model = TextEmbedding::try_new(
                InitOptions::new(resolve_model(name)?).with_show_download_progress(true),
            )
            .map_err(|e| AppError::Embedding(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(model),
                name: name.to_string(),
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for LocalEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            self.model
                .lock()
                .embed(refs, None)
                .map_err(|e| AppError::Embedding(e.to_string()))
        }

        fn model_name(&self) -> &str {
            &self.name
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_resolve_known_model_names() {
            assert!(matches!(
                resolve_model("BAAI/bge-small-en-v1.5"),
                Ok(EmbeddingModel::BGESmallENV15)
            ));
            assert!(matches!(
                resolve_model("sentence-transformers/all-MiniLM-L6-v2"),
                Ok(EmbeddingModel::AllMiniLML6V2)
            ));
        }

        #[test]
        fn test_unknown_model_name_is_config_error() {
            let err = resolve_model("openai/text-embedding-3-small").unwrap_err();
            assert!(matches!(err, AppError::Config(_)));
        }
    }
}
