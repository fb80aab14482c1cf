//! Environment-driven configuration.
//!
//! Infrastructure knobs (paths, chunking, fetch limits, provider keys) come
//! from the environment, with `.env` support via dotenvy. The resource
//! *inventory* lives in `resources.yaml` and is modeled in [`resources`].

pub mod resources;

pub use resources::{
    DocumentConfig, ProfileConfig, ProjectsConfig, RepoConfig, ResourceConfig, ResourcesConfig,
};

use std::env;
use std::path::PathBuf;

use crate::types::{AppError, Result};

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
}

/// Where resources are read from and where the vector database lives.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub resources_dir: PathBuf,
    pub db_path: PathBuf,
    pub collection: String,
}

/// Chunking and web-fetch behavior during ingestion.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Token budget per chunk (token-window path).
    pub chunk_max_tokens: usize,
    /// Chunks shorter than this are discarded as noise.
    pub min_chunk_chars: usize,
    /// Timeout applied to every web fetch and OCR invocation, seconds.
    pub fetch_timeout_secs: u64,
    /// Retry attempts for web-resource fetches.
    pub fetch_retries: u32,
    /// Bounded parallelism for independent resource jobs.
    pub worker_count: usize,
}

/// Query-time defaults.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub max_results: usize,
}

/// Embedding encoder selection.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// `local` (fastembed) or `remote` (OpenAI-compatible endpoint).
    pub provider: String,
    pub model: String,
    pub api_base: String,
    pub api_key: Option<String>,
}

/// Answer-generation provider keys and endpoints.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub together_api_key: Option<String>,
    pub ollama_url: String,
    pub model: String,
}

impl Config {
    /// Load configuration from the environment (with `.env` support).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            storage: StorageConfig {
                resources_dir: env::var("FOLIO_RESOURCES_DIR")
                    .unwrap_or_else(|_| "resources".to_string())
                    .into(),
                db_path: env::var("FOLIO_DB_PATH")
                    .unwrap_or_else(|_| "./vector_db".to_string())
                    .into(),
                collection: env::var("FOLIO_COLLECTION")
                    .unwrap_or_else(|_| "portfolio_resources".to_string()),
            },
            ingest: IngestConfig {
                chunk_max_tokens: parse_env("CHUNK_MAX_TOKENS", 500)?,
                min_chunk_chars: parse_env("MIN_CHUNK_CHARS", 20)?,
                fetch_timeout_secs: parse_env("FETCH_TIMEOUT_SECS", 30)?,
                fetch_retries: parse_env("FETCH_RETRIES", 3)?,
                worker_count: parse_env("INGEST_WORKERS", 4)?,
            },
            retrieval: RetrievalConfig {
                max_results: parse_env("MAX_RESULTS", 5)?,
            },
            embedding: EmbeddingConfig {
                provider: env::var("EMBEDDING_PROVIDER").unwrap_or_else(|_| default_embedding_provider()),
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "BAAI/bge-small-en-v1.5".to_string()),
                api_base: env::var("EMBEDDING_API_BASE")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                api_key: env::var("EMBEDDING_API_KEY")
                    .or_else(|_| env::var("OPENAI_API_KEY"))
                    .ok(),
            },
            llm: LlmConfig {
                openai_api_key: env::var("OPENAI_API_KEY").ok(),
                together_api_key: env::var("TOGETHER_API_KEY").ok(),
                ollama_url: env::var("OLLAMA_URL")
                    .unwrap_or_else(|_| "http://localhost:11434".to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            },
        })
    }
}

fn default_embedding_provider() -> String {
    if cfg!(feature = "local-embeddings") {
        "local".to_string()
    } else {
        "remote".to_string()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("invalid value for {}: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
