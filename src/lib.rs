//! # Folio - Portfolio RAG Pipeline
//!
//! A retrieval-augmented generation backend for a personal portfolio
//! chatbot: resource ingestion (resume PDF, profile pages, project repos),
//! token-aware chunking, embeddings, and vector retrieval with citations.
//!
//! ## Overview
//!
//! Folio can be used in two ways:
//!
//! 1. **As a CLI** - Run the `folio-update` binary to (re)build the
//!    vector database from the configured resources
//! 2. **As a library** - Import the engine into a chat backend
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use folio::config::Config;
//! use folio::db::LocalVectorStore;
//! use folio::rag::{embeddings, format_context_with_citations, RagEngine};
//!
//! #[tokio::main]
//! async fn main() -> folio::types::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(LocalVectorStore::open(&config.storage.db_path)?);
//!     let embedder = embeddings::from_config(&config.embedding)?;
//!
//!     let engine = RagEngine::new(&config, store, embedder).await?;
//!     engine.process_all_resources().await;
//!
//!     let results = engine.retrieve_context("What projects exist?", 5).await;
//!     let (context, citations) = format_context_with_citations(&results);
//!     println!("{}\n{}", context, citations.join("\n"));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`ingest`] - text extraction, cleaning, chunking, page scraping
//! - [`rag`] - the orchestrator, embedding providers, citation formatting
//! - [`db`] - the vector store trait and the local JSON-backed store
//! - [`llm`] - answer generation on top of retrieved context
//! - [`config`] - environment and `resources.yaml` configuration
//! - [`types`] - shared document model and error taxonomy

pub mod cli;
pub mod config;
pub mod db;
pub mod ingest;
pub mod llm;
pub mod rag;
pub mod types;

pub use config::Config;
pub use db::{LocalVectorStore, VectorStore};
pub use ingest::ResourceProcessor;
pub use llm::{GenerationProvider, Provider};
pub use rag::{format_context_with_citations, RagEngine};
pub use types::{AppError, DatabaseStats, ResourceDocument, Result, RetrievalResult, SourceType};
