//! Retrieval-augmented generation pipeline.
//!
//! The pipeline flow:
//!
//! 1. **Ingestion** - configured resources are processed into documents
//! 2. **Embedding** - document text is encoded into fixed-dimension vectors
//! 3. **Storage** - entries are upserted into the vector store by stable id
//! 4. **Retrieval** - queries are embedded and matched by cosine similarity
//! 5. **Citation** - ranked results are formatted into context plus citations
//!
//! [`RagEngine`] orchestrates all of it and owns the collection handle for
//! its lifetime; construct one at startup and pass it by reference.

pub mod embeddings;
pub mod engine;

pub use embeddings::{EmbeddingProvider, RemoteEmbedder};
pub use engine::{format_context_with_citations, RagEngine};
