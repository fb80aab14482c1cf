//! The vector store contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Result;

/// One entry in a collection: id, embedding, flattened metadata, raw text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Stable entry id; upserting an existing id replaces the entry.
    pub id: String,
    /// Embedding vector; all entries of a collection share one dimension.
    pub embedding: Vec<f32>,
    /// Flattened document metadata.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Raw document text.
    pub document: String,
}

/// One k-NN query hit, carrying everything needed to rebuild a document.
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Cosine distance to the query embedding; lower is closer.
    pub distance: f32,
}

/// Abstract vector database operations.
///
/// Implementations must return query hits ordered by ascending distance and
/// must treat upsert as replace-in-place for existing ids.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of this backend, for logs and stats.
    fn provider_name(&self) -> &'static str;

    /// Open the named collection, creating it if it does not exist.
    async fn get_or_create_collection(&self, name: &str) -> Result<()>;

    /// Delete a collection and all its entries.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert-or-replace entries by id. Returns the number written.
    ///
    /// # Errors
    ///
    /// Fails if the collection does not exist or an entry's embedding
    /// dimension disagrees with the collection's.
    async fn upsert(&self, collection: &str, entries: Vec<VectorEntry>) -> Result<usize>;

    /// k-nearest-neighbor query, hits ordered by ascending distance.
    async fn query(&self, collection: &str, embedding: &[f32], k: usize) -> Result<Vec<QueryHit>>;

    /// Number of entries in the collection.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// A bounded sample of `(id, metadata)` pairs, at most `limit` entries.
    async fn sample(
        &self,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<(String, serde_json::Map<String, serde_json::Value>)>>;

    /// Delete entries by id. Returns the number actually removed.
    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize>;
}
