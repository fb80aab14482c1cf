//! Core types for the portfolio RAG pipeline.
//!
//! The canonical record flowing through the pipeline is [`ResourceDocument`]:
//! every configured resource (resume PDF, profile page, project repository,
//! article, paper) is turned into one or more of these, embedded, and stored.
//! Retrieval wraps documents in [`RetrievalResult`] with a similarity score
//! and 1-based rank.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============= Source Types =============

/// Closed set of resource kinds the pipeline knows how to ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    /// Chunked resume / CV document.
    Resume,
    /// LinkedIn profile page.
    Linkedin,
    /// GitHub profile page.
    GithubProfile,
    /// GitHub project repository page.
    Project,
    /// Medium article.
    Medium,
    /// Research paper or publication page.
    Paper,
}

impl SourceType {
    /// Stable string form used in stored metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Resume => "resume",
            SourceType::Linkedin => "linkedin",
            SourceType::GithubProfile => "github-profile",
            SourceType::Project => "project",
            SourceType::Medium => "medium",
            SourceType::Paper => "paper",
        }
    }
}

impl FromStr for SourceType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "resume" => Ok(SourceType::Resume),
            "linkedin" => Ok(SourceType::Linkedin),
            "github-profile" => Ok(SourceType::GithubProfile),
            "project" => Ok(SourceType::Project),
            "medium" => Ok(SourceType::Medium),
            "paper" => Ok(SourceType::Paper),
            other => Err(AppError::Store(format!("unknown source type: {}", other))),
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Document Model =============

/// A processed document with metadata, ready for embedding and storage.
///
/// The `id` is derived deterministically from a source label and an 8-char
/// MD5 prefix of the content, so re-ingesting unchanged content always
/// produces the same ids and upserts replace in place instead of
/// accumulating duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDocument {
    /// Deterministic document id (`<label>_<8 hex chars of md5(content)>`).
    pub id: String,
    /// Normalized plain-text content.
    pub content: String,
    /// Which kind of resource this document came from.
    pub source_type: SourceType,
    /// Source URL for web-derived documents; `None` for file-derived chunks.
    pub source_url: Option<String>,
    /// Short human-readable label.
    pub title: String,
    /// Description, usually sourced from configuration metadata.
    pub description: String,
    /// Open extension map merging processor- and configuration-provided pairs.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// When this document was processed.
    pub created_at: DateTime<Utc>,
    /// Ordinal position when the source was split into multiple chunks.
    pub chunk_index: Option<usize>,
}

impl ResourceDocument {
    /// Flatten the fixed fields and the open extension map into the single
    /// metadata record stored alongside the embedding.
    ///
    /// Fixed fields win over same-named extension keys so a stored record
    /// can always be reconstructed via [`ResourceDocument::from_stored`].
    pub fn storage_metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut meta = self.metadata.clone();
        meta.insert("source_type".into(), self.source_type.as_str().into());
        meta.insert(
            "source_url".into(),
            self.source_url.clone().unwrap_or_default().into(),
        );
        meta.insert("title".into(), self.title.clone().into());
        meta.insert("description".into(), self.description.clone().into());
        meta.insert("created_at".into(), self.created_at.to_rfc3339().into());
        meta.insert(
            "chunk_index".into(),
            (self.chunk_index.unwrap_or(0) as u64).into(),
        );
        meta
    }

    /// Rebuild a document from the id, raw text, and metadata returned by a
    /// vector store query.
    pub fn from_stored(
        id: &str,
        content: &str,
        metadata: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        let str_field = |key: &str| -> String {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        let source_type = metadata
            .get("source_type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::Store(format!("stored entry '{}' missing source_type", id)))?
            .parse::<SourceType>()?;

        let source_url = match str_field("source_url") {
            url if url.is_empty() => None,
            url => Some(url),
        };

        let created_at = metadata
            .get("created_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let chunk_index = metadata
            .get("chunk_index")
            .and_then(|v| v.as_u64())
            .map(|i| i as usize);

        Ok(ResourceDocument {
            id: id.to_string(),
            content: content.to_string(),
            source_type,
            source_url,
            title: str_field("title"),
            description: str_field("description"),
            metadata: metadata.clone(),
            created_at,
            chunk_index,
        })
    }
}

// ============= Retrieval Types =============

/// A retrieved document with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The stored document this hit refers to.
    pub document: ResourceDocument,
    /// Similarity score, `1 - distance`; higher is more relevant.
    pub score: f32,
    /// 1-based rank, consistent with descending score order.
    pub rank: usize,
}

/// Summary statistics about the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseStats {
    /// Total number of stored documents.
    pub total_documents: usize,
    /// Per-source-type counts, from a bounded metadata sample.
    pub source_types: HashMap<String, usize>,
    /// Persistence directory of the backing store.
    pub database_path: String,
}

// ============= Error Types =============

/// Error taxonomy for the pipeline.
///
/// Propagation policy: per-resource `Extraction`/`Network` failures are
/// recovered locally (logged and skipped), batch-level `Embedding`/`Store`
/// failures fail the whole ingestion call, and retrieval errors are absorbed
/// into an empty result list to keep the chat path resilient.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Resource configuration missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Both extraction tiers failed for a document resource.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Fetch of a web resource failed (non-2xx, timeout, connection error).
    #[error("Network error: {0}")]
    Network(String),

    /// The embedding encoder failed on one or more documents.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Upsert/query against the vector store failed.
    #[error("Store error: {0}")]
    Store(String),

    /// LLM provider failure in the answer-generation step.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Filesystem fault surfaced by extraction or persistence.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_round_trip() {
        for st in [
            SourceType::Resume,
            SourceType::Linkedin,
            SourceType::GithubProfile,
            SourceType::Project,
            SourceType::Medium,
            SourceType::Paper,
        ] {
            assert_eq!(st.as_str().parse::<SourceType>().unwrap(), st);
        }
        assert!("gitlab".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_storage_metadata_round_trip() {
        let mut extra = serde_json::Map::new();
        extra.insert("total_chunks".into(), 3u64.into());

        let doc = ResourceDocument {
            id: "resume_chunk_0_deadbeef".into(),
            content: "Some resume text".into(),
            source_type: SourceType::Resume,
            source_url: None,
            title: "Resume".into(),
            description: "Resume content - Chunk 1".into(),
            metadata: extra,
            created_at: Utc::now(),
            chunk_index: Some(0),
        };

        let meta = doc.storage_metadata();
        assert_eq!(meta["source_type"], "resume");
        assert_eq!(meta["source_url"], "");
        assert_eq!(meta["total_chunks"], 3);

        let rebuilt = ResourceDocument::from_stored(&doc.id, &doc.content, &meta).unwrap();
        assert_eq!(rebuilt.id, doc.id);
        assert_eq!(rebuilt.source_type, SourceType::Resume);
        assert_eq!(rebuilt.source_url, None);
        assert_eq!(rebuilt.chunk_index, Some(0));
        assert_eq!(rebuilt.title, "Resume");
    }

    #[test]
    fn test_web_document_keeps_url() {
        let doc = ResourceDocument {
            id: "linkedin_12345678".into(),
            content: "LinkedIn profile".into(),
            source_type: SourceType::Linkedin,
            source_url: Some("https://linkedin.com/in/example".into()),
            title: "LinkedIn Profile".into(),
            description: "profile".into(),
            metadata: serde_json::Map::new(),
            created_at: Utc::now(),
            chunk_index: None,
        };

        let meta = doc.storage_metadata();
        let rebuilt = ResourceDocument::from_stored(&doc.id, &doc.content, &meta).unwrap();
        assert_eq!(
            rebuilt.source_url.as_deref(),
            Some("https://linkedin.com/in/example")
        );
    }
}
