//! Local persistent vector store.
//!
//! Collections live in memory behind a `parking_lot::RwLock` and are
//! persisted as one JSON file per collection under the store directory.
//! Search is brute-force cosine distance, which is more than adequate for a
//! curated portfolio corpus of a few hundred entries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::vectorstore::{QueryHit, VectorEntry, VectorStore};
use crate::types::{AppError, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    /// BTreeMap keeps persistence output and tie-breaking deterministic.
    entries: BTreeMap<String, VectorEntry>,
}

/// File-backed vector store rooted at an opaque directory path.
pub struct LocalVectorStore {
    path: PathBuf,
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl LocalVectorStore {
    /// Open a store at `path`, creating the directory if needed and loading
    /// any previously persisted collections.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        std::fs::create_dir_all(&path)?;

        let mut collections = BTreeMap::new();
        for dir_entry in std::fs::read_dir(&path)? {
            let file = dir_entry?.path();
            if file.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = std::fs::read_to_string(&file)?;
            let collection: Collection = serde_json::from_str(&raw).map_err(|e| {
                AppError::Store(format!("corrupt collection file {}: {}", file.display(), e))
            })?;
            debug!(collection = name, entries = collection.entries.len(), "loaded collection");
            collections.insert(name.to_string(), collection);
        }

        Ok(Self {
            path,
            collections: RwLock::new(collections),
        })
    }

    /// The persistence directory this store was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn collection_file(&self, name: &str) -> PathBuf {
        self.path.join(format!("{}.json", name))
    }

    fn persist(&self, name: &str, collection: &Collection) -> Result<()> {
        let raw = serde_json::to_string(collection)
            .map_err(|e| AppError::Store(format!("serializing collection '{}': {}", name, e)))?;
        std::fs::write(self.collection_file(name), raw)?;
        Ok(())
    }

    fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 1.0;
        }
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 1.0;
        }
        1.0 - dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    fn provider_name(&self) -> &'static str {
        "local-json"
    }

    async fn get_or_create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write();
        if !collections.contains_key(name) {
            let collection = Collection::default();
            self.persist(name, &collection)?;
            collections.insert(name.to_string(), collection);
            debug!(collection = name, "created collection");
        }
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write();
        collections
            .remove(name)
            .ok_or_else(|| AppError::Store(format!("collection '{}' not found", name)))?;
        let file = self.collection_file(name);
        if file.exists() {
            std::fs::remove_file(file)?;
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, entries: Vec<VectorEntry>) -> Result<usize> {
        let mut collections = self.collections.write();
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::Store(format!("collection '{}' not found", collection)))?;

        let dimensions = col
            .entries
            .values()
            .next()
            .map(|e| e.embedding.len())
            .or_else(|| entries.first().map(|e| e.embedding.len()));

        // Validate the whole batch up front so a bad entry can never leave
        // a partial batch behind in the map or on disk.
        for entry in &entries {
            if entry.embedding.is_empty() {
                return Err(AppError::Store(format!(
                    "entry '{}' has an empty embedding",
                    entry.id
                )));
            }
            if let Some(dims) = dimensions {
                if entry.embedding.len() != dims {
                    return Err(AppError::Store(format!(
                        "entry '{}' has dimension {} but collection '{}' uses {}",
                        entry.id,
                        entry.embedding.len(),
                        collection,
                        dims
                    )));
                }
            }
        }

        let written = entries.len();
        for entry in entries {
            col.entries.insert(entry.id.clone(), entry);
        }

        self.persist(collection, col)?;
        Ok(written)
    }

    async fn query(&self, collection: &str, embedding: &[f32], k: usize) -> Result<Vec<QueryHit>> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| AppError::Store(format!("collection '{}' not found", collection)))?;

        let mut hits: Vec<QueryHit> = col
            .entries
            .values()
            .map(|entry| QueryHit {
                id: entry.id.clone(),
                document: entry.document.clone(),
                metadata: entry.metadata.clone(),
                distance: Self::cosine_distance(embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| AppError::Store(format!("collection '{}' not found", collection)))?;
        Ok(col.entries.len())
    }

    async fn sample(
        &self,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<(String, serde_json::Map<String, serde_json::Value>)>> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| AppError::Store(format!("collection '{}' not found", collection)))?;
        Ok(col
            .entries
            .values()
            .take(limit)
            .map(|e| (e.id.clone(), e.metadata.clone()))
            .collect())
    }

    async fn delete(&self, collection: &str, ids: &[String]) -> Result<usize> {
        let mut collections = self.collections.write();
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::Store(format!("collection '{}' not found", collection)))?;

        let mut removed = 0;
        for id in ids {
            if col.entries.remove(id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            self.persist(collection, col)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, embedding: Vec<f32>, document: &str) -> VectorEntry {
        let mut metadata = serde_json::Map::new();
        metadata.insert("title".into(), format!("Doc {}", id).into());
        VectorEntry {
            id: id.to_string(),
            embedding,
            metadata,
            document: document.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_query_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path()).unwrap();
        store.get_or_create_collection("docs").await.unwrap();

        store
            .upsert(
                "docs",
                vec![
                    entry("a", vec![1.0, 0.0, 0.0], "exact"),
                    entry("b", vec![0.0, 1.0, 0.0], "orthogonal"),
                    entry("c", vec![0.9, 0.1, 0.0], "close"),
                ],
            )
            .await
            .unwrap();

        let hits = store.query("docs", &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "c");
        assert_eq!(hits[2].id, "b");
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits[1].distance <= hits[2].distance);
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path()).unwrap();
        store.get_or_create_collection("docs").await.unwrap();

        store
            .upsert("docs", vec![entry("a", vec![1.0, 0.0], "first")])
            .await
            .unwrap();
        store
            .upsert("docs", vec![entry("a", vec![0.0, 1.0], "second")])
            .await
            .unwrap();

        assert_eq!(store.count("docs").await.unwrap(), 1);
        let hits = store.query("docs", &[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].document, "second");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path()).unwrap();
        store.get_or_create_collection("docs").await.unwrap();

        store
            .upsert("docs", vec![entry("a", vec![1.0, 0.0], "two dims")])
            .await
            .unwrap();
        let err = store
            .upsert("docs", vec![entry("b", vec![1.0, 0.0, 0.0], "three dims")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalVectorStore::open(dir.path()).unwrap();
            store.get_or_create_collection("docs").await.unwrap();
            store
                .upsert("docs", vec![entry("a", vec![1.0, 0.0], "persisted")])
                .await
                .unwrap();
        }

        let reopened = LocalVectorStore::open(dir.path()).unwrap();
        assert_eq!(reopened.count("docs").await.unwrap(), 1);
        let hits = reopened.query("docs", &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].document, "persisted");
    }

    #[tokio::test]
    async fn test_delete_collection_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path()).unwrap();
        store.get_or_create_collection("docs").await.unwrap();
        assert!(dir.path().join("docs.json").exists());

        store.delete_collection("docs").await.unwrap();
        assert!(!dir.path().join("docs.json").exists());
        assert!(store.count("docs").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path()).unwrap();
        store.get_or_create_collection("docs").await.unwrap();
        store
            .upsert(
                "docs",
                vec![
                    entry("a", vec![1.0, 0.0], "one"),
                    entry("b", vec![0.0, 1.0], "two"),
                ],
            )
            .await
            .unwrap();

        let removed = store
            .delete("docs", &["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path()).unwrap();
        store.get_or_create_collection("docs").await.unwrap();

        // A later entry's dimension mismatch must not let the valid prefix
        // through; the batch is all-or-nothing.
        let err = store
            .upsert(
                "docs",
                vec![
                    entry("a", vec![1.0, 0.0], "two dims"),
                    entry("b", vec![1.0, 0.0, 0.0], "three dims"),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert_eq!(store.count("docs").await.unwrap(), 0);
        assert!(store.query("docs", &[1.0, 0.0], 10).await.unwrap().is_empty());

        // Same against a populated collection: the prior contents survive
        // untouched and nothing from the failed batch lands.
        store
            .upsert("docs", vec![entry("a", vec![1.0, 0.0], "existing")])
            .await
            .unwrap();
        let err = store
            .upsert(
                "docs",
                vec![
                    entry("b", vec![0.0, 1.0], "fine"),
                    entry("c", vec![], "empty embedding"),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert_eq!(store.count("docs").await.unwrap(), 1);

        // Reopening from disk shows the same state.
        let reopened = LocalVectorStore::open(dir.path()).unwrap();
        assert_eq!(reopened.count("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_k_larger_than_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path()).unwrap();
        store.get_or_create_collection("docs").await.unwrap();
        store
            .upsert("docs", vec![entry("a", vec![1.0, 0.0], "only")])
            .await
            .unwrap();

        let hits = store.query("docs", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
