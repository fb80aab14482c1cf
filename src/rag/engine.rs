//! The RAG orchestrator: batch ingestion and query-time retrieval.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::{Config, ResourceConfig, ResourcesConfig};
use crate::db::{VectorEntry, VectorStore};
use crate::ingest::{ResourceProcessor, WebResourceKind};
use crate::rag::embeddings::EmbeddingProvider;
use crate::types::{DatabaseStats, ResourceDocument, Result, RetrievalResult};

/// Metadata key carrying the source label used for stale-chunk pruning.
const SOURCE_LABEL_KEY: &str = "source_label";
/// How many metadata records the stats breakdown samples.
const STATS_SAMPLE_LIMIT: usize = 100;

/// One unit of ingestion work: a single configured resource.
struct IngestJob {
    /// Stable label identifying the source across runs (pruning scope).
    label: String,
    metadata: serde_json::Map<String, serde_json::Value>,
    kind: JobKind,
}

enum JobKind {
    Document { path: PathBuf },
    Web { url: String, kind: WebResourceKind },
}

/// End-to-end RAG orchestrator.
///
/// Construction opens (or creates) the backing collection, moving the engine
/// from uninitialized to ready; the engine owns that collection handle for
/// its lifetime. Ingestion writes and force-rebuilds serialize through an
/// internal gate; retrieval runs under a shared read lock, so concurrent
/// queries never observe a half-rebuilt collection.
pub struct RagEngine {
    resources_dir: PathBuf,
    collection: String,
    database_path: String,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    processor: Arc<ResourceProcessor>,
    worker_count: usize,
    gate: RwLock<()>,
}

impl RagEngine {
    /// Open the collection and assemble the engine.
    pub async fn new(
        config: &Config,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        store
            .get_or_create_collection(&config.storage.collection)
            .await?;
        info!(
            collection = %config.storage.collection,
            store = store.provider_name(),
            model = embedder.model_name(),
            "RAG engine ready"
        );

        Ok(Self {
            resources_dir: config.storage.resources_dir.clone(),
            collection: config.storage.collection.clone(),
            database_path: config.storage.db_path.display().to_string(),
            store,
            embedder,
            processor: Arc::new(ResourceProcessor::new(&config.ingest)?),
            worker_count: config.ingest.worker_count.max(1),
            gate: RwLock::new(()),
        })
    }

    /// Swap the resource processor. Lets callers (and tests) supply their
    /// own extraction collaborators.
    pub fn with_processor(mut self, processor: ResourceProcessor) -> Self {
        self.processor = Arc::new(processor);
        self
    }

    /// Process every configured resource and update the vector database.
    ///
    /// Ingestion is best-effort across resources: extraction and fetch
    /// failures are logged and the resource skipped. The final embed+upsert
    /// is all-or-nothing. Returns `true` iff at least one document was
    /// produced and the store write succeeded.
    pub async fn process_all_resources(&self) -> bool {
        match self.run_ingestion().await {
            Ok(count) if count > 0 => {
                info!(documents = count, "successfully processed and stored documents");
                true
            }
            Ok(_) => {
                warn!("no documents were processed");
                false
            }
            Err(e) => {
                error!("error processing resources: {}", e);
                false
            }
        }
    }

    async fn run_ingestion(&self) -> Result<usize> {
        let config = ResourcesConfig::load(&self.resources_dir)?;
        let jobs = self.build_jobs(config.resources);
        if jobs.is_empty() {
            return Ok(0);
        }

        // Independent resources run on a bounded worker pool; the store
        // write below is the single serialized step.
        let results: Vec<(String, Result<Vec<ResourceDocument>>)> =
            futures::stream::iter(jobs)
                .map(|job| self.run_job(job))
                .buffer_unordered(self.worker_count)
                .collect()
                .await;

        let mut documents = Vec::new();
        let mut succeeded_labels = HashSet::new();
        for (label, result) in results {
            match result {
                Ok(docs) => {
                    succeeded_labels.insert(label.clone());
                    for mut doc in docs {
                        doc.metadata
                            .insert(SOURCE_LABEL_KEY.into(), label.clone().into());
                        documents.push(doc);
                    }
                }
                Err(e) => warn!(source = %label, "skipping resource: {}", e),
            }
        }

        if documents.is_empty() {
            return Ok(0);
        }

        let count = documents.len();
        let _writer = self.gate.write().await;
        self.store_documents(documents, &succeeded_labels).await?;
        Ok(count)
    }

    async fn run_job(&self, job: IngestJob) -> (String, Result<Vec<ResourceDocument>>) {
        let result = match &job.kind {
            JobKind::Document { path } => {
                self.processor.process_document(path, &job.metadata).await
            }
            JobKind::Web { url, kind } => {
                self.processor
                    .process_web_resource(url, &job.metadata, *kind)
                    .await
            }
        };
        (job.label, result)
    }

    /// Translate the resource configuration into ingestion jobs. Unknown
    /// profile names are skipped, not errored.
    fn build_jobs(&self, resources: ResourceConfig) -> Vec<IngestJob> {
        let mut jobs = Vec::new();

        if let Some(resume) = resources.resume {
            let path = self.resources_dir.join(&resume.path);
            if path.exists() {
                jobs.push(IngestJob {
                    label: "resume".into(),
                    metadata: doc_metadata(resume.kind.as_deref(), resume.description.as_deref()),
                    kind: JobKind::Document { path },
                });
            } else {
                warn!(path = %path.display(), "resume file not found, skipping");
            }
        }

        for (name, profile) in resources.profiles {
            let Some(kind) = profile_kind(&name) else {
                warn!(profile = %name, "unknown profile type, skipping");
                continue;
            };
            jobs.push(IngestJob {
                label: name,
                metadata: doc_metadata(profile.kind.as_deref(), profile.description.as_deref()),
                kind: JobKind::Web {
                    url: profile.url,
                    kind,
                },
            });
        }

        if let Some(projects) = resources.projects {
            for repo in projects.github_repos {
                jobs.push(IngestJob {
                    label: format!("project:{}", repo.url),
                    metadata: doc_metadata(None, repo.description.as_deref()),
                    kind: JobKind::Web {
                        url: repo.url,
                        kind: WebResourceKind::GithubRepository,
                    },
                });
            }
        }

        jobs
    }

    /// Embed and upsert one batch as a unit, then prune superseded entries.
    async fn store_documents(
        &self,
        documents: Vec<ResourceDocument>,
        succeeded_labels: &HashSet<String>,
    ) -> Result<()> {
        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let new_ids: HashSet<String> = documents.iter().map(|d| d.id.clone()).collect();
        let entries: Vec<VectorEntry> = documents
            .into_iter()
            .zip(embeddings)
            .map(|(doc, embedding)| VectorEntry {
                id: doc.id.clone(),
                embedding,
                metadata: doc.storage_metadata(),
                document: doc.content,
            })
            .collect();

        let written = self.store.upsert(&self.collection, entries).await?;
        info!(entries = written, "stored documents in vector database");

        // Pruning is best-effort: a failure here leaves stale entries behind
        // but never invalidates the batch that was just written.
        if let Err(e) = self.prune_stale(succeeded_labels, &new_ids).await {
            warn!("stale-entry pruning failed: {}", e);
        }
        Ok(())
    }

    /// Remove entries from previous generations of sources that succeeded
    /// this run. Sources that failed this run keep their existing entries,
    /// so a transient fetch failure never evicts still-valid chunks.
    async fn prune_stale(
        &self,
        succeeded_labels: &HashSet<String>,
        new_ids: &HashSet<String>,
    ) -> Result<()> {
        let stored = self.store.sample(&self.collection, usize::MAX).await?;
        let stale: Vec<String> = stored
            .into_iter()
            .filter(|(id, meta)| {
                !new_ids.contains(id)
                    && meta
                        .get(SOURCE_LABEL_KEY)
                        .and_then(|v| v.as_str())
                        .is_some_and(|label| succeeded_labels.contains(label))
            })
            .map(|(id, _)| id)
            .collect();

        if !stale.is_empty() {
            let removed = self.store.delete(&self.collection, &stale).await?;
            info!(removed, "pruned stale entries from previous source generations");
        }
        Ok(())
    }

    /// Retrieve ranked, cited context for a query.
    ///
    /// Failures are absorbed into an empty list; retrieval must never break
    /// the caller's chat flow.
    pub async fn retrieve_context(&self, query: &str, max_results: usize) -> Vec<RetrievalResult> {
        let _reader = self.gate.read().await;
        match self.try_retrieve(query, max_results).await {
            Ok(results) => {
                info!(query, results = results.len(), "retrieved context");
                results
            }
            Err(e) => {
                error!("error retrieving context: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_retrieve(&self, query: &str, max_results: usize) -> Result<Vec<RetrievalResult>> {
        let embedding = self.embedder.embed(query).await?;
        let hits = self
            .store
            .query(&self.collection, &embedding, max_results)
            .await?;

        // Hits arrive ordered by ascending distance; rank follows that order.
        hits.iter()
            .enumerate()
            .map(|(i, hit)| {
                let document = ResourceDocument::from_stored(&hit.id, &hit.document, &hit.metadata)?;
                Ok(RetrievalResult {
                    document,
                    score: 1.0 - hit.distance,
                    rank: i + 1,
                })
            })
            .collect()
    }

    /// Report store totals plus a per-source-type breakdown from a bounded
    /// metadata sample.
    pub async fn get_database_stats(&self) -> Result<DatabaseStats> {
        let _reader = self.gate.read().await;
        let total_documents = self.store.count(&self.collection).await?;
        let sample = self
            .store
            .sample(&self.collection, STATS_SAMPLE_LIMIT)
            .await?;

        let mut source_types: HashMap<String, usize> = HashMap::new();
        for (_, meta) in sample {
            let source_type = meta
                .get("source_type")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();
            *source_types.entry(source_type).or_insert(0) += 1;
        }

        Ok(DatabaseStats {
            total_documents,
            source_types,
            database_path: self.database_path.clone(),
        })
    }

    /// Drop and recreate the collection (force rebuild).
    ///
    /// Holds the gate exclusively: concurrent readers either see the old
    /// collection or the fresh empty one, never a partial state.
    pub async fn rebuild(&self) -> Result<()> {
        let _writer = self.gate.write().await;
        if let Err(e) = self.store.delete_collection(&self.collection).await {
            warn!("could not clear collection: {}", e);
        }
        self.store.get_or_create_collection(&self.collection).await?;
        info!(collection = %self.collection, "collection rebuilt");
        Ok(())
    }
}

fn doc_metadata(
    kind: Option<&str>,
    description: Option<&str>,
) -> serde_json::Map<String, serde_json::Value> {
    let mut meta = serde_json::Map::new();
    if let Some(kind) = kind {
        meta.insert("type".into(), kind.into());
    }
    if let Some(description) = description {
        meta.insert("description".into(), description.into());
    }
    meta
}

fn profile_kind(name: &str) -> Option<WebResourceKind> {
    match name {
        "linkedin" => Some(WebResourceKind::LinkedinProfile),
        "github" => Some(WebResourceKind::GithubProfile),
        _ => None,
    }
}

/// Format retrieved results into a grounding context string and a citation
/// list, preserving rank order.
///
/// Context blocks look like `[Source: <title>]` followed by the content;
/// citations are `- <title>: <url>` or `- <title>` when no URL exists.
pub fn format_context_with_citations(results: &[RetrievalResult]) -> (String, Vec<String>) {
    let mut context_parts = Vec::with_capacity(results.len());
    let mut citations = Vec::with_capacity(results.len());

    for result in results {
        let doc = &result.document;
        context_parts.push(format!("[Source: {}]\n{}", doc.title, doc.content));
        match &doc.source_url {
            Some(url) => citations.push(format!("- {}: {}", doc.title, url)),
            None => citations.push(format!("- {}", doc.title)),
        }
    }

    (context_parts.join("\n\n"), citations)
}
