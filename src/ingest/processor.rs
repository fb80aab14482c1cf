//! The resource processor: one raw resource in, documents out.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::ingest::chunker::TokenChunker;
use crate::ingest::extract::{TextExtractor, TieredExtractor};
use crate::ingest::web::{self, PageFetcher};
use crate::types::{AppError, ResourceDocument, Result, SourceType};

/// Which kind of web page a URL points at, decided by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebResourceKind {
    LinkedinProfile,
    GithubProfile,
    GithubRepository,
    MediumArticle,
    Paper,
}

/// Generate a deterministic document id from a source label and content.
///
/// Format: `<label>_<first 8 hex chars of md5(content)>`. Same inputs always
/// produce the same id; this is what makes re-ingestion a true upsert.
pub fn doc_id(source_label: &str, content: &str) -> String {
    let digest = format!("{:x}", md5::compute(content.as_bytes()));
    format!("{}_{}", source_label, &digest[..8])
}

/// Collapse whitespace runs and strip non-printable characters.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Converts one raw resource (document file or web page) into zero or more
/// [`ResourceDocument`] records.
pub struct ResourceProcessor {
    extractor: Box<dyn TextExtractor>,
    chunker: TokenChunker,
    fetcher: PageFetcher,
}

impl ResourceProcessor {
    /// Build a processor from ingestion configuration, with the default
    /// extraction stack (recognition command, structural PDF fallback).
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        Ok(Self {
            extractor: Box::new(TieredExtractor::default_stack(timeout)),
            chunker: TokenChunker::new(config.chunk_max_tokens, config.min_chunk_chars),
            fetcher: PageFetcher::new(timeout, config.fetch_retries)?,
        })
    }

    /// Replace the extraction stack. Used by tests and by callers that bring
    /// their own extraction collaborator.
    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Process a document file into chunked resume documents.
    ///
    /// Extraction failures (both tiers) surface as [`AppError::Extraction`];
    /// the caller is expected to skip the resource and continue the run.
    pub async fn process_document(
        &self,
        path: &Path,
        metadata: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<ResourceDocument>> {
        info!(path = %path.display(), "processing document resource");

        let raw = self.extractor.extract(path).await?;
        let text = clean_text(&raw);
        if text.is_empty() {
            return Err(AppError::Extraction(format!(
                "no usable text in {}",
                path.display()
            )));
        }

        let chunks = self.chunker.chunk(&text);
        let total_chunks = chunks.len();
        let title = metadata
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Resume")
            .to_string();

        let documents = chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let mut meta = metadata.clone();
                meta.insert("chunk_index".into(), (i as u64).into());
                meta.insert("total_chunks".into(), (total_chunks as u64).into());

                ResourceDocument {
                    id: doc_id(&format!("resume_chunk_{}", i), &chunk),
                    content: chunk,
                    source_type: SourceType::Resume,
                    source_url: None,
                    title: title.clone(),
                    description: format!("Resume content - Chunk {}", i + 1),
                    metadata: meta,
                    created_at: Utc::now(),
                    chunk_index: Some(i),
                }
            })
            .collect::<Vec<_>>();

        info!(chunks = documents.len(), "document processed");
        Ok(documents)
    }

    /// Process a web resource into a single descriptive document.
    ///
    /// Web pages are already short summaries, so they are not chunked
    /// further. Fetch or parse failures surface as [`AppError::Network`].
    pub async fn process_web_resource(
        &self,
        url: &str,
        metadata: &serde_json::Map<String, serde_json::Value>,
        kind: WebResourceKind,
    ) -> Result<Vec<ResourceDocument>> {
        info!(url, ?kind, "processing web resource");
        let html = self.fetcher.fetch_html(url).await?;

        let described = |default: &str| -> String {
            metadata
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or(default)
                .to_string()
        };

        let (label, content, source_type, title, description) = match kind {
            WebResourceKind::LinkedinProfile => {
                let fields = web::extract_social_profile(&html)?;
                let mut content = format!("LinkedIn Profile: {}\n\n", url);
                if let Some(name) = &fields.name {
                    content.push_str(&format!("Profile Name: {}\n", name));
                }
                if let Some(bio) = &fields.bio {
                    content.push_str(&format!("Bio: {}\n", bio));
                }
                content.push_str(
                    "\nThe profile contains professional experience, education, \
                     skills, and career milestones. Visit the profile for \
                     detailed and up-to-date information.",
                );
                (
                    "linkedin".to_string(),
                    content,
                    SourceType::Linkedin,
                    "LinkedIn Profile".to_string(),
                    described("LinkedIn professional profile"),
                )
            }
            WebResourceKind::GithubProfile => {
                let fields = web::extract_github_profile(&html)?;
                let mut content = format!("GitHub Profile: {}\n\n", url);
                if let Some(name) = &fields.name {
                    content.push_str(&format!("Profile Name: {}\n", name));
                }
                if let Some(bio) = &fields.bio {
                    content.push_str(&format!("Bio: {}\n", bio));
                }
                content.push_str(
                    "\nThis GitHub profile showcases software projects, open \
                     source contributions, and the programming languages used \
                     across them.",
                );
                (
                    "github_profile".to_string(),
                    content,
                    SourceType::GithubProfile,
                    "GitHub Profile".to_string(),
                    described("GitHub profile with repositories"),
                )
            }
            WebResourceKind::GithubRepository => {
                let fields = web::extract_github_repo(&html)?;
                let repo_name = fields.name.clone().unwrap_or_else(|| "Repository".to_string());
                let mut content = format!("GitHub Repository: {}\n\n", url);
                content.push_str(&format!("Repository: {}\n", repo_name));
                if let Some(desc) = &fields.description {
                    content.push_str(&format!("Description: {}\n\n", desc));
                }
                if let Some(readme) = &fields.readme_excerpt {
                    content.push_str(&format!("README Summary:\n{}\n", readme));
                }
                (
                    format!("github_repo_{}", repo_name),
                    content,
                    SourceType::Project,
                    format!("GitHub Project: {}", repo_name),
                    described("GitHub repository"),
                )
            }
            WebResourceKind::MediumArticle => {
                let fields = web::extract_article(&html)?;
                let article_title = fields.title.clone().unwrap_or_else(|| "Article".to_string());
                let mut content = format!("Medium Article: {}\n\n", url);
                content.push_str(&format!("Title: {}\n", article_title));
                if let Some(subtitle) = &fields.subtitle {
                    content.push_str(&format!("Subtitle: {}\n\n", subtitle));
                }
                for paragraph in &fields.lead_paragraphs {
                    content.push_str(paragraph);
                    content.push_str("\n\n");
                }
                content.push_str(
                    "This article contains detailed insights and technical \
                     content. Visit the link for the complete article.",
                );
                (
                    format!("medium_{}", article_title),
                    content,
                    SourceType::Medium,
                    format!("Medium Article: {}", article_title),
                    described("Medium article"),
                )
            }
            WebResourceKind::Paper => {
                let fields = web::extract_paper(&html)?;
                let paper_title = fields
                    .title
                    .clone()
                    .unwrap_or_else(|| "Publication".to_string());
                let mut content = format!("Research Paper: {}\n\n", url);
                content.push_str(&format!("Title: {}\n\n", paper_title));
                match &fields.abstract_text {
                    Some(abstract_text) => {
                        content.push_str(&format!("Abstract: {}\n\n", abstract_text));
                    }
                    None => {
                        content.push_str(
                            "This is a research paper or publication containing \
                             academic findings and technical contributions. Visit \
                             the link for the complete paper.\n",
                        );
                    }
                }
                (
                    format!("paper_{}", paper_title),
                    content,
                    SourceType::Paper,
                    format!("Research Paper: {}", paper_title),
                    described("Research paper"),
                )
            }
        };

        let content = clean_text(&content);
        if content.is_empty() {
            warn!(url, "web resource produced no content");
            return Err(AppError::Network(format!("no content extracted from {}", url)));
        }

        Ok(vec![ResourceDocument {
            id: doc_id(&label, &content),
            content,
            source_type,
            source_url: Some(url.to_string()),
            title,
            description,
            metadata: metadata.clone(),
            created_at: Utc::now(),
            chunk_index: None,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn test_config() -> IngestConfig {
        IngestConfig {
            chunk_max_tokens: 500,
            min_chunk_chars: 20,
            fetch_timeout_secs: 5,
            fetch_retries: 0,
            worker_count: 2,
        }
    }

    struct StaticText(&'static str);

    #[async_trait]
    impl TextExtractor for StaticText {
        async fn extract(&self, _path: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &'static str {
            "static"
        }
    }

    #[test]
    fn test_doc_id_is_deterministic() {
        let a = doc_id("resume_chunk_0", "Manas knows Python, Go, and Rust.");
        let b = doc_id("resume_chunk_0", "Manas knows Python, Go, and Rust.");
        assert_eq!(a, b);
        assert!(a.starts_with("resume_chunk_0_"));
        assert_eq!(a.len(), "resume_chunk_0_".len() + 8);
    }

    #[test]
    fn test_doc_id_changes_with_content() {
        let a = doc_id("resume_chunk_0", "old content here");
        let b = doc_id("resume_chunk_0", "new content here");
        assert_ne!(a, b);
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(
            clean_text("  hello \n\t world \u{0007} again  "),
            "hello world again"
        );
    }

    #[tokio::test]
    async fn test_process_document_single_chunk() {
        let processor = ResourceProcessor::new(&test_config())
            .unwrap()
            .with_extractor(Box::new(StaticText("Manas knows Python, Go, and Rust.")));

        let mut meta = serde_json::Map::new();
        meta.insert("description".into(), "Current resume".into());

        let docs = processor
            .process_document(Path::new("resume.pdf"), &meta)
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert_eq!(doc.source_type, SourceType::Resume);
        assert_eq!(doc.chunk_index, Some(0));
        assert_eq!(doc.content, "Manas knows Python, Go, and Rust.");
        assert_eq!(doc.title, "Current resume");
        assert_eq!(doc.source_url, None);
        assert_eq!(doc.metadata["total_chunks"], 1);
    }

    #[tokio::test]
    async fn test_process_document_ids_stable_across_runs() {
        let text = "Engineering leadership across AI platforms. \
                    Shipped retrieval systems at scale. \
                    Mentored teams on production Rust services.";
        let processor = ResourceProcessor::new(&test_config())
            .unwrap()
            .with_extractor(Box::new(StaticText(text)));

        let meta = serde_json::Map::new();
        let first = processor
            .process_document(Path::new("resume.pdf"), &meta)
            .await
            .unwrap();
        let second = processor
            .process_document(Path::new("resume.pdf"), &meta)
            .await
            .unwrap();

        let first_ids: Vec<_> = first.iter().map(|d| d.id.clone()).collect();
        let second_ids: Vec<_> = second.iter().map(|d| d.id.clone()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_process_web_resource_github_repo() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                r#"<html><body>
                     <strong itemprop="name"><a href="/x/folio">folio</a></strong>
                     <p itemprop="about">Portfolio with a RAG chatbot</p>
                   </body></html>"#,
            ))
            .mount(&server)
            .await;

        let processor = ResourceProcessor::new(&test_config()).unwrap();
        let docs = processor
            .process_web_resource(&server.uri(), &serde_json::Map::new(), WebResourceKind::GithubRepository)
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        let doc = &docs[0];
        assert_eq!(doc.source_type, SourceType::Project);
        assert_eq!(doc.source_url.as_deref(), Some(server.uri().as_str()));
        assert_eq!(doc.title, "GitHub Project: folio");
        assert!(doc.content.contains("Portfolio with a RAG chatbot"));
        assert!(doc.id.starts_with("github_repo_folio_"));
    }

    #[tokio::test]
    async fn test_process_web_resource_fetch_failure() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let processor = ResourceProcessor::new(&test_config()).unwrap();
        let err = processor
            .process_web_resource(&server.uri(), &serde_json::Map::new(), WebResourceKind::MediumArticle)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }
}
