//! Web resource fetching and HTML field extraction.
//!
//! The [`PageFetcher`] owns a `reqwest` client with an explicit timeout and
//! retries transient failures with exponential backoff. The extraction
//! helpers pull a bounded set of salient fields out of each page kind with
//! CSS selectors; everything else on the page is ignored.

use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::types::{AppError, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// HTTP page fetcher with timeout and bounded retry.
pub struct PageFetcher {
    client: reqwest::Client,
    retries: u32,
}

impl PageFetcher {
    /// Build a fetcher whose every request is bounded by `timeout` and
    /// retried up to `retries` times on network failure.
    pub fn new(timeout: Duration, retries: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, retries })
    }

    /// Fetch the page body, retrying with exponential backoff.
    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let mut last_err = AppError::Network(format!("no attempt made for {}", url));

        for attempt in 0..=self.retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(500 * 2u64.pow(attempt - 1));
                debug!(url, attempt, ?backoff, "retrying fetch");
                tokio::time::sleep(backoff).await;
            }

            match self.try_fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!(url, attempt, error = %e, "fetch attempt failed");
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Network(format!("GET {} returned {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::Network(format!("reading body of {} failed: {}", url, e)))
    }
}

// ============================================================================
// Field extraction
// ============================================================================

/// Salient fields of a profile page.
#[derive(Debug, Default, Clone)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub bio: Option<String>,
}

/// Salient fields of a repository page.
#[derive(Debug, Default, Clone)]
pub struct RepoFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub readme_excerpt: Option<String>,
}

/// Salient fields of an article page.
#[derive(Debug, Default, Clone)]
pub struct ArticleFields {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub lead_paragraphs: Vec<String>,
}

/// Salient fields of a paper / publication page.
#[derive(Debug, Default, Clone)]
pub struct PaperFields {
    pub title: Option<String>,
    pub abstract_text: Option<String>,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Network(format!("bad selector '{}': {}", css, e)))
}

fn first_text(doc: &Html, css: &str) -> Result<Option<String>> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|t| !t.is_empty()))
}

/// Extract profile name and bio from a GitHub profile page.
pub fn extract_github_profile(html: &str) -> Result<ProfileFields> {
    let doc = Html::parse_document(html);
    Ok(ProfileFields {
        name: first_text(&doc, "span.p-name")?,
        bio: first_text(&doc, "div.p-note")?,
    })
}

/// Extract name and summary from a generic social profile page via
/// OpenGraph metadata. Used for LinkedIn, which serves no parseable body
/// to anonymous clients.
pub fn extract_social_profile(html: &str) -> Result<ProfileFields> {
    let doc = Html::parse_document(html);
    let meta = |property: &str| -> Result<Option<String>> {
        let sel = selector(&format!(r#"meta[property="{}"]"#, property))?;
        Ok(doc
            .select(&sel)
            .filter_map(|el| el.value().attr("content"))
            .map(|c| c.trim().to_string())
            .find(|c| !c.is_empty()))
    };
    Ok(ProfileFields {
        name: meta("og:title")?,
        bio: meta("og:description")?,
    })
}

/// Extract repository name, description, and a README excerpt from a GitHub
/// repository page. The README excerpt is capped at 1000 characters.
pub fn extract_github_repo(html: &str) -> Result<RepoFields> {
    let doc = Html::parse_document(html);
    let readme_excerpt = first_text(&doc, "article.markdown-body")?
        .map(|text| text.chars().take(1000).collect::<String>());
    Ok(RepoFields {
        name: first_text(&doc, r#"strong[itemprop="name"]"#)?,
        description: first_text(&doc, r#"p[itemprop="about"]"#)?,
        readme_excerpt,
    })
}

/// Extract title, subtitle, and the first three non-empty paragraphs from an
/// article page.
pub fn extract_article(html: &str) -> Result<ArticleFields> {
    let doc = Html::parse_document(html);
    let p = selector("p")?;
    let lead_paragraphs = doc
        .select(&p)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .take(3)
        .collect();
    Ok(ArticleFields {
        title: first_text(&doc, "h1")?,
        subtitle: first_text(&doc, "h2")?,
        lead_paragraphs,
    })
}

/// Extract title and abstract from a paper page. Abstract markup varies
/// wildly by platform, so only the common `abstract`-classed containers are
/// tried.
pub fn extract_paper(html: &str) -> Result<PaperFields> {
    let doc = Html::parse_document(html);
    let abstract_text = match first_text(&doc, "div.abstract")? {
        Some(text) => Some(text),
        None => first_text(&doc, "p.abstract")?,
    };
    Ok(PaperFields {
        title: first_text(&doc, "title")?,
        abstract_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_github_profile_fields() {
        let html = r#"
            <html><body>
              <span class="p-name">Manas Sanjay</span>
              <div class="p-note"><div>AI engineer and systems tinkerer</div></div>
            </body></html>"#;
        let fields = extract_github_profile(html).unwrap();
        assert_eq!(fields.name.as_deref(), Some("Manas Sanjay"));
        assert_eq!(fields.bio.as_deref(), Some("AI engineer and systems tinkerer"));
    }

    #[test]
    fn test_extract_github_repo_fields() {
        let html = r#"
            <html><body>
              <strong itemprop="name"><a href="/x/folio">folio</a></strong>
              <p itemprop="about">Portfolio website with a RAG chatbot</p>
              <article class="markdown-body"><p>Readme intro paragraph.</p></article>
            </body></html>"#;
        let fields = extract_github_repo(html).unwrap();
        assert_eq!(fields.name.as_deref(), Some("folio"));
        assert_eq!(
            fields.description.as_deref(),
            Some("Portfolio website with a RAG chatbot")
        );
        assert_eq!(fields.readme_excerpt.as_deref(), Some("Readme intro paragraph."));
    }

    #[test]
    fn test_readme_excerpt_capped() {
        let long = "x".repeat(5000);
        let html = format!(
            r#"<article class="markdown-body">{}</article>"#,
            long
        );
        let fields = extract_github_repo(&html).unwrap();
        assert_eq!(fields.readme_excerpt.unwrap().len(), 1000);
    }

    #[test]
    fn test_extract_article_takes_three_paragraphs() {
        let html = r#"
            <h1>On Retrieval</h1>
            <h2>Grounding generation in citations</h2>
            <p>First.</p><p> </p><p>Second.</p><p>Third.</p><p>Fourth.</p>"#;
        let fields = extract_article(html).unwrap();
        assert_eq!(fields.title.as_deref(), Some("On Retrieval"));
        assert_eq!(fields.subtitle.as_deref(), Some("Grounding generation in citations"));
        assert_eq!(fields.lead_paragraphs, vec!["First.", "Second.", "Third."]);
    }

    #[test]
    fn test_extract_paper_falls_back_to_p_abstract() {
        let html = r#"
            <title>A Study of Things</title>
            <p class="abstract">We study things.</p>"#;
        let fields = extract_paper(html).unwrap();
        assert_eq!(fields.title.as_deref(), Some("A Study of Things"));
        assert_eq!(fields.abstract_text.as_deref(), Some("We study things."));
    }

    #[test]
    fn test_extract_social_profile_og_tags() {
        let html = r#"
            <head>
              <meta property="og:title" content="Manas Sanjay - AI Engineer" />
              <meta property="og:description" content="Professional profile" />
            </head>"#;
        let fields = extract_social_profile(html).unwrap();
        assert_eq!(fields.name.as_deref(), Some("Manas Sanjay - AI Engineer"));
        assert_eq!(fields.bio.as_deref(), Some("Professional profile"));
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_network_error() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(Duration::from_secs(5), 0).unwrap();
        let err = fetcher.fetch_html(&server.uri()).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }

    #[tokio::test]
    async fn test_fetch_retries_until_success() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(Duration::from_secs(5), 2).unwrap();
        let body = fetcher.fetch_html(&server.uri()).await.unwrap();
        assert!(body.contains("ok"));
    }
}
