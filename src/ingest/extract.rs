//! Document text extraction tiers.
//!
//! Extraction runs in two tiers: an optical-recognition pass driving an
//! external command (higher accuracy on scanned or heavily styled documents),
//! falling back to structural PDF text extraction when the first tier errors
//! or produces no text. Both tiers failing is an [`AppError::Extraction`] and
//! the caller skips the resource rather than aborting the run.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::types::{AppError, Result};

/// Extracts plain text from a document file.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the full plain text of the document at `path`.
    async fn extract(&self, path: &Path) -> Result<String>;

    /// Short name used in log messages.
    fn name(&self) -> &'static str;
}

// ============================================================================
// OCR tier: external recognition command
// ============================================================================

/// Drives an external recognition binary that prints extracted text to
/// stdout (`tesseract <input> stdout` by default, configurable via
/// `OCR_COMMAND`). The invocation runs under an explicit timeout; a timeout
/// is treated the same as any other extraction failure.
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandExtractor {
    /// Create an extractor for the given command line. `{input}` in the
    /// argument list is replaced with the document path.
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// The default OCR command, overridable via the `OCR_COMMAND` variable
    /// (a whitespace-separated command line containing `{input}`).
    pub fn from_env(timeout: Duration) -> Self {
        let raw = std::env::var("OCR_COMMAND")
            .unwrap_or_else(|_| "tesseract {input} stdout".to_string());
        let mut parts = raw.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "tesseract".to_string());
        Self::new(program, parts.collect(), timeout)
    }

    fn resolved_args(&self, path: &Path) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace("{input}", &path.to_string_lossy()))
            .collect()
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let args = self.resolved_args(path);
        debug!(program = %self.program, ?args, "running recognition command");

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                AppError::Extraction(format!(
                    "{} timed out after {:?} on {}",
                    self.program,
                    self.timeout,
                    path.display()
                ))
            })?
            .map_err(|e| AppError::Extraction(format!("{} failed to spawn: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Extraction(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &'static str {
        "ocr-command"
    }
}

// ============================================================================
// Structural tier: embedded PDF text
// ============================================================================

/// Structural PDF text extraction via the `pdf-extract` crate. Less accurate
/// than recognition on scanned documents, but needs no external tooling.
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let path: PathBuf = path.to_path_buf();
        // pdf-extract is synchronous and CPU-bound.
        tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text(&path)
                .map_err(|e| AppError::Extraction(format!("{}: {}", path.display(), e)))
        })
        .await
        .map_err(|e| AppError::Extraction(format!("extraction task panicked: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "pdf-text"
    }
}

// ============================================================================
// Tiered combinator
// ============================================================================

/// Tries the primary extractor first, falling back when it errors or returns
/// only whitespace.
pub struct TieredExtractor {
    primary: Box<dyn TextExtractor>,
    fallback: Box<dyn TextExtractor>,
}

impl TieredExtractor {
    pub fn new(primary: Box<dyn TextExtractor>, fallback: Box<dyn TextExtractor>) -> Self {
        Self { primary, fallback }
    }

    /// The default document extraction stack: recognition command first,
    /// structural PDF text second.
    pub fn default_stack(timeout: Duration) -> Self {
        Self::new(
            Box::new(CommandExtractor::from_env(timeout)),
            Box::new(PdfTextExtractor),
        )
    }
}

#[async_trait]
impl TextExtractor for TieredExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let primary_err = match self.primary.extract(path).await {
            Ok(text) if !text.trim().is_empty() => {
                info!(
                    extractor = self.primary.name(),
                    chars = text.len(),
                    "extraction succeeded"
                );
                return Ok(text);
            }
            Ok(_) => AppError::Extraction(format!(
                "{} produced no text for {}",
                self.primary.name(),
                path.display()
            )),
            Err(e) => e,
        };

        warn!(
            extractor = self.primary.name(),
            error = %primary_err,
            "primary extraction failed, trying fallback"
        );

        match self.fallback.extract(path).await {
            Ok(text) if !text.trim().is_empty() => {
                info!(
                    extractor = self.fallback.name(),
                    chars = text.len(),
                    "fallback extraction succeeded"
                );
                Ok(text)
            }
            Ok(_) => Err(AppError::Extraction(format!(
                "both tiers produced no text for {} ({}; {} empty)",
                path.display(),
                primary_err,
                self.fallback.name()
            ))),
            Err(fallback_err) => Err(AppError::Extraction(format!(
                "both tiers failed for {}: {}; {}",
                path.display(),
                primary_err,
                fallback_err
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "tiered"
    }
}
