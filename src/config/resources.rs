//! Resource inventory model (`resources.yaml`).
//!
//! The configuration document has the shape:
//!
//! ```yaml
//! resources:
//!   resume: { path: resume.pdf, type: pdf, description: "Current resume" }
//!   profiles:
//!     linkedin: { url: "https://...", type: social, description: "..." }
//!     github:   { url: "https://...", type: social, description: "..." }
//!   projects:
//!     github_repos:
//!       - { url: "https://github.com/...", description: "..." }
//! ```
//!
//! Profile names other than `linkedin` and `github` are skipped, not errored;
//! the orchestrator decides which names it knows how to process.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{AppError, Result};

/// Root of the resources configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    pub resources: ResourceConfig,
}

/// The configured resource groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// The resume document, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<DocumentConfig>,
    /// Profile pages keyed by profile name (`linkedin`, `github`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, ProfileConfig>,
    /// Project repositories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<ProjectsConfig>,
}

/// A file-backed document resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Path relative to the resources directory.
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A profile page resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Project resource groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectsConfig {
    #[serde(default)]
    pub github_repos: Vec<RepoConfig>,
}

/// One project repository page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ResourcesConfig {
    /// Load `resources.yaml` from the given resources directory.
    ///
    /// A missing file, unparseable YAML, or a document without the root
    /// `resources` key all yield [`AppError::Config`].
    pub fn load(resources_dir: &Path) -> Result<Self> {
        let path = resources_dir.join("resources.yaml");
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: ResourcesConfig = serde_yaml::from_str(&raw)
            .map_err(|e| AppError::Config(format!("malformed {}: {}", path.display(), e)))?;
        Ok(config)
    }
}
