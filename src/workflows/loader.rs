use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use super::definition::WorkflowDefinition;
use super::errors::WorkflowError;

pub const DEFAULT_WORKFLOW_FILE: &str = "workflow.yaml";

/// Where a workflow definition comes from once precedence has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowSource {
    Inline(String),
    Url(String),
    File(PathBuf),
}

impl WorkflowSource {
    /// Pick the source for `location`. Inline content always wins, then
    /// http(s) URLs, then local paths.
    pub fn resolve(inline: Option<&str>, location: &str) -> Self {
        if let Some(content) = inline.filter(|c| !c.trim().is_empty()) {
            return WorkflowSource::Inline(content.to_string());
        }
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            WorkflowSource::Url(location.to_string())
        } else {
            WorkflowSource::File(PathBuf::from(location))
        }
    }
}

/// Loads workflow definitions from inline content, a URL or a file.
#[derive(Debug, Clone)]
pub struct WorkflowLoader {
    inline: Option<String>,
    http: reqwest::Client,
}

impl Default for WorkflowLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowLoader {
    pub fn new() -> Self {
        Self {
            inline: None,
            http: reqwest::Client::new(),
        }
    }

    /// Preset content that takes precedence over any location.
    pub fn with_inline_content(mut self, content: Option<String>) -> Self {
        self.inline = content.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, WorkflowError> {
        self.http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkflowError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    pub fn source_for(&self, location: &str) -> WorkflowSource {
        WorkflowSource::resolve(self.inline.as_deref(), location)
    }

    pub async fn load(&self, location: &str) -> Result<WorkflowDefinition, WorkflowError> {
        let source = self.source_for(location);
        debug!(?source, "loading workflow definition");
        let content = self.read(&source).await?;
        WorkflowDefinition::parse(&content)
    }

    async fn read(&self, source: &WorkflowSource) -> Result<String, WorkflowError> {
        match source {
            WorkflowSource::Inline(content) => Ok(content.clone()),
            WorkflowSource::Url(url) => {
                let response = self.http.get(url).send().await.map_err(|e| {
                    WorkflowError::Config(format!("failed to fetch workflow from {url}: {e}"))
                })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(WorkflowError::Config(format!(
                        "failed to fetch workflow from {url}: HTTP {}",
                        status.as_u16()
                    )));
                }
                response.text().await.map_err(|e| {
                    WorkflowError::Config(format!("failed to read workflow from {url}: {e}"))
                })
            }
            WorkflowSource::File(path) => {
                let exists = tokio::fs::try_exists(path).await.map_err(|e| {
                    WorkflowError::Config(format!(
                        "cannot access workflow file {}: {e}",
                        path.display()
                    ))
                })?;
                if !exists {
                    return Err(WorkflowError::Config(format!(
                        "workflow file not found: {}",
                        path.display()
                    )));
                }
                tokio::fs::read_to_string(path).await.map_err(|e| {
                    WorkflowError::Config(format!(
                        "failed to read workflow file {}: {e}",
                        path.display()
                    ))
                })
            }
        }
    }
}
