use anyhow::{Context, Result};
use std::sync::Arc;

use super::{connect, ensure_batch_success, print_batch_summary, Command};
use crate::config::JiraCliConfig;
use crate::tracker::{project_key, TrackerError};
use crate::workflows::{dispatch, WorkflowError};

/// Issue created together with a freshly created version.
#[derive(Debug, Clone)]
pub struct DeploymentIssue {
    pub summary: String,
    pub description: String,
    pub issue_type: String,
}

pub struct FixVersionCommand {
    pub config: JiraCliConfig,
    pub version: String,
    pub keys: Vec<String>,
    pub create_version: bool,
    pub deployment_issue: Option<DeploymentIssue>,
}

/// What happened to one issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assignment {
    Set,
    AlreadySet,
}

impl FixVersionCommand {
    pub fn new(config: JiraCliConfig, version: String, keys: Vec<String>) -> Self {
        Self {
            config,
            version,
            keys,
            create_version: true,
            deployment_issue: None,
        }
    }

    pub fn with_create(mut self, create_version: bool, deployment_issue: Option<DeploymentIssue>) -> Self {
        self.create_version = create_version;
        self.deployment_issue = deployment_issue;
        self
    }

    /// Projects touched by the batch, in first-seen order.
    fn projects(&self) -> Result<Vec<String>> {
        let mut projects: Vec<String> = Vec::new();
        for key in &self.keys {
            let project = project_key(key)?.to_uppercase();
            if !projects.contains(&project) {
                projects.push(project);
            }
        }
        Ok(projects)
    }
}

impl Command for FixVersionCommand {
    async fn execute(&self) -> Result<()> {
        let client = connect(&self.config)?;

        // Versions are created once per project before fanning out.
        if self.create_version {
            for project in self.projects()? {
                let (_, created) = client
                    .create_version(&project, &self.version)
                    .await
                    .with_context(|| format!("Failed to create version {} in {project}", self.version))?;
                if !created {
                    continue;
                }
                println!("✅ Created version {} in {project}", self.version);
                if let Some(deployment) = &self.deployment_issue {
                    let issue = client
                        .create_issue(
                            &project,
                            &deployment.summary,
                            &deployment.description,
                            &deployment.issue_type,
                        )
                        .await?;
                    println!("✅ Created deployment issue {}", issue.key);
                }
            }
        }

        let version = self.version.clone();
        let report = dispatch(&self.keys, |key| {
            let client = Arc::clone(&client);
            let version = version.clone();
            async move {
                match client.set_fix_version(&key, &version).await {
                    Ok(()) => Ok(Assignment::Set),
                    Err(TrackerError::FixVersionAlreadySet { .. }) => Ok(Assignment::AlreadySet),
                    Err(e) => Err(WorkflowError::from(e)),
                }
            }
        })
        .await;

        for result in &report.results {
            match result.result {
                Ok(Assignment::Set) => println!("✅ {}: fix version set to {}", result.issue_key, self.version),
                Ok(Assignment::AlreadySet) => {
                    println!("⏭️  {}: fix version already set, left unchanged", result.issue_key)
                }
                Err(_) => {}
            }
        }

        print_batch_summary(&report);
        ensure_batch_success(&report)
    }
}
