use anyhow::{Context, Result};

use super::{connect, Command};
use crate::config::JiraCliConfig;

pub struct VersionListCommand {
    pub config: JiraCliConfig,
    pub project: String,
}

impl VersionListCommand {
    pub fn new(config: JiraCliConfig, project: String) -> Self {
        Self { config, project }
    }
}

impl Command for VersionListCommand {
    async fn execute(&self) -> Result<()> {
        let client = connect(&self.config)?;
        let versions = client.get_versions(&self.project).await?;

        for version in versions {
            let state = match (version.released, version.archived) {
                (_, true) => "archived",
                (true, false) => "released",
                (false, false) => "unreleased",
            };
            println!("{:<24} {state}", version.name);
        }
        Ok(())
    }
}

pub struct VersionCreateCommand {
    pub config: JiraCliConfig,
    pub version: String,
    pub project: String,
}

impl VersionCreateCommand {
    pub fn new(config: JiraCliConfig, version: String, project: String) -> Self {
        Self {
            config,
            version,
            project,
        }
    }
}

impl Command for VersionCreateCommand {
    async fn execute(&self) -> Result<()> {
        let client = connect(&self.config)?;
        let (version, created) = client
            .create_version(&self.project, &self.version)
            .await
            .with_context(|| format!("Failed to create version {}", self.version))?;

        if created {
            println!("✅ Created version {} in {}", version.name, self.project);
        } else {
            println!("ℹ️  Version {} already exists in {}", version.name, self.project);
        }
        Ok(())
    }
}

pub struct VersionReleaseCommand {
    pub config: JiraCliConfig,
    pub version: String,
    pub project: String,
}

impl VersionReleaseCommand {
    pub fn new(config: JiraCliConfig, version: String, project: String) -> Self {
        Self {
            config,
            version,
            project,
        }
    }
}

impl Command for VersionReleaseCommand {
    async fn execute(&self) -> Result<()> {
        let client = connect(&self.config)?;
        client
            .release_version(&self.project, &self.version)
            .await
            .with_context(|| format!("Failed to release version {}", self.version))?;
        println!("🚀 Released {} in {}", self.version, self.project);
        Ok(())
    }
}

pub struct VersionTasksCommand {
    pub config: JiraCliConfig,
    pub project: String,
    pub version: String,
    pub issue_types: String,
}

impl VersionTasksCommand {
    pub fn new(config: JiraCliConfig, project: String, version: String, issue_types: String) -> Self {
        Self {
            config,
            project,
            version,
            issue_types,
        }
    }
}

impl Command for VersionTasksCommand {
    async fn execute(&self) -> Result<()> {
        let client = connect(&self.config)?;
        let issues = client
            .search_issues_in_version(&self.project, &self.version, &self.issue_types)
            .await?;

        for issue in &issues.issues {
            let status = issue
                .fields
                .status
                .as_ref()
                .map(|s| s.name.as_str())
                .unwrap_or("-");
            let summary = issue.fields.summary.as_deref().unwrap_or_default();
            println!("{:<12} {:<16} {summary}", issue.key, status);
        }
        println!();
        println!("📋 {} issue(s) in {}", issues.total, self.version);
        Ok(())
    }
}
