use anyhow::{Context, Result};

use super::{connect, Command};
use crate::config::JiraCliConfig;

pub struct CreateIssueCommand {
    pub config: JiraCliConfig,
    pub project: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
}

impl CreateIssueCommand {
    pub fn new(config: JiraCliConfig, project: String, summary: String) -> Self {
        Self {
            config,
            project,
            summary,
            description: String::new(),
            issue_type: "Task".to_string(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    pub fn with_issue_type(mut self, issue_type: String) -> Self {
        self.issue_type = issue_type;
        self
    }
}

impl Command for CreateIssueCommand {
    async fn execute(&self) -> Result<()> {
        let client = connect(&self.config)?;
        let issue = client
            .create_issue(&self.project, &self.summary, &self.description, &self.issue_type)
            .await
            .with_context(|| format!("Failed to create issue in {}", self.project))?;
        println!("✅ Created {}", issue.key);
        Ok(())
    }
}
