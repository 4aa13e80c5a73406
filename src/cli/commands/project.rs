use anyhow::Result;

use super::{connect, Command};
use crate::config::JiraCliConfig;

pub struct ProjectListCommand {
    pub config: JiraCliConfig,
}

impl ProjectListCommand {
    pub fn new(config: JiraCliConfig) -> Self {
        Self { config }
    }
}

impl Command for ProjectListCommand {
    async fn execute(&self) -> Result<()> {
        let client = connect(&self.config)?;
        let projects = client.get_projects().await?;

        if projects.is_empty() {
            println!("📭 No projects visible to this user");
            return Ok(());
        }
        for project in projects {
            println!("{:<12} {}", project.key, project.name);
        }
        Ok(())
    }
}
