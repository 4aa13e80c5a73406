use anyhow::{Context, Result};
use std::time::Duration;

use super::{connect, Command};
use crate::config::JiraCliConfig;
use crate::workflows::{test_transitions, WorkflowLoader};

pub struct TestWorkflowCommand {
    pub config: JiraCliConfig,
    pub key: String,
    pub workflow: String,
}

impl TestWorkflowCommand {
    pub fn new(config: JiraCliConfig, key: String, workflow: String) -> Self {
        Self {
            config,
            key,
            workflow,
        }
    }
}

impl Command for TestWorkflowCommand {
    async fn execute(&self) -> Result<()> {
        let loader = WorkflowLoader::new()
            .with_inline_content(self.config.workflow_content.clone())
            .with_timeout(Duration::from_secs(self.config.timeout_seconds))?;
        let client = connect(&self.config)?;

        println!("🧪 Testing workflow '{}' on {}", self.workflow, self.key);

        let sweep = test_transitions(&loader, client.as_ref(), &self.workflow, &self.key)
            .await
            .with_context(|| format!("Workflow test failed on {}", self.key))?;

        println!(
            "✅ Workflow OK: {} drives, {} transitions executed",
            sweep.drives, sweep.transitions
        );
        Ok(())
    }
}
