use anyhow::Result;
use std::sync::Arc;

use super::{connect, ensure_batch_success, print_batch_summary, Command};
use crate::config::JiraCliConfig;
use crate::workflows::{dispatch, WorkflowError};

pub struct InspectCommand {
    pub config: JiraCliConfig,
    pub keys: Vec<String>,
}

impl InspectCommand {
    pub fn new(config: JiraCliConfig, keys: Vec<String>) -> Self {
        Self { config, keys }
    }
}

impl Command for InspectCommand {
    async fn execute(&self) -> Result<()> {
        let client = connect(&self.config)?;

        let report = dispatch(&self.keys, |key| {
            let client = Arc::clone(&client);
            async move { client.get_issue(&key).await.map_err(WorkflowError::from) }
        })
        .await;

        for result in &report.results {
            if let Ok(issue) = &result.result {
                println!("{}", serde_json::to_string_pretty(issue)?);
            }
        }

        if !report.is_success() {
            print_batch_summary(&report);
        }
        ensure_batch_success(&report)
    }
}
