use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use super::{connect, ensure_batch_success, print_batch_summary, Command};
use crate::config::JiraCliConfig;
use crate::tracker::TrackerClient;
use crate::workflows::{dispatch_transitions, DriveOutcome, WorkflowLoader};

pub struct TransitionCommand {
    pub config: JiraCliConfig,
    pub state: String,
    pub keys: Vec<String>,
    pub workflow: String,
    pub exclude: Option<String>,
}

impl TransitionCommand {
    pub fn new(config: JiraCliConfig, state: String, keys: Vec<String>) -> Self {
        Self {
            config,
            state,
            keys,
            workflow: crate::workflows::DEFAULT_WORKFLOW_FILE.to_string(),
            exclude: None,
        }
    }

    pub fn with_workflow(mut self, workflow: String) -> Self {
        self.workflow = workflow;
        self
    }

    pub fn with_exclude(mut self, exclude: Option<String>) -> Self {
        self.exclude = exclude;
        self
    }
}

impl Command for TransitionCommand {
    async fn execute(&self) -> Result<()> {
        let loader = WorkflowLoader::new()
            .with_inline_content(self.config.workflow_content.clone())
            .with_timeout(Duration::from_secs(self.config.timeout_seconds))?;
        let workflow = Arc::new(loader.load(&self.workflow).await?);
        let client: Arc<dyn TrackerClient> = connect(&self.config)?;

        println!(
            "🔀 Transitioning {} issue(s) to '{}'",
            self.keys.len(),
            self.state
        );

        let report = dispatch_transitions(
            &self.keys,
            workflow,
            client,
            &self.state,
            self.exclude.as_deref(),
        )
        .await;

        for result in &report.results {
            if let Ok(drive) = &result.result {
                match drive.outcome {
                    DriveOutcome::Reached if drive.transitions.is_empty() => {
                        println!("✅ {}: already in '{}'", drive.issue_key, drive.final_status)
                    }
                    DriveOutcome::Reached => println!(
                        "✅ {}: {} -> '{}'",
                        drive.issue_key,
                        drive.transitions.join(" -> "),
                        drive.final_status
                    ),
                    DriveOutcome::Skipped => println!(
                        "⏭️  {}: skipped, issue is in '{}'",
                        drive.issue_key, drive.final_status
                    ),
                }
            }
        }

        print_batch_summary(&report);
        ensure_batch_success(&report)
    }
}
