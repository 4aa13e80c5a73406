use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::JiraCliConfig;
use crate::tracker::{JiraClient, TrackerError};
use crate::workflows::{DispatchReport, WorkflowError};

pub mod create;
pub mod fix_version;
pub mod inspect;
pub mod login;
pub mod path;
pub mod project;
pub mod test_workflow;
pub mod transition;
pub mod version;
pub mod worklog;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Build a client from the loaded configuration.
pub fn connect(config: &JiraCliConfig) -> Result<Arc<JiraClient>> {
    if !config.has_credentials() {
        tracing::warn!("Jira credentials are incomplete, run: jira-cli login");
    }
    let client = JiraClient::from_config(config).context("Failed to initialize Jira client")?;
    Ok(Arc::new(client))
}

/// Print per-key outcomes and the totals of a batch.
pub fn print_batch_summary<T>(report: &DispatchReport<T, WorkflowError>) {
    for (key, err) in report.failures() {
        println!("❌ {key}: {err} [{}]", err.code());
        if let WorkflowError::Tracker(tracker_err) = err {
            print_hint(tracker_err);
        }
    }
    println!();
    println!("📊 {} succeeded, {} failed", report.succeeded(), report.failed());
}

pub fn print_hint(err: &TrackerError) {
    if let Some(hint) = err.hint() {
        println!("   💡 {hint}");
    }
}

/// Fail the command when any key of the batch failed.
pub fn ensure_batch_success<T>(report: &DispatchReport<T, WorkflowError>) -> Result<()> {
    if !report.is_success() {
        anyhow::bail!("{} of {} issues failed", report.failed(), report.len());
    }
    Ok(())
}
