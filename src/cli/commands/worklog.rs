use anyhow::Result;
use std::sync::Arc;

use super::{connect, ensure_batch_success, print_batch_summary, Command};
use crate::config::JiraCliConfig;
use crate::tracker::NewWorklog;
use crate::workflows::{dispatch, BatchCounter, WorkflowError};

pub struct WorklogAddCommand {
    pub config: JiraCliConfig,
    pub minutes: u64,
    pub keys: Vec<String>,
    pub comment: String,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl WorklogAddCommand {
    pub fn new(config: JiraCliConfig, minutes: u64, keys: Vec<String>) -> Self {
        Self {
            config,
            minutes,
            keys,
            comment: String::new(),
            date: None,
            time: None,
        }
    }

    pub fn with_comment(mut self, comment: String) -> Self {
        self.comment = comment;
        self
    }

    pub fn with_start(mut self, date: Option<String>, time: Option<String>) -> Self {
        self.date = date;
        self.time = time;
        self
    }
}

impl Command for WorklogAddCommand {
    async fn execute(&self) -> Result<()> {
        let worklog = Arc::new(NewWorklog::new(
            &self.comment,
            self.minutes,
            self.date.as_deref(),
            self.time.as_deref(),
        )?);
        let client = connect(&self.config)?;

        let report = dispatch(&self.keys, |key| {
            let client = Arc::clone(&client);
            let worklog = Arc::clone(&worklog);
            async move {
                client
                    .add_worklog(&key, &worklog)
                    .await
                    .map_err(WorkflowError::from)
            }
        })
        .await;

        for result in &report.results {
            if result.result.is_ok() {
                println!(
                    "⏱️  {}: logged {} min starting {}",
                    result.issue_key, self.minutes, worklog.started
                );
            }
        }

        print_batch_summary(&report);
        ensure_batch_success(&report)
    }
}

pub struct WorklogListCommand {
    pub config: JiraCliConfig,
    pub key: String,
}

impl WorklogListCommand {
    pub fn new(config: JiraCliConfig, key: String) -> Self {
        Self { config, key }
    }
}

impl Command for WorklogListCommand {
    async fn execute(&self) -> Result<()> {
        let client = connect(&self.config)?;
        let worklogs = client.list_worklogs(&self.key).await?;

        for worklog in &worklogs.worklogs {
            println!(
                "{:<10} {:<20} {:>6} min",
                worklog.id,
                worklog.author.name,
                worklog.time_spent / 60
            );
        }
        println!();
        println!("📋 {} worklog(s) on {}", worklogs.total, self.key);
        Ok(())
    }
}

pub struct WorklogRemoveCommand {
    pub config: JiraCliConfig,
    pub keys: Vec<String>,
}

impl WorklogRemoveCommand {
    pub fn new(config: JiraCliConfig, keys: Vec<String>) -> Self {
        Self { config, keys }
    }
}

impl Command for WorklogRemoveCommand {
    async fn execute(&self) -> Result<()> {
        let client = connect(&self.config)?;
        let user = client.user().to_string();
        println!("🗑️  Removing worklogs of {user} from {} issue(s)", self.keys.len());

        let report = dispatch(&self.keys, |key| {
            let client = Arc::clone(&client);
            let user = user.clone();
            async move {
                client
                    .delete_worklogs_for_user(&user, &key)
                    .await
                    .map_err(WorkflowError::from)
            }
        })
        .await;

        let mut totals = BatchCounter::default();
        for result in &report.results {
            if let Ok(counter) = &result.result {
                println!(
                    "   {}: {} deleted, {} failed",
                    result.issue_key, counter.succeeded, counter.failed
                );
                totals.merge(*counter);
            }
        }

        print_batch_summary(&report);
        println!(
            "🧾 Worklogs: {} deleted, {} failed",
            totals.succeeded, totals.failed
        );

        ensure_batch_success(&report)?;
        if totals.failed > 0 {
            anyhow::bail!("{} worklog(s) could not be deleted", totals.failed);
        }
        Ok(())
    }
}
