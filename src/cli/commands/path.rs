use anyhow::{Context, Result};
use std::path::PathBuf;

use super::{connect, Command};
use crate::config::JiraCliConfig;
use crate::tracker::WorkflowLayout;
use crate::workflows::{PathStep, WorkflowGraph};

/// Where the workflow layout is read from.
pub enum LayoutSource {
    File(PathBuf),
    Tracker {
        workflow: String,
        project: Option<String>,
    },
}

pub struct WorkflowPathCommand {
    pub config: JiraCliConfig,
    pub from: String,
    pub to: String,
    pub source: LayoutSource,
}

impl WorkflowPathCommand {
    pub fn new(config: JiraCliConfig, from: String, to: String, source: LayoutSource) -> Self {
        Self {
            config,
            from,
            to,
            source,
        }
    }

    async fn layout(&self) -> Result<WorkflowLayout> {
        match &self.source {
            LayoutSource::File(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read layout file {}", path.display()))?;
                WorkflowLayout::from_json(&content)
                    .with_context(|| format!("Invalid workflow layout in {}", path.display()))
            }
            LayoutSource::Tracker { workflow, project } => {
                let client = connect(&self.config)?;
                Ok(client
                    .get_workflow_layout(workflow, project.as_deref())
                    .await?)
            }
        }
    }
}

/// One line per hop: `Status --[Transition]-->`, final status last.
pub fn format_path(path: &[PathStep]) -> Vec<String> {
    path.iter()
        .map(|step| match &step.transition {
            Some(transition) => format!("{} --[{}]-->", step.status.name, transition.name),
            None => step.status.name.clone(),
        })
        .collect()
}

impl Command for WorkflowPathCommand {
    async fn execute(&self) -> Result<()> {
        let layout = self.layout().await?;
        let graph = WorkflowGraph::from_layout(&layout)?;
        let path = graph.find_path_by_name(&self.from, &self.to)?;

        println!(
            "🧭 {} transition(s) from '{}' to '{}':",
            path.len().saturating_sub(1),
            self.from,
            self.to
        );
        for line in format_path(&path) {
            println!("   {line}");
        }
        Ok(())
    }
}
