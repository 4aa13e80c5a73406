use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::workflows::DEFAULT_WORKFLOW_FILE;

pub mod commands;

#[derive(Parser)]
#[command(name = "jira-cli")]
#[command(version)]
#[command(about = "Command line client for Atlassian Jira")]
#[command(long_about = "jira-cli drives Jira issues through their workflow, manages fix versions \
                       and worklogs, and can be used from CI/CD pipelines. Start with 'jira-cli login'.")]
pub struct Cli {
    /// Configuration file to use instead of ~/.jira-cli.toml
    #[arg(long, global = true, value_name = "FILE", help = "Configuration file (default: ~/.jira-cli.toml)")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = ArgAction::Count, help = "Increase log verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true, help = "Write logs to stderr as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify credentials and store them in the configuration file
    Login {
        #[arg(short, long, help = "Jira server url. Also read from JIRA_SERVER_URL")]
        server: Option<String>,
        #[arg(short, long, help = "Jira username. Also read from JIRA_USER")]
        user: Option<String>,
        #[arg(short, long, help = "Jira password. Also read from JIRA_PASSWORD")]
        password: Option<String>,
    },
    /// Manage Jira issues
    #[command(alias = "i")]
    Issue {
        #[command(subcommand)]
        command: IssueCommands,
    },
    /// Manage Jira projects
    #[command(alias = "p")]
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Manage project versions
    #[command(alias = "v")]
    Version {
        #[command(subcommand)]
        command: VersionCommands,
    },
    /// Inspect tracker workflows
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommands,
    },
}

#[derive(Subcommand)]
pub enum IssueCommands {
    /// Fetch data for the given issues
    Inspect {
        #[arg(required = true, value_name = "ISSUE_KEY")]
        keys: Vec<String>,
    },
    /// Create a new issue
    Create {
        #[arg(short, long, help = "Project key")]
        project: String,
        #[arg(short, long, help = "Issue summary")]
        summary: String,
        #[arg(short, long, default_value = "", help = "Issue description")]
        description: String,
        #[arg(short = 't', long = "issue-type", alias = "type", default_value = "Task", help = "Issue type")]
        issue_type: String,
    },
    /// Transition issues to the given state following a workflow definition
    #[command(alias = "t")]
    Transition {
        /// Target state
        state: String,
        #[arg(required = true, value_name = "ISSUE_KEY")]
        keys: Vec<String>,
        #[arg(short, long, default_value = DEFAULT_WORKFLOW_FILE, help = "Workflow definition local file or http URL")]
        workflow: String,
        #[arg(short, long, help = "Leave issues that are currently in this state untouched")]
        exclude: Option<String>,
    },
    /// Run through all transitions to test a workflow definition
    #[command(name = "test-workflow")]
    TestWorkflow {
        key: String,
        #[arg(short, long, default_value = DEFAULT_WORKFLOW_FILE, help = "Workflow definition local file or http URL")]
        workflow: String,
    },
    /// Set the fix version of issues. If the version does not exist it will be created.
    /// An already set fix version is not overwritten
    Version {
        version: String,
        #[arg(required = true, value_name = "ISSUE_KEY")]
        keys: Vec<String>,
        #[arg(long, help = "Fail instead of creating a missing version")]
        no_create: bool,
        #[arg(long, help = "Do not create a deployment issue for a new version")]
        no_deployment_issue: bool,
        #[arg(long, default_value = "Deployment", help = "Summary of the deployment issue")]
        summary: String,
        #[arg(long, default_value = "", help = "Description of the deployment issue")]
        description: String,
        #[arg(long, default_value = "Task", help = "Issue type of the deployment issue")]
        issue_type: String,
    },
    /// Manage worklogs
    #[command(alias = "w")]
    Worklog {
        #[command(subcommand)]
        command: WorklogCommands,
    },
}

#[derive(Subcommand)]
pub enum WorklogCommands {
    /// Log time on issues
    Add {
        minutes: u64,
        #[arg(required = true, value_name = "ISSUE_KEY")]
        keys: Vec<String>,
        #[arg(short, long, default_value = "", help = "Comment for the worklog entry")]
        comment: String,
        #[arg(short, long, help = "Start date, YYYY-MM-DD (default: today)")]
        date: Option<String>,
        #[arg(short, long, help = "Start time, HH:MM (default: 08:00)")]
        time: Option<String>,
    },
    /// List worklogs of an issue
    #[command(alias = "ls")]
    List { key: String },
    /// Delete the configured user's worklogs from issues
    #[command(alias = "rm")]
    Remove {
        #[arg(required = true, value_name = "ISSUE_KEY")]
        keys: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List all projects
    Ls,
}

#[derive(Subcommand)]
pub enum VersionCommands {
    /// List versions of a project
    Ls { project: String },
    /// Create a new version
    Create { version: String, project: String },
    /// Mark a version as released
    Release { version: String, project: String },
    /// List issues in a version, filtered by comma separated issue types
    Tasks {
        project: String,
        version: String,
        issue_types: String,
    },
}

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Shortest transition path between two statuses
    Path {
        from: String,
        to: String,
        #[arg(long, value_name = "FILE", conflicts_with = "name", required_unless_present = "name", help = "Workflow layout JSON file")]
        layout: Option<PathBuf>,
        #[arg(long, help = "Workflow name to fetch from the tracker")]
        name: Option<String>,
        #[arg(long, requires = "name", help = "Project the workflow belongs to")]
        project: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_transition_parses_keys_and_flags() {
        let cli = Cli::try_parse_from([
            "jira-cli", "-vv", "issue", "transition", "Done", "A-1", "A-2", "-w",
            "https://ci/wf.yaml", "--exclude", "Rejected",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Issue {
                command:
                    IssueCommands::Transition {
                        state,
                        keys,
                        workflow,
                        exclude,
                    },
            } => {
                assert_eq!(state, "Done");
                assert_eq!(keys, vec!["A-1", "A-2"]);
                assert_eq!(workflow, "https://ci/wf.yaml");
                assert_eq!(exclude.as_deref(), Some("Rejected"));
            }
            _ => panic!("expected issue transition"),
        }
    }

    #[test]
    fn test_transition_defaults_to_local_workflow_file() {
        let cli = Cli::try_parse_from(["jira-cli", "issue", "t", "Done", "A-1"]).unwrap();
        match cli.command {
            Commands::Issue {
                command: IssueCommands::Transition { workflow, .. },
            } => assert_eq!(workflow, DEFAULT_WORKFLOW_FILE),
            _ => panic!("expected issue transition"),
        }
    }

    #[test]
    fn test_issue_version_creates_missing_versions_by_default() {
        let cli = Cli::try_parse_from(["jira-cli", "issue", "version", "1.2", "ABC-1"]).unwrap();
        match cli.command {
            Commands::Issue {
                command:
                    IssueCommands::Version {
                        no_create,
                        no_deployment_issue,
                        ..
                    },
            } => {
                assert!(!no_create);
                assert!(!no_deployment_issue);
            }
            _ => panic!("expected issue version"),
        }

        let cli = Cli::try_parse_from([
            "jira-cli", "issue", "version", "1.2", "ABC-1", "--no-create", "--no-deployment-issue",
        ])
        .unwrap();
        match cli.command {
            Commands::Issue {
                command:
                    IssueCommands::Version {
                        no_create,
                        no_deployment_issue,
                        ..
                    },
            } => {
                assert!(no_create);
                assert!(no_deployment_issue);
            }
            _ => panic!("expected issue version"),
        }
    }

    #[test]
    fn test_workflow_path_requires_a_layout_source() {
        assert!(Cli::try_parse_from(["jira-cli", "workflow", "path", "Open", "Done"]).is_err());
        assert!(Cli::try_parse_from([
            "jira-cli", "workflow", "path", "Open", "Done", "--layout", "l.json", "--name", "wf"
        ])
        .is_err());
    }
}
