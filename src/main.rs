use anyhow::Result;
use clap::Parser;
use tracing::Instrument;

use jira_cli::cli::commands::create::CreateIssueCommand;
use jira_cli::cli::commands::fix_version::{DeploymentIssue, FixVersionCommand};
use jira_cli::cli::commands::inspect::InspectCommand;
use jira_cli::cli::commands::login::LoginCommand;
use jira_cli::cli::commands::path::{LayoutSource, WorkflowPathCommand};
use jira_cli::cli::commands::project::ProjectListCommand;
use jira_cli::cli::commands::test_workflow::TestWorkflowCommand;
use jira_cli::cli::commands::transition::TransitionCommand;
use jira_cli::cli::commands::version::{
    VersionCreateCommand, VersionListCommand, VersionReleaseCommand, VersionTasksCommand,
};
use jira_cli::cli::commands::worklog::{
    WorklogAddCommand, WorklogListCommand, WorklogRemoveCommand,
};
use jira_cli::cli::commands::Command;
use jira_cli::cli::{
    Cli, Commands, IssueCommands, ProjectCommands, VersionCommands, WorkflowCommands,
    WorklogCommands,
};
use jira_cli::config::{default_config_path, JiraCliConfig};
use jira_cli::telemetry::{command_span, generate_correlation_id, init_telemetry, level_for_verbosity};

fn main() -> Result<()> {
    let cli = Cli::parse();

    JiraCliConfig::load_env_file()?;
    let config = JiraCliConfig::load(cli.config.as_deref())?;
    init_telemetry(
        &level_for_verbosity(cli.verbose, &config.log_level),
        cli.json_logs,
    )?;

    let correlation_id = generate_correlation_id();
    let span = command_span(command_name(&cli.command), &correlation_id);

    tokio::runtime::Runtime::new()?.block_on(run(cli, config).instrument(span))
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Login { .. } => "login",
        Commands::Issue { command } => match command {
            IssueCommands::Inspect { .. } => "issue inspect",
            IssueCommands::Create { .. } => "issue create",
            IssueCommands::Transition { .. } => "issue transition",
            IssueCommands::TestWorkflow { .. } => "issue test-workflow",
            IssueCommands::Version { .. } => "issue version",
            IssueCommands::Worklog { .. } => "issue worklog",
        },
        Commands::Project { .. } => "project",
        Commands::Version { .. } => "version",
        Commands::Workflow { .. } => "workflow",
    }
}

async fn run(cli: Cli, config: JiraCliConfig) -> Result<()> {
    match cli.command {
        Commands::Login {
            server,
            user,
            password,
        } => {
            let path = match cli.config.or_else(default_config_path) {
                Some(path) => path,
                None => anyhow::bail!("cannot determine home directory, pass --config FILE"),
            };
            LoginCommand::new(config, path)
                .with_credentials(server, user, password)
                .execute()
                .await
        }
        Commands::Issue { command } => match command {
            IssueCommands::Inspect { keys } => InspectCommand::new(config, keys).execute().await,
            IssueCommands::Create {
                project,
                summary,
                description,
                issue_type,
            } => {
                CreateIssueCommand::new(config, project, summary)
                    .with_description(description)
                    .with_issue_type(issue_type)
                    .execute()
                    .await
            }
            IssueCommands::Transition {
                state,
                keys,
                workflow,
                exclude,
            } => {
                TransitionCommand::new(config, state, keys)
                    .with_workflow(workflow)
                    .with_exclude(exclude)
                    .execute()
                    .await
            }
            IssueCommands::TestWorkflow { key, workflow } => {
                TestWorkflowCommand::new(config, key, workflow)
                    .execute()
                    .await
            }
            IssueCommands::Version {
                version,
                keys,
                no_create,
                no_deployment_issue,
                summary,
                description,
                issue_type,
            } => {
                let deployment = (!no_deployment_issue).then(|| DeploymentIssue {
                    summary,
                    description,
                    issue_type,
                });
                FixVersionCommand::new(config, version, keys)
                    .with_create(!no_create, deployment)
                    .execute()
                    .await
            }
            IssueCommands::Worklog { command } => match command {
                WorklogCommands::Add {
                    minutes,
                    keys,
                    comment,
                    date,
                    time,
                } => {
                    WorklogAddCommand::new(config, minutes, keys)
                        .with_comment(comment)
                        .with_start(date, time)
                        .execute()
                        .await
                }
                WorklogCommands::List { key } => WorklogListCommand::new(config, key).execute().await,
                WorklogCommands::Remove { keys } => {
                    WorklogRemoveCommand::new(config, keys).execute().await
                }
            },
        },
        Commands::Project { command } => match command {
            ProjectCommands::Ls => ProjectListCommand::new(config).execute().await,
        },
        Commands::Version { command } => match command {
            VersionCommands::Ls { project } => VersionListCommand::new(config, project).execute().await,
            VersionCommands::Create { version, project } => {
                VersionCreateCommand::new(config, version, project)
                    .execute()
                    .await
            }
            VersionCommands::Release { version, project } => {
                VersionReleaseCommand::new(config, version, project)
                    .execute()
                    .await
            }
            VersionCommands::Tasks {
                project,
                version,
                issue_types,
            } => {
                VersionTasksCommand::new(config, project, version, issue_types)
                    .execute()
                    .await
            }
        },
        Commands::Workflow { command } => match command {
            WorkflowCommands::Path {
                from,
                to,
                layout,
                name,
                project,
            } => {
                let source = match (layout, name) {
                    (Some(file), _) => LayoutSource::File(file),
                    (None, Some(workflow)) => LayoutSource::Tracker { workflow, project },
                    (None, None) => anyhow::bail!("either --layout or --name is required"),
                };
                WorkflowPathCommand::new(config, from, to, source)
                    .execute()
                    .await
            }
        },
    }
}
