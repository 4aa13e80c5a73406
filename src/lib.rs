// jira-cli library: workflow-driven transitions over the Jira REST API
// Exposes the core components for the binary and integration tests

pub mod cli;
pub mod config;
pub mod telemetry;
pub mod tracker;
pub mod workflows;

// Re-export key types for easy access
pub use config::JiraCliConfig;
pub use telemetry::{command_span, generate_correlation_id, init_telemetry};
pub use tracker::{JiraClient, Status, TrackerClient, TrackerError, Transition};
pub use workflows::{
    dispatch_transitions, test_transitions, transition_issue, DriveOutcome, DriveReport,
    TransitionDriver, WorkflowDefinition, WorkflowError, WorkflowGraph, WorkflowLoader,
};
