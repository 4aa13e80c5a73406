use thiserror::Error;

use crate::tracker::TrackerError;

/// Failures of the transition engine and the workflow graph.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow configuration error: {0}")]
    Config(String),

    #[error("status '{0}' is not configured in the workflow")]
    NotConfigured(String),

    #[error("no transition defined from '{current}' to '{target}' and no default")]
    TransitionUndefined { current: String, target: String },

    #[error("transition '{transition}' is not available for {issue_key}")]
    TransitionUnavailable {
        issue_key: String,
        transition: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("status '{to}' is not reachable from '{from}'")]
    Unreachable { from: String, to: String },

    #[error("{issue_key} did not reach '{target}' within {iterations} iterations")]
    IterationBudgetExceeded {
        issue_key: String,
        target: String,
        iterations: usize,
    },

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("task for {0} aborted")]
    TaskAborted(String),
}

impl WorkflowError {
    /// Stable result code, printed by the CLI and usable by scripts.
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::Config(_) => "config_error",
            WorkflowError::NotConfigured(_) => "not_configured",
            WorkflowError::TransitionUndefined { .. } => "transition_undefined",
            WorkflowError::TransitionUnavailable { .. } => "transition_unavailable",
            WorkflowError::NotFound(_) => "not_found",
            WorkflowError::Unreachable { .. } => "unreachable",
            WorkflowError::IterationBudgetExceeded { .. } => "iteration_budget_exceeded",
            WorkflowError::Tracker(TrackerError::Network(_)) => "network_error",
            WorkflowError::Tracker(TrackerError::NotFound(_)) => "tracker_not_found",
            WorkflowError::Tracker(_) => "tracker_error",
            WorkflowError::TaskAborted(_) => "task_aborted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            WorkflowError::NotConfigured("done".into()).code(),
            "not_configured"
        );
        assert_eq!(
            WorkflowError::from(TrackerError::Network("reset".into())).code(),
            "network_error"
        );
        assert_eq!(WorkflowError::TaskAborted("A-1".into()).code(), "task_aborted");
    }

    #[test]
    fn test_tracker_error_display_is_transparent() {
        let err = WorkflowError::from(TrackerError::NotFound("rest/api/2/issue/X-1".into()));
        assert_eq!(err.to_string(), "resource not found: rest/api/2/issue/X-1");
    }
}
