use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::definition::WorkflowDefinition;
use super::errors::WorkflowError;
use super::loader::WorkflowLoader;
use crate::tracker::models::{normalize_name, Status, Transition};
use crate::tracker::TrackerClient;

/// Transitions a single drive may execute before giving up.
pub const MAX_ITERATIONS: usize = 20;

/// Where a single drive currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DriveState {
    Fetching,
    Resolving { current: Status },
    Executing { current: Status, transition: String },
}

/// Move one issue to `target_status`, unless it starts in `exclude_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub issue_key: String,
    pub target_status: String,
    pub exclude_status: Option<String>,
}

impl TransitionRequest {
    pub fn new(issue_key: impl Into<String>, target_status: impl Into<String>) -> Self {
        Self {
            issue_key: issue_key.into(),
            target_status: target_status.into(),
            exclude_status: None,
        }
    }

    pub fn with_exclude(mut self, exclude_status: Option<String>) -> Self {
        self.exclude_status = exclude_status.filter(|s| !s.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveOutcome {
    /// The issue is in the target status.
    Reached,
    /// The issue started in the excluded status and was left alone.
    Skipped,
}

/// Result of a successful drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveReport {
    pub issue_key: String,
    pub outcome: DriveOutcome,
    pub final_status: String,
    /// Names of the executed transitions, in order.
    pub transitions: Vec<String>,
    /// Status fetches performed, including the final one.
    pub iterations: usize,
}

/// Result of a workflow validation sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub drives: usize,
    pub transitions: usize,
}

/// Drives one issue toward a target status using a workflow definition.
pub struct TransitionDriver<'a> {
    workflow: &'a WorkflowDefinition,
    client: &'a dyn TrackerClient,
    max_iterations: usize,
}

impl<'a> TransitionDriver<'a> {
    pub fn new(workflow: &'a WorkflowDefinition, client: &'a dyn TrackerClient) -> Self {
        Self {
            workflow,
            client,
            max_iterations: MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[instrument(
        name = "drive",
        skip(self, request),
        fields(issue = %request.issue_key, target = %request.target_status)
    )]
    pub async fn drive(&self, request: &TransitionRequest) -> Result<DriveReport, WorkflowError> {
        let issue_key = request.issue_key.as_str();
        let target = normalize_name(&request.target_status);
        let mut executed: Vec<String> = Vec::new();
        let mut fetches = 0;
        let mut state = DriveState::Fetching;

        loop {
            state = match state {
                DriveState::Fetching => {
                    let current = self.client.get_issue_status(issue_key).await?;
                    let first = fetches == 0;
                    fetches += 1;
                    info!(
                        issue = issue_key,
                        current = %current.name,
                        target = %target,
                        iteration = executed.len() + 1,
                        "fetched issue status"
                    );

                    if first {
                        if let Some(exclude) = &request.exclude_status {
                            if current.is_named(exclude) {
                                info!(issue = issue_key, exclude = %exclude, "issue is in excluded status, skipping");
                                return Ok(self.report(issue_key, DriveOutcome::Skipped, current, executed, fetches));
                            }
                        }
                    }

                    if current.is_named(&target) {
                        info!(issue = issue_key, status = %current.name, "target status reached");
                        return Ok(self.report(issue_key, DriveOutcome::Reached, current, executed, fetches));
                    }

                    // The fetch after the last allowed execute only verifies.
                    if executed.len() >= self.max_iterations {
                        warn!(issue = issue_key, iterations = executed.len(), "iteration budget exhausted");
                        return Err(WorkflowError::IterationBudgetExceeded {
                            issue_key: issue_key.to_string(),
                            target: request.target_status.clone(),
                            iterations: executed.len(),
                        });
                    }

                    DriveState::Resolving { current }
                }
                DriveState::Resolving { current } => {
                    let transition = self.workflow.get_or_default(&current.name, &target)?;
                    debug!(issue = issue_key, current = %current.name, transition, "resolved transition");
                    DriveState::Executing {
                        current,
                        transition: transition.to_string(),
                    }
                }
                DriveState::Executing { current, transition } => {
                    let available = self.client.get_available_transitions(issue_key).await?;
                    let chosen = find_by_name(&available, &transition).ok_or_else(|| {
                        WorkflowError::TransitionUnavailable {
                            issue_key: issue_key.to_string(),
                            transition: transition.clone(),
                        }
                    })?;

                    info!(
                        issue = issue_key,
                        current = %current.name,
                        transition = %chosen.name,
                        "executing transition"
                    );
                    self.client.execute_transition(issue_key, &chosen.id).await?;
                    executed.push(chosen.name.clone());
                    DriveState::Fetching
                }
            };
        }
    }

    fn report(
        &self,
        issue_key: &str,
        outcome: DriveOutcome,
        current: Status,
        transitions: Vec<String>,
        iterations: usize,
    ) -> DriveReport {
        DriveReport {
            issue_key: issue_key.to_string(),
            outcome,
            final_status: current.name,
            transitions,
            iterations,
        }
    }
}

fn find_by_name<'t>(available: &'t [Transition], name: &str) -> Option<&'t Transition> {
    let wanted = normalize_name(name);
    available.iter().find(|t| normalize_name(&t.name) == wanted)
}

/// Load the workflow from `workflow_source` and drive one issue to `target_status`.
pub async fn transition_issue(
    loader: &WorkflowLoader,
    client: &dyn TrackerClient,
    workflow_source: &str,
    issue_key: &str,
    target_status: &str,
    exclude_status: Option<&str>,
) -> Result<DriveReport, WorkflowError> {
    let workflow = loader.load(workflow_source).await?;
    let request = TransitionRequest::new(issue_key, target_status)
        .with_exclude(exclude_status.map(str::to_string));
    TransitionDriver::new(&workflow, client).drive(&request).await
}

/// Drive an issue through every pair of declared statuses.
///
/// For each status the issue is first moved there, then moved to every
/// declared status in turn. Stops at the first error.
pub async fn test_transitions(
    loader: &WorkflowLoader,
    client: &dyn TrackerClient,
    workflow_source: &str,
    issue_key: &str,
) -> Result<SweepReport, WorkflowError> {
    let workflow = loader.load(workflow_source).await?;
    sweep(&workflow, client, issue_key).await
}

pub async fn sweep(
    workflow: &WorkflowDefinition,
    client: &dyn TrackerClient,
    issue_key: &str,
) -> Result<SweepReport, WorkflowError> {
    let driver = TransitionDriver::new(workflow, client);
    let mut report = SweepReport::default();

    for from in workflow.statuses() {
        info!(issue = issue_key, from, "testing transitions from status");
        let reached = driver.drive(&TransitionRequest::new(issue_key, from)).await?;
        report.drives += 1;
        report.transitions += reached.transitions.len();

        for to in workflow.statuses() {
            debug!(issue = issue_key, from, to, "testing transition");
            let reached = driver.drive(&TransitionRequest::new(issue_key, to)).await?;
            report.drives += 1;
            report.transitions += reached.transitions.len();
        }
    }

    Ok(report)
}


#[cfg(test)]
mod tests {
    use super::fake::FakeTracker;
    use super::*;
    use crate::tracker::{MockTrackerClient, TrackerError};

    fn two_hop_workflow() -> WorkflowDefinition {
        WorkflowDefinition::parse(
            r#"
workflow:
  to do:
    default: Start
  in progress:
    default: Finish
  done:
    default: Reopen
"#,
        )
        .unwrap()
    }

    fn two_hop_tracker() -> FakeTracker {
        FakeTracker::new()
            .with_issue("TEST-1", "To Do")
            .with_edge("to do", "11", "Start", "In Progress")
            .with_edge("in progress", "21", "Finish", "Done")
            .with_edge("done", "31", "Reopen", "To Do")
    }

    #[tokio::test]
    async fn test_two_hop_drive_reaches_done() {
        let workflow = two_hop_workflow();
        let tracker = two_hop_tracker();

        let report = TransitionDriver::new(&workflow, &tracker)
            .drive(&TransitionRequest::new("TEST-1", "Done"))
            .await
            .unwrap();

        assert_eq!(report.outcome, DriveOutcome::Reached);
        assert_eq!(report.transitions, vec!["Start", "Finish"]);
        assert_eq!(report.iterations, 3);
        assert_eq!(report.final_status, "Done");
        assert_eq!(tracker.executed.lock().unwrap().len(), 2);
        assert_eq!(tracker.status_of("TEST-1"), "Done");
    }

    #[tokio::test]
    async fn test_already_in_target_executes_nothing() {
        let workflow = two_hop_workflow();
        let tracker = two_hop_tracker();

        let report = TransitionDriver::new(&workflow, &tracker)
            .drive(&TransitionRequest::new("TEST-1", " TO DO "))
            .await
            .unwrap();

        assert_eq!(report.outcome, DriveOutcome::Reached);
        assert!(report.transitions.is_empty());
        assert_eq!(report.iterations, 1);
    }

    #[tokio::test]
    async fn test_exclude_matching_initial_status_skips() {
        let workflow = two_hop_workflow();
        let tracker = two_hop_tracker();

        let request =
            TransitionRequest::new("TEST-1", "Done").with_exclude(Some("to do".to_string()));
        let report = TransitionDriver::new(&workflow, &tracker)
            .drive(&request)
            .await
            .unwrap();

        assert_eq!(report.outcome, DriveOutcome::Skipped);
        assert!(tracker.executed.lock().unwrap().is_empty());
        assert_eq!(tracker.status_of("TEST-1"), "To Do");
    }

    #[tokio::test]
    async fn test_exclude_only_applies_to_initial_status() {
        let workflow = two_hop_workflow();
        let tracker = two_hop_tracker();

        let request = TransitionRequest::new("TEST-1", "Done")
            .with_exclude(Some("In Progress".to_string()));
        let report = TransitionDriver::new(&workflow, &tracker)
            .drive(&request)
            .await
            .unwrap();

        assert_eq!(report.outcome, DriveOutcome::Reached);
        assert_eq!(report.transitions.len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_transition_fails() {
        let workflow = two_hop_workflow();
        let tracker = FakeTracker::new()
            .with_issue("TEST-2", "To Do")
            .with_edge("to do", "11", "Begin", "In Progress");

        let err = TransitionDriver::new(&workflow, &tracker)
            .drive(&TransitionRequest::new("TEST-2", "Done"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::TransitionUnavailable { ref transition, .. } if transition == "Start"
        ));
    }

    #[tokio::test]
    async fn test_status_missing_from_workflow_is_not_configured() {
        let workflow = two_hop_workflow();
        let tracker = FakeTracker::new().with_issue("TEST-3", "Blocked");

        let err = TransitionDriver::new(&workflow, &tracker)
            .drive(&TransitionRequest::new("TEST-3", "Done"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "not_configured");
    }

    #[tokio::test]
    async fn test_cycle_exhausts_iteration_budget() {
        let workflow = WorkflowDefinition::parse(
            "workflow:\n  open:\n    default: Hold\n  on hold:\n    default: Resume\n",
        )
        .unwrap();
        let tracker = FakeTracker::new()
            .with_issue("TEST-4", "Open")
            .with_edge("open", "1", "Hold", "On Hold")
            .with_edge("on hold", "2", "Resume", "Open");

        let err = TransitionDriver::new(&workflow, &tracker)
            .drive(&TransitionRequest::new("TEST-4", "Closed"))
            .await
            .unwrap_err();

        match err {
            WorkflowError::IterationBudgetExceeded { iterations, .. } => {
                assert_eq!(iterations, MAX_ITERATIONS)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(tracker.executed.lock().unwrap().len(), MAX_ITERATIONS);
    }

    #[tokio::test]
    async fn test_custom_iteration_budget() {
        let workflow = two_hop_workflow();
        let tracker = two_hop_tracker();

        let err = TransitionDriver::new(&workflow, &tracker)
            .with_max_iterations(1)
            .drive(&TransitionRequest::new("TEST-1", "Done"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "iteration_budget_exceeded");
        assert_eq!(tracker.status_of("TEST-1"), "In Progress");
        assert_eq!(tracker.executed.lock().unwrap().len(), 1);
    }

    /// Linear chain s0 -> s1 -> ... -> s{hops}, one "go{i}" transition per step.
    fn chain(hops: usize) -> (WorkflowDefinition, FakeTracker) {
        let mut yaml = String::from("workflow:\n");
        let mut tracker = FakeTracker::new().with_issue("CHAIN-1", "s0");
        for i in 0..hops {
            yaml.push_str(&format!("  s{i}:\n    default: go{i}\n"));
            tracker = tracker.with_edge(
                &format!("s{i}"),
                &i.to_string(),
                &format!("go{i}"),
                &format!("s{}", i + 1),
            );
        }
        (WorkflowDefinition::parse(&yaml).unwrap(), tracker)
    }

    #[tokio::test]
    async fn test_route_one_short_of_budget_is_reached() {
        let (workflow, tracker) = chain(MAX_ITERATIONS - 1);

        let report = TransitionDriver::new(&workflow, &tracker)
            .drive(&TransitionRequest::new("CHAIN-1", format!("s{}", MAX_ITERATIONS - 1)))
            .await
            .unwrap();

        assert_eq!(report.outcome, DriveOutcome::Reached);
        assert_eq!(report.transitions.len(), MAX_ITERATIONS - 1);
    }

    #[tokio::test]
    async fn test_route_exactly_at_budget_is_reached() {
        let (workflow, tracker) = chain(MAX_ITERATIONS);

        let report = TransitionDriver::new(&workflow, &tracker)
            .drive(&TransitionRequest::new("CHAIN-1", format!("s{MAX_ITERATIONS}")))
            .await
            .unwrap();

        assert_eq!(report.outcome, DriveOutcome::Reached);
        assert_eq!(report.transitions.len(), MAX_ITERATIONS);
        assert_eq!(report.iterations, MAX_ITERATIONS + 1);
        assert_eq!(tracker.status_of("CHAIN-1"), format!("s{MAX_ITERATIONS}"));
    }

    #[tokio::test]
    async fn test_route_past_budget_stops_after_budget_executes() {
        let (workflow, tracker) = chain(MAX_ITERATIONS + 1);

        let err = TransitionDriver::new(&workflow, &tracker)
            .drive(&TransitionRequest::new("CHAIN-1", format!("s{}", MAX_ITERATIONS + 1)))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "iteration_budget_exceeded");
        assert_eq!(tracker.executed.lock().unwrap().len(), MAX_ITERATIONS);
        assert_eq!(tracker.status_of("CHAIN-1"), format!("s{MAX_ITERATIONS}"));
    }

    #[tokio::test]
    async fn test_network_error_on_execute_propagates() {
        let workflow = two_hop_workflow();
        let mut mock = MockTrackerClient::new();
        mock.expect_get_issue_status()
            .returning(|_| Ok(Status::new("1", "To Do")));
        mock.expect_get_available_transitions()
            .returning(|_| Ok(vec![Transition::named("11", "start")]));
        mock.expect_execute_transition()
            .withf(|key, id| key == "TEST-5" && id == "11")
            .times(1)
            .returning(|_, _| Err(TrackerError::Network("timed out".into())));

        let err = TransitionDriver::new(&workflow, &mock)
            .drive(&TransitionRequest::new("TEST-5", "Done"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "network_error");
    }

    #[tokio::test]
    async fn test_sweep_visits_every_pair() {
        let workflow = two_hop_workflow();
        let tracker = two_hop_tracker();

        let report = sweep(&workflow, &tracker, "TEST-1").await.unwrap();

        assert_eq!(report.drives, 3 + 3 * 3);
        assert!(report.transitions > 0);
    }

    #[tokio::test]
    async fn test_sweep_stops_at_first_error() {
        let workflow = two_hop_workflow();
        let tracker = FakeTracker::new()
            .with_issue("TEST-6", "To Do")
            .with_edge("to do", "11", "Start", "In Progress");

        let err = sweep(&workflow, &tracker, "TEST-6").await.unwrap_err();
        assert_eq!(err.code(), "transition_unavailable");
    }
}
