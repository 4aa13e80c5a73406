use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

use super::definition::WorkflowDefinition;
use super::driver::{DriveReport, TransitionDriver, TransitionRequest};
use super::errors::WorkflowError;
use crate::tracker::TrackerClient;

/// Success/failure tally for batch operations that do not fail hard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounter {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchCounter {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn merge(&mut self, other: BatchCounter) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[derive(Debug)]
pub struct KeyResult<T, E> {
    pub issue_key: String,
    pub result: Result<T, E>,
}

/// Per-key outcomes of a dispatch, in input order.
#[derive(Debug)]
pub struct DispatchReport<T, E> {
    pub results: Vec<KeyResult<T, E>>,
}

impl<T, E> DispatchReport<T, E> {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &E)> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| (r.issue_key.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.result.is_ok())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Run `op` for every key on its own task and wait for all of them.
///
/// A failing or panicking task only affects its own key.
pub async fn dispatch<T, F, Fut>(keys: &[String], op: F) -> DispatchReport<T, WorkflowError>
where
    T: Send + 'static,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, WorkflowError>> + Send + 'static,
{
    let handles: Vec<_> = keys
        .iter()
        .map(|key| (key.clone(), tokio::spawn(op(key.clone()))))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (issue_key, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                error!(issue = %issue_key, error = %join_error, "task aborted");
                Err(WorkflowError::TaskAborted(issue_key.clone()))
            }
        };
        results.push(KeyResult { issue_key, result });
    }

    DispatchReport { results }
}

/// Drive every key to `target_status` concurrently.
pub async fn dispatch_transitions(
    keys: &[String],
    workflow: Arc<WorkflowDefinition>,
    client: Arc<dyn TrackerClient>,
    target_status: &str,
    exclude_status: Option<&str>,
) -> DispatchReport<DriveReport, WorkflowError> {
    info!(count = keys.len(), target = target_status, "dispatching transitions");
    let target = target_status.to_string();
    let exclude = exclude_status.map(str::to_string);

    dispatch(keys, move |issue_key| {
        let workflow = Arc::clone(&workflow);
        let client = Arc::clone(&client);
        let request =
            TransitionRequest::new(issue_key, target.clone()).with_exclude(exclude.clone());
        async move {
            TransitionDriver::new(&workflow, client.as_ref())
                .drive(&request)
                .await
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::driver::fake::FakeTracker;
    use crate::workflows::driver::DriveOutcome;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_key() {
        let workflow = Arc::new(
            WorkflowDefinition::parse("workflow:\n  to do:\n    default: Start\n").unwrap(),
        );
        let tracker = FakeTracker::new()
            .with_issue("A-1", "To Do")
            .with_issue("A-2", "To Do")
            .with_issue("A-3", "To Do")
            .with_edge("to do", "11", "Start", "In Progress")
            .failing("A-2");
        let client: Arc<dyn TrackerClient> = Arc::new(tracker);

        let report = dispatch_transitions(
            &keys(&["A-1", "A-2", "A-3"]),
            workflow,
            client,
            "In Progress",
            None,
        )
        .await;

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "A-2");
        assert_eq!(failures[0].1.code(), "network_error");

        let order: Vec<_> = report.results.iter().map(|r| r.issue_key.as_str()).collect();
        assert_eq!(order, vec!["A-1", "A-2", "A-3"]);
        let first = report.results[0].result.as_ref().unwrap();
        assert_eq!(first.outcome, DriveOutcome::Reached);
        assert_eq!(first.transitions, vec!["Start"]);
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_error() {
        let report = dispatch(&keys(&["P-1", "P-2"]), |key| async move {
            if key == "P-1" {
                panic!("boom");
            }
            Ok(key.len())
        })
        .await;

        assert_eq!(report.succeeded(), 1);
        assert!(matches!(
            report.results[0].result,
            Err(WorkflowError::TaskAborted(ref key)) if key == "P-1"
        ));
        assert_eq!(*report.results[1].result.as_ref().unwrap(), 3);
    }

    #[test]
    fn test_batch_counter() {
        let mut counter = BatchCounter::default();
        counter.record_success();
        counter.record_failure();
        counter.merge(BatchCounter {
            succeeded: 2,
            failed: 0,
        });
        assert_eq!(counter.succeeded, 3);
        assert_eq!(counter.failed, 1);
        assert_eq!(counter.total(), 4);
    }
}
