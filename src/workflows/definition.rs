use serde::Deserialize;
use std::collections::BTreeMap;

use super::errors::WorkflowError;
use crate::tracker::models::normalize_name;

/// Key under a status naming the fallback transition.
pub const DEFAULT_KEY: &str = "default";

#[derive(Debug, Deserialize)]
struct WorkflowFile {
    workflow: BTreeMap<String, BTreeMap<String, String>>,
}

/// Immutable `status -> target status -> transition name` mapping.
///
/// All keys are trimmed and lowercased. A target key of `default` names the
/// transition taken when the requested target has no explicit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinition {
    transitions: BTreeMap<String, BTreeMap<String, String>>,
}

impl WorkflowDefinition {
    /// Parse a YAML (or JSON) workflow document.
    pub fn parse(content: &str) -> Result<Self, WorkflowError> {
        let file: WorkflowFile = serde_yaml::from_str(content)
            .map_err(|e| WorkflowError::Config(format!("invalid workflow definition: {e}")))?;
        Self::from_map(file.workflow)
    }

    /// Build from an already decoded mapping, normalising every key.
    pub fn from_map(
        raw: BTreeMap<String, BTreeMap<String, String>>,
    ) -> Result<Self, WorkflowError> {
        if raw.is_empty() {
            return Err(WorkflowError::Config(
                "workflow definition declares no statuses".to_string(),
            ));
        }

        let mut transitions = BTreeMap::new();
        for (status, targets) in raw {
            let status_key = normalize_name(&status);
            let mut normalized = BTreeMap::new();
            for (target, transition) in targets {
                let target_key = normalize_name(&target);
                if normalized.insert(target_key.clone(), transition).is_some() {
                    return Err(WorkflowError::Config(format!(
                        "duplicate target '{target_key}' under status '{status_key}'"
                    )));
                }
            }
            if transitions.insert(status_key.clone(), normalized).is_some() {
                return Err(WorkflowError::Config(format!(
                    "duplicate status '{status_key}' in workflow definition"
                )));
            }
        }

        Ok(Self { transitions })
    }

    /// Transition name leading from `current` toward `target`.
    ///
    /// Falls back to the `default` entry of `current` when `target` has no
    /// explicit mapping.
    pub fn get_or_default(&self, current: &str, target: &str) -> Result<&str, WorkflowError> {
        let current = normalize_name(current);
        let target = normalize_name(target);

        let targets = self
            .transitions
            .get(&current)
            .ok_or_else(|| WorkflowError::NotConfigured(current.clone()))?;

        targets
            .get(&target)
            .or_else(|| targets.get(DEFAULT_KEY))
            .map(String::as_str)
            .ok_or(WorkflowError::TransitionUndefined { current, target })
    }

    /// Declared statuses in sorted order.
    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.transitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REVIEW_WORKFLOW: &str = r#"
workflow:
  code review:
    default: ready to test
  in test:
    done: done
    default: bug found
  to do:
    rejected: reject
  in progress:
    default: code review
  done:
    default: reopen
  rejected:
    default: reopen
"#;

    #[test]
    fn test_explicit_mapping_wins_over_default() {
        let workflow = WorkflowDefinition::parse(REVIEW_WORKFLOW).unwrap();
        assert_eq!(workflow.get_or_default("in test", "done").unwrap(), "done");
        assert_eq!(workflow.get_or_default("In Test", "to do").unwrap(), "bug found");
    }

    #[test]
    fn test_review_and_test_lookups_from_json_document() {
        let workflow = WorkflowDefinition::parse(
            r#"{"workflow": {"code review": {"default": "ready to test"}, "in test": {"done": "done", "default": "bug found"}}}"#,
        )
        .unwrap();
        assert_eq!(workflow.get_or_default("code review", "anything").unwrap(), "ready to test");
        assert_eq!(workflow.get_or_default("in test", "done").unwrap(), "done");
        assert_eq!(workflow.get_or_default("in test", "rejected").unwrap(), "bug found");
    }

    #[test]
    fn test_default_fallback() {
        let workflow = WorkflowDefinition::parse(REVIEW_WORKFLOW).unwrap();
        assert_eq!(
            workflow.get_or_default("code review", "anything").unwrap(),
            "ready to test"
        );
    }

    #[test]
    fn test_undefined_transition_without_default() {
        let workflow = WorkflowDefinition::parse(REVIEW_WORKFLOW).unwrap();
        let err = workflow.get_or_default("to do", "done").unwrap_err();
        match err {
            WorkflowError::TransitionUndefined { current, target } => {
                assert_eq!(current, "to do");
                assert_eq!(target, "done");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(workflow.get_or_default(" TO DO ", "Rejected").unwrap(), "reject");
    }

    #[test]
    fn test_unknown_current_status_is_not_configured() {
        let workflow = WorkflowDefinition::parse(REVIEW_WORKFLOW).unwrap();
        assert!(matches!(
            workflow.get_or_default("blocked", "done"),
            Err(WorkflowError::NotConfigured(status)) if status == "blocked"
        ));
    }

    #[test]
    fn test_keys_are_normalised() {
        let workflow = WorkflowDefinition::parse(
            "workflow:\n  ' In Progress ':\n    DONE: Finish\n",
        )
        .unwrap();
        assert_eq!(workflow.statuses().collect::<Vec<_>>(), vec!["in progress"]);
        assert_eq!(workflow.get_or_default("in progress", "done").unwrap(), "Finish");
    }

    #[test]
    fn test_statuses_are_sorted() {
        let workflow = WorkflowDefinition::parse(REVIEW_WORKFLOW).unwrap();
        let statuses: Vec<_> = workflow.statuses().collect();
        assert_eq!(
            statuses,
            vec!["code review", "done", "in progress", "in test", "rejected", "to do"]
        );
    }

    #[test]
    fn test_colliding_status_keys_are_rejected() {
        let err = WorkflowDefinition::parse(
            "workflow:\n  Done:\n    default: reopen\n  done:\n    default: reopen\n",
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Config(msg) if msg.contains("duplicate status")));
    }

    #[test]
    fn test_malformed_documents_are_config_errors() {
        assert!(matches!(
            WorkflowDefinition::parse("workflow: {}"),
            Err(WorkflowError::Config(_))
        ));
        assert!(matches!(
            WorkflowDefinition::parse("statuses:\n  - todo\n"),
            Err(WorkflowError::Config(_))
        ));
        assert!(matches!(
            WorkflowDefinition::parse("workflow:\n  todo:\n    done: [a, b]\n"),
            Err(WorkflowError::Config(_))
        ));
    }

    #[test]
    fn test_json_is_accepted() {
        let workflow =
            WorkflowDefinition::parse(r#"{"workflow": {"open": {"default": "Start"}}}"#).unwrap();
        assert_eq!(workflow.len(), 1);
        assert_eq!(workflow.get_or_default("open", "closed").unwrap(), "Start");
    }
}
