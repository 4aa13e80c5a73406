pub mod client;
pub mod errors;
pub mod models;
pub mod worklog;

pub use client::{project_key, JiraClient, TrackerClient};
#[cfg(any(test, feature = "testing"))]
pub use client::MockTrackerClient;
pub use errors::TrackerError;
pub use models::{Issue, Project, Status, Transition, Version, WorkflowLayout, Worklog};
pub use worklog::NewWorklog;
