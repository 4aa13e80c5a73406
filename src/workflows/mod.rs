// Workflow-driven transition engine and status graph

pub mod definition;
pub mod dispatcher;
pub mod driver;
pub mod errors;
pub mod graph;
pub mod loader;

pub use definition::WorkflowDefinition;
pub use dispatcher::{dispatch, dispatch_transitions, BatchCounter, DispatchReport, KeyResult};
pub use driver::{
    test_transitions, transition_issue, DriveOutcome, DriveReport, SweepReport, TransitionDriver,
    TransitionRequest, MAX_ITERATIONS,
};
pub use errors::WorkflowError;
pub use graph::{PathStep, WorkflowGraph};
pub use loader::{WorkflowLoader, WorkflowSource, DEFAULT_WORKFLOW_FILE};
