//! Plan-Execute-Review Agent
//!
//! Four nodes threaded by a single [`RunState`]:
//!
//! ```text
//! planner ──► executor ──► should_continue ──┬──► executor (next step)
//!                                            ├──► reviewer ──► output
//!                                            └──► output
//! ```
//!
//! Every node makes at most one model call, strictly in sequence.

pub mod graph;
pub mod nodes;
pub mod planner;
pub mod state;

pub use graph::{Node, Workflow, WorkflowConfig};
pub use nodes::{should_continue, Route};
pub use planner::{default_plan, PlanFallback, PlanParseError, DEFAULT_PLAN, MAX_PLAN_STEPS};
pub use state::{ChatMessage, Role, RunState, StepResult};

use crate::llm::ModelError;

/// Errors that abort a workflow run
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    PlanParse(#[from] PlanParseError),

    #[error("Failed to serialize step results: {0}")]
    Serialize(#[from] serde_json::Error),
}
