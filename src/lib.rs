//! Plan-Review Agent
//!
//! Minimal plan-execute-review agent loop behind a single HTTP endpoint.
//!
//! # Architecture
//!
//! ```text
//! POST /workflow ──► Workflow ──► planner ──► executor ⟲ ──► reviewer ──► output
//!                                    │            │              │
//!                                    └────────────┴──────────────┴──► ModelCaller (Azure OpenAI)
//! ```
//!
//! Each request builds its own [`RunState`] and [`Workflow`]; nothing is
//! shared between requests except the model client.

pub mod agent;
pub mod config;
pub mod llm;
pub mod server;
pub mod test_support;

pub use agent::{
    should_continue, ChatMessage, Node, PlanFallback, PlanParseError, Role, Route, RunState,
    StepResult, Workflow, WorkflowConfig, WorkflowError,
};
pub use config::Config;
pub use llm::{AzureChatClient, ModelCaller, ModelError};
pub use server::Server;
