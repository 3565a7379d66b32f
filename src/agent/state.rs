//! Run State
//!
//! The single record threaded through every node of one workflow run.
//! Nodes take the state by value and hand back the derived state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role tag for an audit message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Role-tagged text entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Outcome of one executed plan step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Step description as it appeared in the plan
    pub step: String,
    /// Raw model reply for the step
    pub result: String,
}

/// State of a single plan-execute-review run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Audit trail, append-only
    pub messages: Vec<ChatMessage>,
    /// Original request
    pub task: String,
    /// Step descriptions, written once by the planner
    pub plan: Vec<String>,
    /// Cursor into `plan`
    pub current_step: usize,
    /// Executed steps, append-only
    pub results: Vec<StepResult>,
    /// Set once by the reviewer or the executor's early exit
    pub done: bool,
}

impl RunState {
    /// Fresh state for a new run
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            task: task.into(),
            plan: Vec::new(),
            current_step: 0,
            results: Vec::new(),
            done: false,
        }
    }

    /// True once every plan step has been executed
    pub fn plan_exhausted(&self) -> bool {
        self.current_step >= self.plan.len()
    }

    /// Step the executor would run next, if any
    pub fn pending_step(&self) -> Option<&str> {
        self.plan.get(self.current_step).map(String::as_str)
    }

    /// Append a pair of audit messages
    pub(crate) fn log_exchange(&mut self, system: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(ChatMessage::system(system));
        self.messages.push(ChatMessage::assistant(assistant));
    }

    /// Mark the run finished. Never resets.
    pub(crate) fn finish(&mut self) {
        self.done = true;
    }
}
