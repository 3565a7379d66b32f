//! Planner Node
//!
//! Turns the task into at most three step descriptions with one model call.
//! The reply is free text; the plan is the JSON array between its first `[`
//! and last `]`.

use super::state::{ChatMessage, RunState};
use super::WorkflowError;
use crate::llm::ModelCaller;
use std::str::FromStr;
use tracing::{info, warn};

/// Maximum number of steps kept from a parsed plan
pub const MAX_PLAN_STEPS: usize = 3;

/// Plan substituted when the reply cannot be parsed
pub const DEFAULT_PLAN: [&str; 3] = ["Analyze the task", "Execute the task", "Verify results"];

/// Plan extraction errors
#[derive(Debug, thiserror::Error)]
pub enum PlanParseError {
    #[error("No JSON array found in planner reply")]
    NoArray,

    #[error("Planner reply is not a JSON array of strings: {0}")]
    Json(#[from] serde_json::Error),
}

/// What to do when the planner reply cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlanFallback {
    /// Substitute [`DEFAULT_PLAN`] and keep going
    #[default]
    Default,
    /// Fail the run with [`WorkflowError::PlanParse`]
    Strict,
}

impl FromStr for PlanFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" | "fallback" => Ok(Self::Default),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown plan fallback policy: {}", other)),
        }
    }
}

/// The fixed fallback plan as owned strings
pub fn default_plan() -> Vec<String> {
    DEFAULT_PLAN.iter().map(|s| s.to_string()).collect()
}

fn planner_prompt(task: &str) -> String {
    format!(
        r#"You are a planning agent. Given a task, create a step-by-step plan to accomplish it.

TASK: {}

Respond with a JSON array of steps. Each step should be a string describing one action.
Maximum of {} steps."#,
        task, MAX_PLAN_STEPS
    )
}

/// Locate the bracketed array in a free-text reply
fn extract_array(reply: &str) -> Result<&str, PlanParseError> {
    match (reply.find('['), reply.rfind(']')) {
        (Some(start), Some(end)) if end > start => Ok(&reply[start..=end]),
        _ => Err(PlanParseError::NoArray),
    }
}

/// Parse a planner reply into a step list, capped at [`MAX_PLAN_STEPS`]
pub fn parse_plan(reply: &str) -> Result<Vec<String>, PlanParseError> {
    let json = extract_array(reply)?;
    let mut plan: Vec<String> = serde_json::from_str(json.trim())?;
    plan.truncate(MAX_PLAN_STEPS);
    Ok(plan)
}

/// Planner node: fills `plan` and resets the cursor
pub async fn plan(
    mut state: RunState,
    model: &dyn ModelCaller,
    policy: PlanFallback,
) -> Result<RunState, WorkflowError> {
    let prompt = planner_prompt(&state.task);
    let reply = model.invoke(&[ChatMessage::user(prompt)]).await?;

    let plan = match parse_plan(&reply) {
        Ok(plan) => plan,
        Err(e) => match policy {
            PlanFallback::Default => {
                warn!("Planner reply unparseable, using default plan: {}", e);
                default_plan()
            }
            PlanFallback::Strict => return Err(e.into()),
        },
    };

    info!("Plan: {:?}", plan);

    let rendered = serde_json::to_string(&plan)?;
    state.log_exchange("Planning phase completed", format!("Created plan: {}", rendered));
    state.plan = plan;
    state.current_step = 0;
    Ok(state)
}
