//! Executor, Reviewer and Output nodes plus the router between them

use super::state::{ChatMessage, RunState, StepResult};
use super::WorkflowError;
use crate::llm::ModelCaller;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Destination chosen by [`should_continue`] after an executor visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Executor,
    Reviewer,
    Output,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executor => "executor",
            Self::Reviewer => "reviewer",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide where to go after the executor
pub fn should_continue(state: &RunState) -> Route {
    if state.done {
        Route::Output
    } else if state.plan_exhausted() {
        Route::Reviewer
    } else {
        Route::Executor
    }
}

fn executor_prompt(step: &str) -> String {
    format!(
        r#"You are an execution agent. Execute the following step and provide the result.

STEP: {}

Respond with a detailed explanation of how you executed this step and what the outcome was."#,
        step
    )
}

fn review_prompt(results: &[StepResult]) -> Result<String, serde_json::Error> {
    Ok(format!(
        r#"You are a review agent. Review the following execution results and provide a summary.

RESULTS:
{}

Respond with a concise summary of what was accomplished and if the task was completed successfully."#,
        serde_json::to_string_pretty(results)?
    ))
}

/// Executor node: runs the step under the cursor.
///
/// With nothing left to run it marks the run done without calling the model.
pub async fn execute(mut state: RunState, model: &dyn ModelCaller) -> Result<RunState, WorkflowError> {
    let Some(step) = state.pending_step().map(str::to_string) else {
        debug!("No step left at cursor {}, finishing run", state.current_step);
        state.finish();
        return Ok(state);
    };

    let reply = model
        .invoke(&[ChatMessage::user(executor_prompt(&step))])
        .await?;

    info!("Executed step {}/{}: {}", state.current_step + 1, state.plan.len(), step);

    state.log_exchange(
        format!("Executing step {}: {}", state.current_step + 1, step),
        reply.clone(),
    );
    state.results.push(StepResult { step, result: reply });
    state.current_step += 1;
    Ok(state)
}

/// Reviewer node: summarises every result and finishes the run.
///
/// Leaves the state untouched while plan steps are still pending.
pub async fn review(mut state: RunState, model: &dyn ModelCaller) -> Result<RunState, WorkflowError> {
    if !state.plan_exhausted() {
        debug!(
            "Review skipped: {} of {} steps executed",
            state.current_step,
            state.plan.len()
        );
        return Ok(state);
    }

    let prompt = review_prompt(&state.results)?;
    let reply = model.invoke(&[ChatMessage::user(prompt)]).await?;

    info!("Review complete ({} results)", state.results.len());

    state.log_exchange("Review phase", reply);
    state.finish();
    Ok(state)
}

/// Output node: terminal pass-through
pub fn output(state: RunState) -> RunState {
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;

    fn state_with(plan: &[&str], current_step: usize, done: bool) -> RunState {
        let mut state = RunState::new("t");
        state.plan = plan.iter().map(|s| s.to_string()).collect();
        state.current_step = current_step;
        state.done = done;
        state
    }

    #[test]
    fn test_router_decisions() {
        assert_eq!(should_continue(&state_with(&["a", "b", "c"], 2, false)), Route::Executor);
        assert_eq!(should_continue(&state_with(&["a", "b", "c"], 3, false)), Route::Reviewer);
        assert_eq!(should_continue(&state_with(&["a", "b", "c"], 0, true)), Route::Output);
        assert_eq!(should_continue(&state_with(&["a", "b", "c"], 3, true)), Route::Output);
        assert_eq!(should_continue(&state_with(&[], 0, false)), Route::Reviewer);
    }

    #[test]
    fn test_route_names() {
        assert_eq!(Route::Executor.to_string(), "executor");
        assert_eq!(serde_json::to_value(Route::Reviewer).unwrap(), "reviewer");
        assert_eq!(Route::Output.as_str(), "output");
    }

    #[tokio::test]
    async fn test_execute_advances_cursor() {
        let model = ScriptedModel::new(["drafted"]);
        let state = execute(state_with(&["Draft haiku", "Refine wording"], 0, false), &model)
            .await
            .unwrap();

        assert_eq!(state.current_step, 1);
        assert_eq!(
            state.results,
            vec![StepResult {
                step: "Draft haiku".into(),
                result: "drafted".into()
            }]
        );
        assert_eq!(state.messages[0].content, "Executing step 1: Draft haiku");
        assert_eq!(state.messages[1].content, "drafted");
        assert!(!state.done);

        // Prompt carries only the step, not the task
        let prompt = &model.prompts()[0];
        assert!(prompt.contains("STEP: Draft haiku"));
        assert!(!prompt.contains("Refine wording"));
    }

    #[tokio::test]
    async fn test_execute_empty_plan_short_circuits() {
        let model = ScriptedModel::new(Vec::<String>::new());
        let state = execute(state_with(&[], 0, false), &model).await.unwrap();

        assert!(state.done);
        assert!(state.results.is_empty());
        assert!(state.messages.is_empty());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_review_guard_is_noop() {
        let model = ScriptedModel::new(Vec::<String>::new());
        let before = state_with(&["a", "b"], 1, false);
        let after = review(before.clone(), &model).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_review_embeds_results_and_finishes() {
        let model = ScriptedModel::new(["All good."]);
        let mut state = state_with(&["a"], 1, false);
        state.results.push(StepResult {
            step: "a".into(),
            result: "did a".into(),
        });

        let state = review(state, &model).await.unwrap();
        assert!(state.done);
        assert_eq!(state.messages.last().unwrap().content, "All good.");

        let prompt = &model.prompts()[0];
        assert!(prompt.contains("\"step\": \"a\""));
        assert!(prompt.contains("\"result\": \"did a\""));
    }

    #[test]
    fn test_output_is_identity() {
        let state = state_with(&["a"], 1, true);
        assert_eq!(output(state.clone()), state);
    }
}
