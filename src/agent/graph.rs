//! Workflow Driver
//!
//! Runs the node graph for one task. The executor loop is an explicit
//! driver loop: each iteration visits one node and picks the next.

use super::nodes::{self, should_continue, Route};
use super::planner::{self, PlanFallback};
use super::state::RunState;
use super::WorkflowError;
use crate::llm::ModelCaller;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, Instrument};

/// Nodes of the workflow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Planner,
    Executor,
    Reviewer,
    Output,
    End,
}

impl From<Route> for Node {
    fn from(route: Route) -> Self {
        match route {
            Route::Executor => Node::Executor,
            Route::Reviewer => Node::Reviewer,
            Route::Output => Node::Output,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Node::Planner => "planner",
            Node::Executor => "executor",
            Node::Reviewer => "reviewer",
            Node::Output => "output",
            Node::End => "end",
        };
        f.write_str(name)
    }
}

/// Workflow configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowConfig {
    /// What the planner does with an unparseable reply
    pub plan_fallback: PlanFallback,
}

/// One plan-execute-review run over a model
pub struct Workflow {
    model: Arc<dyn ModelCaller>,
    config: WorkflowConfig,
}

impl Workflow {
    /// Create a workflow over the given model
    pub fn new(model: Arc<dyn ModelCaller>, config: WorkflowConfig) -> Self {
        Self { model, config }
    }

    /// Visit `node` and return the next node with the derived state
    pub async fn step(&self, node: Node, state: RunState) -> Result<(Node, RunState), WorkflowError> {
        let model = self.model.as_ref();
        match node {
            Node::Planner => {
                let state = planner::plan(state, model, self.config.plan_fallback).await?;
                Ok((Node::Executor, state))
            }
            Node::Executor => {
                let state = nodes::execute(state, model).await?;
                let route = should_continue(&state);
                debug!("Router: step {}/{} -> {}", state.current_step, state.plan.len(), route);
                Ok((route.into(), state))
            }
            Node::Reviewer => Ok((Node::Output, nodes::review(state, model).await?)),
            Node::Output => Ok((Node::End, nodes::output(state))),
            Node::End => Ok((Node::End, state)),
        }
    }

    /// Run a task to completion from a fresh state
    pub async fn run(&self, task: &str) -> Result<RunState, WorkflowError> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("workflow", %run_id, model = self.model.name());

        async move {
            info!("Starting workflow: {}", task);

            let mut node = Node::Planner;
            let mut state = RunState::new(task);

            while node != Node::End {
                debug!("Visiting {}", node);
                let (next, next_state) = self.step(node, state).await?;
                node = next;
                state = next_state;
            }

            info!(
                "Workflow finished: {} steps, {} results, done={}",
                state.plan.len(),
                state.results.len(),
                state.done
            );
            Ok::<_, WorkflowError>(state)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;

    fn workflow(model: &Arc<ScriptedModel>) -> Workflow {
        Workflow::new(model.clone(), WorkflowConfig::default())
    }

    #[tokio::test]
    async fn test_step_transitions() {
        let model = Arc::new(ScriptedModel::new(["[\"only\"]", "ran it", "fine"]));
        let wf = workflow(&model);

        let (next, state) = wf.step(Node::Planner, RunState::new("t")).await.unwrap();
        assert_eq!(next, Node::Executor);

        let (next, state) = wf.step(next, state).await.unwrap();
        assert_eq!(next, Node::Reviewer);

        let (next, state) = wf.step(next, state).await.unwrap();
        assert_eq!(next, Node::Output);
        assert!(state.done);

        let (next, state) = wf.step(next, state).await.unwrap();
        assert_eq!(next, Node::End);
        assert_eq!(model.calls(), 3);
        assert_eq!(state.results.len(), 1);
    }

    #[tokio::test]
    async fn test_executor_loops_until_plan_exhausted() {
        for n in 0..=crate::agent::MAX_PLAN_STEPS {
            let plan: Vec<String> = (0..n).map(|i| format!("step {}", i)).collect();
            let plan_reply = serde_json::to_string(&plan).unwrap();

            let mut replies = vec![plan_reply];
            replies.extend((0..n).map(|i| format!("result {}", i)));
            replies.push("summary".into());

            let model = Arc::new(ScriptedModel::new(replies));
            let state = workflow(&model).run("task").await.unwrap();

            assert!(state.done);
            assert_eq!(state.current_step, n);
            assert_eq!(state.results.len(), n);
            // planner + n executor calls, plus review unless the plan was empty
            let expected = if n == 0 { 1 } else { n + 2 };
            assert_eq!(model.calls(), expected, "plan of {} steps", n);
        }
    }

    #[tokio::test]
    async fn test_model_failure_aborts_run() {
        let model = Arc::new(ScriptedModel::new(["[\"a\", \"b\"]", "ok"]));
        // Third call has no scripted reply and fails
        let err = workflow(&model).run("task").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Model(_)));
        assert_eq!(model.calls(), 3);
    }
}
