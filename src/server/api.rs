//! HTTP API
//!
//! - `GET /` - greeting
//! - `GET /health` - version and uptime
//! - `POST /workflow` - run plan-execute-review for `{"task": ...}`

use crate::agent::{RunState, Workflow, WorkflowConfig, WorkflowError};
use crate::llm::ModelCaller;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Model every workflow runs against
    pub model: Arc<dyn ModelCaller>,
    /// Per-run workflow settings
    pub workflow: WorkflowConfig,
    /// Server start time for uptime calculation
    pub start_time: Instant,
    /// Application version
    pub version: &'static str,
}

impl AppState {
    pub fn new(model: Arc<dyn ModelCaller>, workflow: WorkflowConfig) -> Self {
        Self {
            model,
            workflow,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Body of `POST /workflow`
#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub task: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    /// Timestamp (ISO 8601)
    pub timestamp: String,
}

/// Error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Workflow failure mapped onto an HTTP response
#[derive(Debug)]
pub struct ApiError(pub WorkflowError);

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WorkflowError::PlanParse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::Model(_) | WorkflowError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        error!("Workflow failed ({}): {}", status.as_u16(), self.0);

        let body = Json(ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.0.to_string(),
        });

        (status, body).into_response()
    }
}

/// Fixed greeting
pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "Hello": "World" }))
}

/// Health check handler
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: state.version,
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Run the whole workflow for one task and return the final state
pub async fn run_workflow(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TaskRequest>,
) -> Result<Json<RunState>, ApiError> {
    let workflow = Workflow::new(state.model.clone(), state.workflow);
    let result = workflow.run(&request.task).await?;
    Ok(Json(result))
}

/// Create the API router
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/workflow", post(run_workflow))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::PlanFallback;
    use crate::test_support::ScriptedModel;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(replies: &[&str], plan_fallback: PlanFallback) -> Router {
        let model = Arc::new(ScriptedModel::new(replies.iter().copied()));
        let state = AppState::new(model, WorkflowConfig { plan_fallback });
        api_router(Arc::new(state))
    }

    fn workflow_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/workflow")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_index_greeting() {
        let response = app(&[], PlanFallback::Default)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({ "Hello": "World" }));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(&[], PlanFallback::Default)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn test_workflow_returns_final_state() {
        let replies = ["[\"Draft haiku\", \"Refine wording\"]", "draft", "refined", "Done well."];
        let response = app(&replies, PlanFallback::Default)
            .oneshot(workflow_request(r#"{"task": "Write a haiku"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["task"], "Write a haiku");
        assert_eq!(json["done"], true);
        assert_eq!(json["current_step"], 2);
        assert_eq!(json["plan"].as_array().unwrap().len(), 2);
        assert_eq!(json["results"][1]["step"], "Refine wording");
        assert_eq!(json["results"][1]["result"], "refined");
        assert_eq!(json["messages"].as_array().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_model_failure_is_server_error() {
        let response = app(&[], PlanFallback::Default)
            .oneshot(workflow_request(r#"{"task": "anything"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Internal Server Error");
        assert!(json["message"].as_str().unwrap().contains("no content"));
    }

    #[tokio::test]
    async fn test_strict_plan_failure_is_unprocessable() {
        let response = app(&["no json here"], PlanFallback::Strict)
            .oneshot(workflow_request(r#"{"task": "anything"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        assert_eq!(json["message"], "No JSON array found in planner reply");
    }

    #[tokio::test]
    async fn test_missing_task_rejected() {
        let response = app(&[], PlanFallback::Default)
            .oneshot(workflow_request(r#"{"goal": "wrong field"}"#))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
