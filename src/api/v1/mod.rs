//! v1 API endpoints

pub mod engine;
pub mod executions;
pub mod workflows;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/workflows/deploy", post(workflows::deploy_workflow))
        .route("/workflows/push", post(workflows::push_workflow))
        .route("/workflows/sync", post(workflows::sync_workflow))
        .route("/workflows/{workflow_id}", get(workflows::get_workflow))
        .route("/workflows/{workflow_id}/fix", post(workflows::fix_workflow))
        .route("/executions/failing", get(executions::list_failing_executions))
        .route("/engine/status", get(engine::engine_status))
}
