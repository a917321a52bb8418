//! Workflow deploy / push / sync / fix endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::middleware::UserIdentity;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{ExecutionRecord, RemoteWorkflowId, WorkflowId, WorkflowRecord};

/// Request to deploy a new workflow.
///
/// Either a ready-made definition or a natural-language prompt for the
/// proposal service; the definition wins when both are present.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployWorkflowRequest {
    pub name: String,
    #[serde(default)]
    pub definition: Option<serde_json::Value>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Request to push a local definition over an existing remote workflow
#[derive(Debug, Clone, Deserialize)]
pub struct PushWorkflowRequest {
    pub remote_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub definition: Option<serde_json::Value>,
}

/// Request to resynchronize local state from the remote engine
#[derive(Debug, Clone, Deserialize)]
pub struct SyncWorkflowRequest {
    pub remote_id: String,
}

/// Request to run one remediation pass
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixWorkflowRequest {
    /// Pin a specific failing execution; the most recent one is fetched
    /// when absent
    #[serde(default)]
    pub execution: Option<ExecutionRecord>,
}

/// A workflow record as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResponse {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub definition: serde_json::Value,
}

impl From<WorkflowRecord> for WorkflowResponse {
    fn from(record: WorkflowRecord) -> Self {
        Self {
            id: record.id().to_string(),
            name: record.name().to_string(),
            status: record.status().to_string(),
            remote_id: record.remote_id().map(|r| r.to_string()),
            deployed_at: record.deployed_at(),
            last_sync_at: record.last_sync_at(),
            updated_at: record.updated_at(),
            definition: record.definition().clone(),
        }
    }
}

/// POST /v1/workflows/deploy
pub async fn deploy_workflow(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Json(request): Json<DeployWorkflowRequest>,
) -> Result<Response, ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("Workflow name is required"));
    }

    let definition = match (request.definition, request.prompt) {
        (Some(definition), _) => definition,
        (None, Some(prompt)) => {
            let proposer = state.definition_proposer.as_ref().ok_or_else(|| {
                ApiError::bad_request(
                    "No definition provided and no proposal service is configured",
                )
            })?;
            debug!(user_id = %user_id, "Proposing definition from prompt");
            proposer.propose(&prompt).await.map_err(ApiError::from)?
        }
        (None, None) => {
            return Err(ApiError::bad_request(
                "Either a definition or a prompt is required",
            ));
        }
    };

    let record = state
        .sync_service
        .deploy_new(request.name.trim(), definition, &user_id)
        .await
        .map_err(ApiError::from)?;

    info!(
        workflow_id = %record.id(),
        user_id = %user_id,
        "Workflow deployed"
    );

    Ok((StatusCode::CREATED, Json(WorkflowResponse::from(record))).into_response())
}

/// POST /v1/workflows/push
pub async fn push_workflow(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Json(request): Json<PushWorkflowRequest>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let record = lookup_by_remote_id(&state, &request.remote_id).await?;

    let updated = state
        .sync_service
        .push(record.id(), request.definition, request.name, &user_id)
        .await
        .map_err(ApiError::from)?;

    info!(workflow_id = %updated.id(), user_id = %user_id, "Workflow pushed");

    Ok(Json(WorkflowResponse::from(updated)))
}

/// POST /v1/workflows/sync
pub async fn sync_workflow(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Json(request): Json<SyncWorkflowRequest>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let record = lookup_by_remote_id(&state, &request.remote_id).await?;

    let updated = state
        .sync_service
        .pull(record.id(), &user_id)
        .await
        .map_err(ApiError::from)?;

    info!(workflow_id = %updated.id(), user_id = %user_id, "Workflow synced from remote");

    Ok(Json(WorkflowResponse::from(updated)))
}

/// GET /v1/workflows/{workflow_id}
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let id = WorkflowId::parse(&workflow_id).map_err(ApiError::from)?;

    let record = state
        .workflow_repository
        .get(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Workflow '{}' not found", workflow_id)))?;

    Ok(Json(WorkflowResponse::from(record)))
}

/// POST /v1/workflows/{workflow_id}/fix
pub async fn fix_workflow(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Path(workflow_id): Path<String>,
    Json(request): Json<FixWorkflowRequest>,
) -> Result<Response, ApiError> {
    let id = WorkflowId::parse(&workflow_id).map_err(ApiError::from)?;

    debug!(workflow_id = %id, user_id = %user_id, "Starting remediation pass");

    let outcome = state
        .remediation_service
        .debug_and_fix(&id, request.execution, &user_id)
        .await
        .map_err(ApiError::from)?;

    info!(
        workflow_id = %id,
        success = outcome.success,
        message = %outcome.message,
        "Remediation pass finished"
    );

    Ok(Json(outcome).into_response())
}

async fn lookup_by_remote_id(
    state: &AppState,
    remote_id: &str,
) -> Result<WorkflowRecord, ApiError> {
    let remote_id = RemoteWorkflowId::new(remote_id).map_err(ApiError::from)?;

    state
        .workflow_repository
        .get_by_remote_id(&remote_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| {
            ApiError::not_found(format!(
                "No local workflow tracks remote id '{}'",
                remote_id
            ))
        })
}
