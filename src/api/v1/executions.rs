//! Failing execution listing

use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::debug;

use crate::api::middleware::UserIdentity;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{DomainError, ExecutionRecord, RemoteWorkflowId};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FailingExecutionsParams {
    /// Scope the listing to one remote workflow
    #[serde(default)]
    pub remote_id: Option<String>,
}

/// GET /v1/executions/failing
pub async fn list_failing_executions(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    Query(params): Query<FailingExecutionsParams>,
) -> Result<Json<Vec<ExecutionRecord>>, ApiError> {
    let remote_id = params
        .remote_id
        .map(RemoteWorkflowId::new)
        .transpose()
        .map_err(ApiError::from)?;

    let credential = state
        .credential_resolver
        .resolve(&user_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| {
            ApiError::from(DomainError::credentials_invalid(format!(
                "No engine credential configured for user '{}'",
                user_id
            )))
        })?;

    let executions = state
        .engine_client
        .list_failing_executions(&credential, remote_id.as_ref())
        .await
        .map_err(ApiError::from)?;

    debug!(
        user_id = %user_id,
        count = executions.len(),
        "Listed failing executions"
    );

    Ok(Json(executions))
}
