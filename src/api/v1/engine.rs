//! Remote engine capability probe

use axum::extract::State;
use serde::Serialize;

use crate::api::middleware::UserIdentity;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatusResponse {
    /// Whether a credential is configured for the requesting user
    pub configured: bool,
    /// Best-effort reachability of the engine with that credential
    pub reachable: bool,
}

/// GET /v1/engine/status
///
/// Non-blocking capability probe for the UI. Never fails on an unreachable
/// engine - that is the answer, not an error.
pub async fn engine_status(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
) -> Result<Json<EngineStatusResponse>, ApiError> {
    let credential = state
        .credential_resolver
        .resolve(&user_id)
        .await
        .map_err(ApiError::from)?;

    let response = match credential {
        Some(credential) => EngineStatusResponse {
            configured: true,
            reachable: state.engine_client.test_connectivity(&credential).await,
        },
        None => EngineStatusResponse {
            configured: false,
            reachable: false,
        },
    };

    Ok(Json(response))
}
