//! Request identity resolution
//!
//! Authentication proper lives in the surrounding service. This extractor
//! reads the user id the upstream layer forwarded in `X-User-Id`, falling
//! back to the deployment's configured default user.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::UserId;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// Extractor yielding the resolved user identity
#[derive(Debug, Clone)]
pub struct UserIdentity(pub UserId);

impl FromRequestParts<AppState> for UserIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = match parts.headers.get(USER_ID_HEADER) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| ApiError::bad_request("Invalid X-User-Id header"))?;
                if value.trim().is_empty() {
                    return Err(ApiError::bad_request("X-User-Id header cannot be empty"));
                }
                UserId::new(value)
            }
            None => state.default_user.clone(),
        };

        Ok(UserIdentity(user_id))
    }
}
