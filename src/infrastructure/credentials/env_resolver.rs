use async_trait::async_trait;
use std::env;

use crate::domain::{CredentialResolver, DomainError, EngineCredential, UserId};

const DEFAULT_BASE_URL_VAR: &str = "ENGINE_BASE_URL";
const DEFAULT_API_KEY_VAR: &str = "ENGINE_API_KEY";

/// Credential resolver backed by environment variables.
///
/// Single-tenant deployments configure one engine account for every user;
/// per-user credentials come from the Postgres resolver instead. Variables
/// are read on every call, so rotating them takes effect immediately.
#[derive(Debug)]
pub struct EnvCredentialResolver {
    base_url_var: String,
    api_key_var: String,
}

impl EnvCredentialResolver {
    pub fn new() -> Self {
        Self {
            base_url_var: DEFAULT_BASE_URL_VAR.to_string(),
            api_key_var: DEFAULT_API_KEY_VAR.to_string(),
        }
    }

    pub fn with_vars(
        base_url_var: impl Into<String>,
        api_key_var: impl Into<String>,
    ) -> Self {
        Self {
            base_url_var: base_url_var.into(),
            api_key_var: api_key_var.into(),
        }
    }
}

impl Default for EnvCredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialResolver for EnvCredentialResolver {
    async fn resolve(&self, _user_id: &UserId) -> Result<Option<EngineCredential>, DomainError> {
        let base_url = match env::var(&self.base_url_var) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => return Ok(None),
        };
        let api_key = match env::var(&self.api_key_var) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => return Ok(None),
        };

        Ok(Some(EngineCredential::new(base_url, api_key)))
    }
}
