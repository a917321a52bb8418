//! Remote engine credentials and per-user resolution

use async_trait::async_trait;

use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Credential for one user's remote engine account.
///
/// Resolved immediately before each engine call and never cached beyond the
/// operation using it, so a rotated key takes effect on the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCredential {
    base_url: String,
    api_key: String,
}

impl EngineCredential {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Per-user credential lookup.
///
/// Returns `Ok(None)` when the user has no engine credential configured;
/// callers surface that as `CredentialsInvalid`.
#[async_trait]
pub trait CredentialResolver: Send + Sync + std::fmt::Debug {
    async fn resolve(&self, user_id: &UserId) -> Result<Option<EngineCredential>, DomainError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let cred = EngineCredential::new("https://engine.example.com/", "key-123");
        assert_eq!(cred.base_url(), "https://engine.example.com");
        assert_eq!(cred.api_key(), "key-123");
    }

    #[tokio::test]
    async fn test_mock_resolver_missing_user() {
        let resolver = mock::MockCredentialResolver::new();
        let resolved = resolver.resolve(&UserId::new("nobody")).await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_mock_resolver_known_user() {
        let resolver = mock::MockCredentialResolver::new().with_credential(
            "alice",
            EngineCredential::new("https://engine.local", "alice-key"),
        );

        let resolved = resolver.resolve(&UserId::new("alice")).await.unwrap();
        assert_eq!(resolved.unwrap().api_key(), "alice-key");
    }
}
