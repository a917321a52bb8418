//! Remote engine client trait

use async_trait::async_trait;

use super::remote::{ExecutionRecord, RemoteWorkflow, RemoteWorkflowId};
use crate::domain::credentials::EngineCredential;
use crate::domain::DomainError;

/// Capability set over the remote engine's REST interface.
///
/// Pure protocol adaptation - no business logic. Every call takes the
/// credential explicitly; implementations hold no per-user state, so
/// credential rotation is picked up on the next call.
///
/// `deploy` is the one non-idempotent operation and must never be retried
/// blindly; `push`, `pull` and the reads are safe to retry.
#[async_trait]
pub trait EngineClient: Send + Sync + std::fmt::Debug {
    /// Create a new remote workflow
    async fn deploy(
        &self,
        credential: &EngineCredential,
        definition: &serde_json::Value,
        name: &str,
    ) -> Result<RemoteWorkflow, DomainError>;

    /// Overwrite an existing remote workflow
    async fn push(
        &self,
        credential: &EngineCredential,
        remote_id: &RemoteWorkflowId,
        definition: &serde_json::Value,
        name: &str,
    ) -> Result<RemoteWorkflow, DomainError>;

    /// Fetch the current remote content
    async fn pull(
        &self,
        credential: &EngineCredential,
        remote_id: &RemoteWorkflowId,
    ) -> Result<RemoteWorkflow, DomainError>;

    /// Recent executions with status `error`, most recent first, capped.
    async fn list_failing_executions(
        &self,
        credential: &EngineCredential,
        remote_id: Option<&RemoteWorkflowId>,
    ) -> Result<Vec<ExecutionRecord>, DomainError>;

    /// Best-effort capability probe. Never errors.
    async fn test_connectivity(&self, credential: &EngineCredential) -> bool;
}
