//! Workflow record repository trait

use async_trait::async_trait;

use super::entity::{WorkflowId, WorkflowRecord};
use crate::domain::engine::RemoteWorkflowId;
use crate::domain::DomainError;

/// Repository trait for workflow record persistence.
///
/// `update` must be atomic per row; the reconciler relies on each write
/// being a full replace of one record.
#[async_trait]
pub trait WorkflowRepository: Send + Sync + std::fmt::Debug {
    /// Get a record by local id
    async fn get(&self, id: &WorkflowId) -> Result<Option<WorkflowRecord>, DomainError>;

    /// Get a record by the remote engine's id
    async fn get_by_remote_id(
        &self,
        remote_id: &RemoteWorkflowId,
    ) -> Result<Option<WorkflowRecord>, DomainError>;

    /// List all records
    async fn list(&self) -> Result<Vec<WorkflowRecord>, DomainError>;

    /// Create a new record
    async fn create(&self, record: WorkflowRecord) -> Result<WorkflowRecord, DomainError>;

    /// Replace an existing record
    async fn update(&self, record: WorkflowRecord) -> Result<WorkflowRecord, DomainError>;

    /// Delete a record by local id. Never touches the remote workflow.
    async fn delete(&self, id: &WorkflowId) -> Result<bool, DomainError>;
}
