//! Application state for shared services

use std::sync::Arc;

use serde_json::Value;

use crate::domain::{
    CredentialResolver, DefinitionProposer, DomainError, EngineClient, ExecutionRecord, UserId,
    WorkflowId, WorkflowRecord, WorkflowRepository,
};
use crate::infrastructure::services::{RemediationOutcome, RemediationService, SyncService};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub sync_service: Arc<dyn SyncServiceTrait>,
    pub remediation_service: Arc<dyn RemediationServiceTrait>,
    pub engine_client: Arc<dyn EngineClient>,
    pub credential_resolver: Arc<dyn CredentialResolver>,
    pub workflow_repository: Arc<dyn WorkflowRepository>,
    pub definition_proposer: Option<Arc<dyn DefinitionProposer>>,
    /// Identity fallback for requests without an explicit user header -
    /// deployment configuration, not core logic
    pub default_user: UserId,
}

/// Trait for sync reconciler operations
#[async_trait::async_trait]
pub trait SyncServiceTrait: Send + Sync {
    async fn deploy_new(
        &self,
        name: &str,
        definition: Value,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn push(
        &self,
        workflow_id: &WorkflowId,
        definition: Option<Value>,
        name_override: Option<String>,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError>;

    async fn pull(
        &self,
        workflow_id: &WorkflowId,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError>;
}

/// Trait for remediation operations
#[async_trait::async_trait]
pub trait RemediationServiceTrait: Send + Sync {
    async fn debug_and_fix(
        &self,
        workflow_id: &WorkflowId,
        execution: Option<ExecutionRecord>,
        user_id: &UserId,
    ) -> Result<RemediationOutcome, DomainError>;
}

#[async_trait::async_trait]
impl<R, C, Cr> SyncServiceTrait for SyncService<R, C, Cr>
where
    R: WorkflowRepository + 'static,
    C: EngineClient + 'static,
    Cr: CredentialResolver + 'static,
{
    async fn deploy_new(
        &self,
        name: &str,
        definition: Value,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError> {
        SyncService::deploy_new(self, name, definition, user_id).await
    }

    async fn push(
        &self,
        workflow_id: &WorkflowId,
        definition: Option<Value>,
        name_override: Option<String>,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError> {
        match definition {
            Some(definition) => {
                SyncService::push_definition(
                    self,
                    workflow_id.clone(),
                    &definition,
                    name_override.as_deref(),
                    user_id,
                )
                .await
            }
            None => SyncService::push(self, workflow_id.clone(), user_id).await,
        }
    }

    async fn pull(
        &self,
        workflow_id: &WorkflowId,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError> {
        SyncService::pull(self, workflow_id.clone(), user_id).await
    }
}

#[async_trait::async_trait]
impl<R, C, Cr> RemediationServiceTrait for RemediationService<R, C, Cr>
where
    R: WorkflowRepository + 'static,
    C: EngineClient + 'static,
    Cr: CredentialResolver + 'static,
{
    async fn debug_and_fix(
        &self,
        workflow_id: &WorkflowId,
        execution: Option<ExecutionRecord>,
        user_id: &UserId,
    ) -> Result<RemediationOutcome, DomainError> {
        RemediationService::debug_and_fix(self, workflow_id, execution, user_id).await
    }
}
