//! Sync reconciler - the single authority for local/remote workflow state
//!
//! Decides, per operation, which side's data becomes the new local truth.
//! Local writes always happen strictly after a confirmed remote response,
//! always as a full replace of the record (never a field merge), and never
//! on a failed remote call. Racing calls for the same record converge to
//! whichever confirmed response each write observed last.

use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::domain::{
    CredentialResolver, DomainError, EngineClient, EngineCredential, RemoteWorkflow,
    RemoteWorkflowId, UserId, WorkflowId, WorkflowRecord, WorkflowRepository,
};

/// Counter for local persist failures after a confirmed remote mutation.
/// These leave local state stale until the next pull and are the one
/// failure class that must stand out in telemetry.
pub const SYNC_DRIFT_COUNTER: &str = "workflow_sync_drift_total";

/// Sync reconciler over a workflow repository, an engine client and a
/// per-call credential resolver
pub struct SyncService<R, C, Cr> {
    repository: Arc<R>,
    engine: Arc<C>,
    resolver: Arc<Cr>,
}

impl<R, C, Cr> std::fmt::Debug for SyncService<R, C, Cr> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService").finish()
    }
}

impl<R, C, Cr> SyncService<R, C, Cr>
where
    R: WorkflowRepository,
    C: EngineClient,
    Cr: CredentialResolver,
{
    pub fn new(repository: Arc<R>, engine: Arc<C>, resolver: Arc<Cr>) -> Self {
        Self {
            repository,
            engine,
            resolver,
        }
    }

    /// Create a draft record and deploy it in one pass
    pub async fn deploy_new(
        &self,
        name: &str,
        definition: Value,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError> {
        let record = self.repository.create(WorkflowRecord::new(name, definition)).await?;
        debug!(workflow_id = %record.id(), "Created draft record");
        self.deploy(record.id().clone(), user_id).await
    }

    /// Deploy a draft record. Create-only: a record that already has a
    /// remote id is rejected before any network call - callers must push.
    pub async fn deploy(
        &self,
        workflow_id: WorkflowId,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError> {
        let record = self.get_record(&workflow_id).await?;
        let definition = record.definition().clone();
        self.deploy_definition(workflow_id, &definition, user_id).await
    }

    /// Deploy with an explicit definition (remediation redeploys through
    /// here without first writing an unconfirmed definition locally)
    pub async fn deploy_definition(
        &self,
        workflow_id: WorkflowId,
        definition: &Value,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError> {
        let mut record = self.get_record(&workflow_id).await?;

        if record.remote_id().is_some() {
            return Err(DomainError::validation(format!(
                "Workflow '{}' is already deployed; use push to update it",
                workflow_id
            )));
        }

        let credential = self.credential_for(user_id).await?;
        let remote = self
            .engine
            .deploy(&credential, definition, record.name())
            .await?;

        info!(workflow_id = %workflow_id, remote_id = %remote.id, "Deploy confirmed by engine");

        record.record_deploy(remote.id.clone(), remote.definition);
        self.persist_confirmed(record).await
    }

    /// Push the stored definition to the existing remote workflow
    pub async fn push(
        &self,
        workflow_id: WorkflowId,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError> {
        let record = self.get_record(&workflow_id).await?;
        let definition = record.definition().clone();
        self.push_definition(workflow_id, &definition, None, user_id).await
    }

    /// Push an explicit definition, optionally renaming the remote workflow
    pub async fn push_definition(
        &self,
        workflow_id: WorkflowId,
        definition: &Value,
        name_override: Option<&str>,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError> {
        let mut record = self.get_record(&workflow_id).await?;
        let remote_id = self.require_remote_id(&record)?;

        let credential = self.credential_for(user_id).await?;
        let name = name_override.unwrap_or_else(|| record.name());
        let remote = self
            .engine
            .push(&credential, &remote_id, definition, name)
            .await?;

        debug!(workflow_id = %workflow_id, remote_id = %remote.id, "Push confirmed by engine");

        self.apply_remote(&mut record, remote);
        self.persist_confirmed(record).await
    }

    /// Re-establish agreement from the remote side, e.g. after the workflow
    /// was edited directly in the engine's own UI
    pub async fn pull(
        &self,
        workflow_id: WorkflowId,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError> {
        let mut record = self.get_record(&workflow_id).await?;
        let remote_id = self.require_remote_id(&record)?;

        let credential = self.credential_for(user_id).await?;
        let remote = self.engine.pull(&credential, &remote_id).await?;

        debug!(workflow_id = %workflow_id, "Pulled remote content");

        self.apply_remote(&mut record, remote);
        self.persist_confirmed(record).await
    }

    /// Record a failed sync or remediation cycle on the workflow
    pub async fn mark_error(
        &self,
        workflow_id: &WorkflowId,
        reason: &str,
    ) -> Result<WorkflowRecord, DomainError> {
        let mut record = self.get_record(workflow_id).await?;
        record.record_error();
        info!(workflow_id = %workflow_id, reason, "Workflow marked as error");
        self.repository.update(record).await
    }

    async fn get_record(&self, workflow_id: &WorkflowId) -> Result<WorkflowRecord, DomainError> {
        self.repository
            .get(workflow_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Workflow '{}' not found", workflow_id)))
    }

    fn require_remote_id(
        &self,
        record: &WorkflowRecord,
    ) -> Result<RemoteWorkflowId, DomainError> {
        record.remote_id().cloned().ok_or_else(|| {
            DomainError::validation(format!(
                "Workflow '{}' has never been deployed; use deploy first",
                record.id()
            ))
        })
    }

    /// Full overwrite from the engine's echoed state. The remote response is
    /// authoritative - the engine may have reassigned ids, stripped fields
    /// or normalized the graph on save.
    fn apply_remote(&self, record: &mut WorkflowRecord, remote: RemoteWorkflow) {
        if !remote.name.is_empty() {
            record.set_name(remote.name.clone());
        }
        record.record_sync(remote.definition);
    }

    async fn persist_confirmed(
        &self,
        record: WorkflowRecord,
    ) -> Result<WorkflowRecord, DomainError> {
        let workflow_id = record.id().clone();
        match self.repository.update(record).await {
            Ok(record) => Ok(record),
            Err(e) => {
                // The remote mutation already succeeded; only the local copy
                // is stale now. Recovery is a pull, not a retry of the
                // remote call.
                counter!(SYNC_DRIFT_COUNTER).increment(1);
                error!(
                    workflow_id = %workflow_id,
                    error = %e,
                    "Local persist failed after confirmed remote mutation; local copy is stale until the next pull"
                );
                Err(DomainError::persistence(format!(
                    "Remote update confirmed but local write failed: {}",
                    e
                )))
            }
        }
    }

    async fn credential_for(&self, user_id: &UserId) -> Result<EngineCredential, DomainError> {
        self.resolver.resolve(user_id).await?.ok_or_else(|| {
            DomainError::credentials_invalid(format!(
                "No engine credential configured for user '{}'",
                user_id
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::mock::MockCredentialResolver;
    use crate::domain::engine::client::mock::MockEngineClient;
    use crate::domain::workflow::repository::mock::MockWorkflowRepository;
    use crate::domain::{RemoteWorkflowId, WorkflowStatus};
    use serde_json::json;

    fn resolver() -> Arc<MockCredentialResolver> {
        Arc::new(MockCredentialResolver::new().with_credential(
            "alice",
            crate::domain::EngineCredential::new("https://engine.local", "k"),
        ))
    }

    fn user() -> UserId {
        UserId::new("alice")
    }

    fn service(
        repository: MockWorkflowRepository,
        engine: MockEngineClient,
    ) -> (
        SyncService<MockWorkflowRepository, MockEngineClient, MockCredentialResolver>,
        Arc<MockWorkflowRepository>,
        Arc<MockEngineClient>,
    ) {
        let repository = Arc::new(repository);
        let engine = Arc::new(engine);
        let service = SyncService::new(repository.clone(), engine.clone(), resolver());
        (service, repository, engine)
    }

    #[tokio::test]
    async fn test_deploy_overwrites_local_from_echoed_response() {
        let echoed = json!({
            "id": "abc123",
            "name": "Test",
            "active": true,
            "nodes": [{"name": "Start", "normalized": true}],
            "connections": {}
        });
        let engine = MockEngineClient::new().with_deploy_response(echoed.clone());
        let (service, _, _) = service(MockWorkflowRepository::new(), engine);

        let record = service
            .deploy_new("Test", json!({"nodes": [{"name": "Start"}]}), &user())
            .await
            .unwrap();

        assert_eq!(record.remote_id().unwrap().as_str(), "abc123");
        assert_eq!(record.status(), WorkflowStatus::Deployed);
        // Authoritative-response rule: the local definition is the engine's
        // echoed body, not the payload the caller sent.
        assert_eq!(record.definition(), &echoed);
        assert!(record.deployed_at().is_some());
    }

    #[tokio::test]
    async fn test_deploy_twice_rejected_before_any_network_call() {
        let mut existing = WorkflowRecord::new("Test", json!({"nodes": []}));
        existing.record_deploy(RemoteWorkflowId::new("r-1").unwrap(), json!({}));
        let id = existing.id().clone();

        let (service, _, engine) = service(
            MockWorkflowRepository::new().with_record(existing),
            MockEngineClient::new().with_deploy_response(json!({"id": "r-2"})),
        );

        let result = service.deploy(id, &user()).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(engine.deploy_calls(), 0);
    }

    #[tokio::test]
    async fn test_push_requires_remote_id() {
        let draft = WorkflowRecord::new("Draft", json!({"nodes": []}));
        let id = draft.id().clone();

        let (service, _, engine) = service(
            MockWorkflowRepository::new().with_record(draft),
            MockEngineClient::new(),
        );

        let result = service.push(id, &user()).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(engine.push_calls(), 0);
    }

    #[tokio::test]
    async fn test_push_full_overwrite_never_merge() {
        let mut record = WorkflowRecord::new("Test", json!({}));
        record.record_deploy(
            RemoteWorkflowId::new("abc123").unwrap(),
            json!({"nodes": [{"name": "Old"}], "localOnlyField": true}),
        );
        let id = record.id().clone();

        let echoed = json!({"id": "abc123", "name": "Test", "nodes": [{"name": "New"}]});
        let (service, _, _) = service(
            MockWorkflowRepository::new().with_record(record),
            MockEngineClient::new().with_push_response(echoed.clone()),
        );

        let updated = service.push(id, &user()).await.unwrap();

        // The stale localOnlyField must not survive: the write is a replace.
        assert_eq!(updated.definition(), &echoed);
    }

    #[tokio::test]
    async fn test_pull_resyncs_and_clears_error_status() {
        let mut record = WorkflowRecord::new("Test", json!({}));
        record.record_deploy(RemoteWorkflowId::new("abc123").unwrap(), json!({"old": true}));
        record.record_error();
        let id = record.id().clone();

        let remote_truth = json!({"id": "abc123", "name": "Edited remotely", "nodes": []});
        let (service, _, _) = service(
            MockWorkflowRepository::new().with_record(record),
            MockEngineClient::new().with_pull_response(remote_truth.clone()),
        );

        let updated = service.pull(id, &user()).await.unwrap();

        assert_eq!(updated.definition(), &remote_truth);
        assert_eq!(updated.status(), WorkflowStatus::Deployed);
        assert_eq!(updated.name(), "Edited remotely");
        assert!(updated.last_sync_at().is_some());
    }

    #[tokio::test]
    async fn test_remote_failure_leaves_record_untouched() {
        let mut record = WorkflowRecord::new("Test", json!({}));
        record.record_deploy(RemoteWorkflowId::new("abc123").unwrap(), json!({"v": 1}));
        let id = record.id().clone();

        let (service, repository, _) = service(
            MockWorkflowRepository::new().with_record(record),
            MockEngineClient::new().with_connection_error("ECONNREFUSED"),
        );

        let result = service.push(id.clone(), &user()).await;
        assert!(matches!(result, Err(DomainError::Connection { .. })));

        let stored = repository.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.definition(), &json!({"v": 1}));
        assert_eq!(stored.status(), WorkflowStatus::Deployed);
    }

    #[tokio::test]
    async fn test_missing_credential_rejected_before_engine_call() {
        let record = WorkflowRecord::new("Test", json!({"nodes": []}));
        let id = record.id().clone();

        let repository = Arc::new(MockWorkflowRepository::new().with_record(record));
        let engine = Arc::new(
            MockEngineClient::new().with_deploy_response(json!({"id": "never"})),
        );
        let service = SyncService::new(
            repository,
            engine.clone(),
            Arc::new(MockCredentialResolver::new()),
        );

        let result = service.deploy(id, &UserId::new("nobody")).await;

        assert!(matches!(result, Err(DomainError::CredentialsInvalid { .. })));
        assert_eq!(engine.deploy_calls(), 0);
    }

    #[tokio::test]
    async fn test_local_persist_failure_after_confirmed_remote_is_persistence_error() {
        let mut record = WorkflowRecord::new("Test", json!({}));
        record.record_deploy(RemoteWorkflowId::new("abc123").unwrap(), json!({}));
        let id = record.id().clone();

        let (service, _, engine) = service(
            MockWorkflowRepository::new()
                .with_record(record)
                .with_failing_writes("disk full"),
            MockEngineClient::new()
                .with_push_response(json!({"id": "abc123", "name": "Test"})),
        );

        let result = service.push(id, &user()).await;

        // The remote call went through; the failure class distinguishes
        // "stale local copy" from "remote call failed".
        assert_eq!(engine.push_calls(), 1);
        assert!(matches!(result, Err(DomainError::Persistence { .. })));
    }

    #[tokio::test]
    async fn test_mark_error_transitions_status() {
        let mut record = WorkflowRecord::new("Test", json!({}));
        record.record_deploy(RemoteWorkflowId::new("abc123").unwrap(), json!({}));
        let id = record.id().clone();

        let (service, repository, _) = service(
            MockWorkflowRepository::new().with_record(record),
            MockEngineClient::new(),
        );

        service.mark_error(&id, "remediation failed").await.unwrap();

        let stored = repository.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.status(), WorkflowStatus::Error);
    }
}
