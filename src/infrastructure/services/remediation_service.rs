//! Auto-remediation - one diagnose-and-fix pass over a failing workflow
//!
//! Each attempt walks Fetching -> Diagnosing -> Patching -> Redeploying and
//! terminates in Succeeded or Failed. An attempt never loops internally;
//! repeated failures require the caller to invoke remediation again, which
//! re-fetches fresh execution data so consecutive attempts are diagnosed
//! independently against current state.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::sync_service::SyncService;
use crate::domain::diagnosis::{apply_patch, classify, extract_error_message, PatchConfig};
use crate::domain::{
    CredentialResolver, DomainError, EngineClient, ExecutionRecord, UserId, WorkflowId,
    WorkflowRecord, WorkflowRepository,
};

/// Outcome of one remediation attempt
#[derive(Debug, Clone, serde::Serialize)]
pub struct RemediationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    pub message: String,
}

impl RemediationOutcome {
    fn no_errors_found(workflow_id: WorkflowId) -> Self {
        Self {
            success: true,
            workflow_id: Some(workflow_id),
            message: "No errors found".to_string(),
        }
    }

    fn fixed(workflow_id: WorkflowId, message: String) -> Self {
        Self {
            success: true,
            workflow_id: Some(workflow_id),
            message,
        }
    }

    fn failed(workflow_id: WorkflowId, message: String) -> Self {
        Self {
            success: false,
            workflow_id: Some(workflow_id),
            message,
        }
    }
}

/// Remediation engine over the sync reconciler and the engine client
pub struct RemediationService<R, C, Cr> {
    sync: Arc<SyncService<R, C, Cr>>,
    repository: Arc<R>,
    engine: Arc<C>,
    resolver: Arc<Cr>,
    patch_config: PatchConfig,
}

impl<R, C, Cr> std::fmt::Debug for RemediationService<R, C, Cr> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemediationService").finish()
    }
}

impl<R, C, Cr> RemediationService<R, C, Cr>
where
    R: WorkflowRepository,
    C: EngineClient,
    Cr: CredentialResolver,
{
    pub fn new(
        sync: Arc<SyncService<R, C, Cr>>,
        repository: Arc<R>,
        engine: Arc<C>,
        resolver: Arc<Cr>,
        patch_config: PatchConfig,
    ) -> Self {
        Self {
            sync,
            repository,
            engine,
            resolver,
            patch_config,
        }
    }

    /// Run one diagnose-and-fix pass for a workflow.
    ///
    /// `execution` lets a caller pin the failing execution to fix; when
    /// absent the most recent failing execution is fetched. Finding nothing
    /// to fix is a benign outcome, not an error.
    pub async fn debug_and_fix(
        &self,
        workflow_id: &WorkflowId,
        execution: Option<ExecutionRecord>,
        user_id: &UserId,
    ) -> Result<RemediationOutcome, DomainError> {
        // Fetching: always work from the remote-confirmed definition, never
        // the possibly-stale local copy.
        let record = self.fetch_record(workflow_id, user_id).await?;
        let definition = record.definition().clone();

        let Some(execution) = self.select_execution(&record, execution, user_id).await? else {
            debug!(workflow_id = %workflow_id, "No failing execution to remediate");
            return Ok(RemediationOutcome::no_errors_found(workflow_id.clone()));
        };

        // Diagnosing
        let diagnostic = extract_error_message(&execution);
        let classification = classify(&diagnostic);
        info!(
            workflow_id = %workflow_id,
            execution_id = %execution.id,
            root_cause = %classification.root_cause,
            diagnostic = %diagnostic,
            "Diagnosed failing execution"
        );

        // Patching: no rule match means no silent guess and no mutation.
        let diagnosis = match apply_patch(&definition, &classification, &self.patch_config) {
            Ok(diagnosis) => diagnosis,
            Err(DomainError::UnrecognizedFailure { message }) => {
                warn!(workflow_id = %workflow_id, reason = %message, "Remediation could not patch");
                return Ok(RemediationOutcome::failed(
                    workflow_id.clone(),
                    format!("Unable to automatically fix \"{}\": {}", diagnostic, message),
                ));
            }
            Err(e) => return Err(e),
        };

        // Redeploying
        self.redeploy(&record, &diagnosis.patched_definition, &diagnosis.patch_description, user_id)
            .await
    }

    async fn fetch_record(
        &self,
        workflow_id: &WorkflowId,
        user_id: &UserId,
    ) -> Result<WorkflowRecord, DomainError> {
        let record = self
            .repository
            .get(workflow_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Workflow '{}' not found", workflow_id)))?;

        if record.remote_id().is_some() {
            return self.sync.pull(workflow_id.clone(), user_id).await;
        }

        Ok(record)
    }

    async fn select_execution(
        &self,
        record: &WorkflowRecord,
        supplied: Option<ExecutionRecord>,
        user_id: &UserId,
    ) -> Result<Option<ExecutionRecord>, DomainError> {
        if let Some(execution) = supplied {
            return Ok(Some(execution));
        }

        let Some(remote_id) = record.remote_id() else {
            // Never deployed: there is no remote run history to consult.
            return Ok(None);
        };

        let credential = self.resolver.resolve(user_id).await?.ok_or_else(|| {
            DomainError::credentials_invalid(format!(
                "No engine credential configured for user '{}'",
                user_id
            ))
        })?;

        let executions = self
            .engine
            .list_failing_executions(&credential, Some(remote_id))
            .await?;

        Ok(executions.into_iter().next())
    }

    async fn redeploy(
        &self,
        record: &WorkflowRecord,
        patched_definition: &Value,
        patch_description: &str,
        user_id: &UserId,
    ) -> Result<RemediationOutcome, DomainError> {
        let workflow_id = record.id().clone();

        let result = if record.remote_id().is_some() {
            self.sync
                .push_definition(workflow_id.clone(), patched_definition, None, user_id)
                .await
        } else {
            self.sync
                .deploy_definition(workflow_id.clone(), patched_definition, user_id)
                .await
        };

        match result {
            Ok(_) => {
                info!(workflow_id = %workflow_id, "Remediated workflow redeployed");
                Ok(RemediationOutcome::fixed(
                    workflow_id,
                    format!("{}; workflow redeployed", patch_description),
                ))
            }
            Err(e) => {
                warn!(workflow_id = %workflow_id, error = %e, "Redeploy of patched workflow failed");
                if let Err(mark_err) = self
                    .sync
                    .mark_error(&workflow_id, "Redeploy of patched definition failed")
                    .await
                {
                    warn!(workflow_id = %workflow_id, error = %mark_err, "Failed to mark workflow as error");
                }
                Ok(RemediationOutcome::failed(
                    workflow_id,
                    format!("Patched but redeploy failed: {}", e),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credentials::mock::MockCredentialResolver;
    use crate::domain::engine::client::mock::MockEngineClient;
    use crate::domain::workflow::repository::mock::MockWorkflowRepository;
    use crate::domain::{EngineCredential, RemoteWorkflowId, WorkflowStatus};
    use serde_json::json;

    fn user() -> UserId {
        UserId::new("alice")
    }

    fn failing_execution(node: &str, message: &str) -> ExecutionRecord {
        serde_json::from_value(json!({
            "id": "exec-1",
            "workflowId": "abc123",
            "status": "error",
            "data": {
                "resultData": {
                    "runData": {
                        node: [{"error": {"message": message}}]
                    }
                }
            }
        }))
        .unwrap()
    }

    fn remote_body(definition_nodes: Value) -> Value {
        json!({
            "id": "abc123",
            "name": "Deployed flow",
            "active": true,
            "nodes": definition_nodes,
            "connections": {}
        })
    }

    fn deployed_record() -> WorkflowRecord {
        let mut record = WorkflowRecord::new("Deployed flow", json!({}));
        record.record_deploy(RemoteWorkflowId::new("abc123").unwrap(), json!({}));
        record
    }

    struct Fixture {
        service: RemediationService<MockWorkflowRepository, MockEngineClient, MockCredentialResolver>,
        repository: Arc<MockWorkflowRepository>,
        engine: Arc<MockEngineClient>,
    }

    fn fixture(repository: MockWorkflowRepository, engine: MockEngineClient) -> Fixture {
        let repository = Arc::new(repository);
        let engine = Arc::new(engine);
        let resolver = Arc::new(MockCredentialResolver::new().with_credential(
            "alice",
            EngineCredential::new("https://engine.local", "k"),
        ));
        let sync = Arc::new(SyncService::new(
            repository.clone(),
            engine.clone(),
            resolver.clone(),
        ));
        let service = RemediationService::new(
            sync,
            repository.clone(),
            engine.clone(),
            resolver,
            PatchConfig::default(),
        );
        Fixture {
            service,
            repository,
            engine,
        }
    }

    #[tokio::test]
    async fn test_no_failing_executions_is_benign() {
        let record = deployed_record();
        let id = record.id().clone();

        let f = fixture(
            MockWorkflowRepository::new().with_record(record),
            MockEngineClient::new().with_pull_response(remote_body(json!([]))),
        );

        let outcome = f.service.debug_and_fix(&id, None, &user()).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.message, "No errors found");
        // Nothing was deployed or pushed.
        assert_eq!(f.engine.deploy_calls(), 0);
        assert_eq!(f.engine.push_calls(), 0);
    }

    #[tokio::test]
    async fn test_full_remediation_pass_injects_credential_and_redeploys() {
        let record = deployed_record();
        let id = record.id().clone();

        let pulled = remote_body(json!([
            {"name": "HTTP Request", "type": "httpRequest", "parameters": {}}
        ]));
        let f = fixture(
            MockWorkflowRepository::new().with_record(record),
            MockEngineClient::new()
                .with_pull_response(pulled)
                .with_push_response(remote_body(json!([
                    {"name": "HTTP Request", "type": "httpRequest", "parameters": {},
                     "credentials": {"httpHeaderAuth": {"id": "default", "name": "Default credential"}}}
                ])))
                .with_execution(failing_execution(
                    "HTTP Request",
                    "Credentials for \"httpHeaderAuth\" are not set",
                )),
        );

        let outcome = f.service.debug_and_fix(&id, None, &user()).await.unwrap();

        assert!(outcome.success, "unexpected outcome: {}", outcome.message);
        assert!(outcome.message.contains("credential"));
        assert_eq!(f.engine.push_calls(), 1);
        assert_eq!(f.engine.deploy_calls(), 0);

        // The pushed definition is the pulled one plus exactly the injected
        // credential reference.
        let pushed = f.engine.last_pushed_definition().unwrap();
        assert_eq!(
            pushed["nodes"][0]["credentials"]["httpHeaderAuth"]["id"],
            "default"
        );

        // The local record holds the engine's echoed response after the push.
        let stored = f.repository.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.status(), WorkflowStatus::Deployed);
        assert!(stored.definition()["nodes"][0]["credentials"].is_object());
    }

    #[tokio::test]
    async fn test_unrecognized_failure_mutates_nothing() {
        let record = deployed_record();
        let id = record.id().clone();

        let pulled = remote_body(json!([{"name": "Some Node", "parameters": {}}]));
        let f = fixture(
            MockWorkflowRepository::new().with_record(record),
            MockEngineClient::new()
                .with_pull_response(pulled.clone())
                .with_execution(failing_execution(
                    "Some Node",
                    "something nobody has ever seen before",
                )),
        );

        let outcome = f.service.debug_and_fix(&id, None, &user()).await.unwrap();

        assert!(!outcome.success);
        assert!(outcome.message.contains("Unable to automatically fix"));
        // No redeploy happened and nothing was sent to the engine.
        assert_eq!(f.engine.push_calls(), 0);
        assert_eq!(f.engine.deploy_calls(), 0);
        assert!(f.engine.last_pushed_definition().is_none());

        // The record still holds exactly the pulled remote truth.
        let stored = f.repository.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.definition(), &pulled);
    }

    #[tokio::test]
    async fn test_supplied_execution_skips_listing() {
        let record = deployed_record();
        let id = record.id().clone();

        let pulled = remote_body(json!([
            {"name": "HTTP Request", "parameters": {"url": "https://x"}}
        ]));
        let f = fixture(
            MockWorkflowRepository::new().with_record(record),
            MockEngineClient::new()
                .with_pull_response(pulled)
                .with_push_response(remote_body(json!([]))),
        );

        let execution =
            failing_execution("HTTP Request", "connect ECONNREFUSED 10.0.0.5:443");
        let outcome = f
            .service
            .debug_and_fix(&id, Some(execution), &user())
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(f.engine.list_calls(), 0);

        // The connection patch enabled bounded retry on the node.
        let pushed = f.engine.last_pushed_definition().unwrap();
        assert_eq!(pushed["nodes"][0]["retryOnFail"], true);
    }

    #[tokio::test]
    async fn test_never_deployed_workflow_without_execution_is_benign() {
        let record = WorkflowRecord::new("Draft", json!({"nodes": []}));
        let id = record.id().clone();

        let f = fixture(
            MockWorkflowRepository::new().with_record(record),
            MockEngineClient::new(),
        );

        let outcome = f.service.debug_and_fix(&id, None, &user()).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.message, "No errors found");
        assert_eq!(f.engine.pull_calls(), 0);
    }

    #[tokio::test]
    async fn test_redeploy_failure_marks_record_error() {
        let record = deployed_record();
        let id = record.id().clone();

        // Pull succeeds via the first fixture engine; then fail pushes only.
        let pulled = remote_body(json!([{"name": "HTTP Request", "parameters": {}}]));
        let f = fixture(
            MockWorkflowRepository::new().with_record(record),
            MockEngineClient::new()
                .with_pull_response(pulled)
                .with_execution(failing_execution(
                    "HTTP Request",
                    "Credentials for \"httpHeaderAuth\" are not set",
                )),
            // No push response configured: the push fails with NotFound.
        );

        let outcome = f.service.debug_and_fix(&id, None, &user()).await.unwrap();

        assert!(!outcome.success);
        assert!(outcome.message.contains("redeploy failed"));

        let stored = f.repository.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.status(), WorkflowStatus::Error);
    }

    #[tokio::test]
    async fn test_unknown_workflow_id_is_not_found() {
        let f = fixture(MockWorkflowRepository::new(), MockEngineClient::new());

        let result = f
            .service
            .debug_and_fix(&crate::domain::WorkflowId::generate(), None, &user())
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
