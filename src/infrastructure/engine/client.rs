//! REST adaptation for the remote workflow-execution engine

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

use super::http_client::HttpClientTrait;
use crate::domain::{
    DomainError, EngineClient, EngineCredential, ExecutionRecord, RemoteWorkflow, RemoteWorkflowId,
};

/// Upper bound on the failing executions returned per call; bounds the cost
/// of a remediation pass.
pub const MAX_FAILING_EXECUTIONS: usize = 20;

/// Fields the engine manages itself; stripped from outgoing payloads so a
/// previously pulled definition can be sent back without conflict.
const ENGINE_MANAGED_FIELDS: &[&str] = &["id", "active", "createdAt", "updatedAt", "tags", "versionId"];

const API_KEY_HEADER: &str = "X-Engine-API-Key";

/// Engine client over the engine's REST API
#[derive(Debug)]
pub struct HttpEngineClient<C: HttpClientTrait> {
    client: C,
}

impl<C: HttpClientTrait> HttpEngineClient<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    fn workflows_url(&self, credential: &EngineCredential) -> String {
        format!("{}/api/v1/workflows", credential.base_url())
    }

    fn workflow_url(&self, credential: &EngineCredential, remote_id: &RemoteWorkflowId) -> String {
        format!("{}/api/v1/workflows/{}", credential.base_url(), remote_id)
    }

    fn executions_url(
        &self,
        credential: &EngineCredential,
        remote_id: Option<&RemoteWorkflowId>,
    ) -> String {
        let mut url = format!(
            "{}/api/v1/executions?status=error&includeData=true&limit={}",
            credential.base_url(),
            MAX_FAILING_EXECUTIONS
        );
        if let Some(id) = remote_id {
            url.push_str(&format!("&workflowId={}", id));
        }
        url
    }

    fn headers<'a>(&self, credential: &'a EngineCredential) -> Vec<(&'a str, &'a str)> {
        vec![
            (API_KEY_HEADER, credential.api_key()),
            ("Accept", "application/json"),
        ]
    }

    /// Build the create/update payload from an opaque definition.
    ///
    /// The definition may be a previously echoed engine body, so
    /// engine-managed fields are stripped and the caller's name wins.
    fn build_payload(&self, definition: &Value, name: &str) -> Result<Value, DomainError> {
        let mut payload = definition
            .as_object()
            .cloned()
            .ok_or_else(|| DomainError::validation("Workflow definition must be a JSON object"))?;

        for field in ENGINE_MANAGED_FIELDS {
            payload.remove(*field);
        }

        payload.insert("name".to_string(), json!(name));
        payload
            .entry("connections".to_string())
            .or_insert_with(|| json!({}));
        payload
            .entry("settings".to_string())
            .or_insert_with(|| json!({}));

        Ok(Value::Object(payload))
    }

    fn parse_executions(&self, body: Value) -> Vec<ExecutionRecord> {
        let items = match body {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let mut executions: Vec<ExecutionRecord> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(execution) => Some(execution),
                Err(e) => {
                    warn!(error = %e, "Skipping unparseable execution record");
                    None
                }
            })
            .collect();

        // Engines generally return recent-first already; make it a
        // guarantee. Stable sort keeps engine order for ties and
        // records without a start time.
        executions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        executions.truncate(MAX_FAILING_EXECUTIONS);
        executions
    }
}

#[async_trait]
impl<C: HttpClientTrait> EngineClient for HttpEngineClient<C> {
    async fn deploy(
        &self,
        credential: &EngineCredential,
        definition: &Value,
        name: &str,
    ) -> Result<RemoteWorkflow, DomainError> {
        let payload = self.build_payload(definition, name)?;
        let response = self
            .client
            .post_json(&self.workflows_url(credential), self.headers(credential), &payload)
            .await?;

        RemoteWorkflow::from_response(response)
    }

    async fn push(
        &self,
        credential: &EngineCredential,
        remote_id: &RemoteWorkflowId,
        definition: &Value,
        name: &str,
    ) -> Result<RemoteWorkflow, DomainError> {
        let payload = self.build_payload(definition, name)?;
        let response = self
            .client
            .put_json(
                &self.workflow_url(credential, remote_id),
                self.headers(credential),
                &payload,
            )
            .await?;

        RemoteWorkflow::from_response(response)
    }

    async fn pull(
        &self,
        credential: &EngineCredential,
        remote_id: &RemoteWorkflowId,
    ) -> Result<RemoteWorkflow, DomainError> {
        let response = self
            .client
            .get_json(
                &self.workflow_url(credential, remote_id),
                self.headers(credential),
            )
            .await?;

        RemoteWorkflow::from_response(response)
    }

    async fn list_failing_executions(
        &self,
        credential: &EngineCredential,
        remote_id: Option<&RemoteWorkflowId>,
    ) -> Result<Vec<ExecutionRecord>, DomainError> {
        let response = self
            .client
            .get_json(
                &self.executions_url(credential, remote_id),
                self.headers(credential),
            )
            .await?;

        Ok(self.parse_executions(response))
    }

    async fn test_connectivity(&self, credential: &EngineCredential) -> bool {
        let url = format!("{}/api/v1/workflows?limit=1", credential.base_url());
        self.client.get_json(&url, self.headers(credential)).await.is_ok()
    }
}
