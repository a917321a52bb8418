//! Workflow record domain entity

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::engine::RemoteWorkflowId;
use crate::domain::DomainError;

/// Local workflow identifier, generated at creation and immutable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Generate a fresh id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse and validate an existing id
    pub fn parse(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        Uuid::parse_str(&id)
            .map_err(|_| DomainError::validation(format!("Invalid workflow id '{}'", id)))?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a local workflow record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Deployed,
    Error,
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Deployed => write!(f, "deployed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Locally owned workflow record.
///
/// The `definition` is the engine-native graph document, carried as an opaque
/// JSON tree. After any confirmed reconciliation it holds exactly what the
/// engine echoed back, never the payload this side sent.
///
/// Invariant: `remote_id.is_some()` implies status is Deployed or Error.
/// All mutators that touch `remote_id`/`status` preserve it; the Sync
/// Reconciler is the only caller that invokes them after a deploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRecord {
    id: WorkflowId,
    name: String,
    definition: serde_json::Value,
    status: WorkflowStatus,
    remote_id: Option<RemoteWorkflowId>,
    deployed_at: Option<DateTime<Utc>>,
    last_sync_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl WorkflowRecord {
    /// Create a new draft record
    pub fn new(name: impl Into<String>, definition: serde_json::Value) -> Self {
        Self {
            id: WorkflowId::generate(),
            name: name.into(),
            definition,
            status: WorkflowStatus::Draft,
            remote_id: None,
            deployed_at: None,
            last_sync_at: None,
            updated_at: Utc::now(),
        }
    }

    // Getters

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &serde_json::Value {
        &self.definition
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn remote_id(&self) -> Option<&RemoteWorkflowId> {
        self.remote_id.as_ref()
    }

    pub fn deployed_at(&self) -> Option<DateTime<Utc>> {
        self.deployed_at
    }

    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_deployed(&self) -> bool {
        self.remote_id.is_some()
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Replace the definition of a record that has never been deployed (or
    /// is being edited in the error state). Post-deploy definitions change
    /// only through confirmed reconciliation.
    pub fn set_draft_definition(&mut self, definition: serde_json::Value) -> Result<(), DomainError> {
        if self.status == WorkflowStatus::Deployed {
            return Err(DomainError::validation(
                "Deployed workflow definitions change only through push or pull",
            ));
        }
        self.definition = definition;
        self.touch();
        Ok(())
    }

    /// Record a confirmed first deploy. Full overwrite from the engine's
    /// echoed response.
    pub fn record_deploy(&mut self, remote_id: RemoteWorkflowId, definition: serde_json::Value) {
        let now = Utc::now();
        self.remote_id = Some(remote_id);
        self.definition = definition;
        self.status = WorkflowStatus::Deployed;
        self.deployed_at = Some(now);
        self.last_sync_at = Some(now);
        self.updated_at = now;
    }

    /// Record a confirmed push or pull. Full overwrite, never a merge.
    pub fn record_sync(&mut self, definition: serde_json::Value) {
        let now = Utc::now();
        self.definition = definition;
        self.status = WorkflowStatus::Deployed;
        self.last_sync_at = Some(now);
        self.updated_at = now;
    }

    /// Record a failed sync or remediation cycle
    pub fn record_error(&mut self) {
        self.status = WorkflowStatus::Error;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_definition() -> serde_json::Value {
        json!({"nodes": [{"name": "Start", "type": "trigger"}], "connections": {}})
    }

    #[test]
    fn test_workflow_id_generate_and_parse() {
        let id = WorkflowId::generate();
        let reparsed = WorkflowId::parse(id.as_str()).unwrap();
        assert_eq!(id, reparsed);
    }

    #[test]
    fn test_workflow_id_parse_invalid() {
        assert!(WorkflowId::parse("not-a-uuid").is_err());
        assert!(WorkflowId::parse("").is_err());
    }

    #[test]
    fn test_new_record_is_draft() {
        let record = WorkflowRecord::new("Email digest", sample_definition());
        assert_eq!(record.status(), WorkflowStatus::Draft);
        assert!(record.remote_id().is_none());
        assert!(record.deployed_at().is_none());
        assert!(record.last_sync_at().is_none());
    }

    #[test]
    fn test_record_deploy_sets_remote_state() {
        let mut record = WorkflowRecord::new("Email digest", sample_definition());
        let echoed = json!({"id": "abc123", "name": "Email digest", "nodes": []});

        record.record_deploy(RemoteWorkflowId::new("abc123").unwrap(), echoed.clone());

        assert_eq!(record.status(), WorkflowStatus::Deployed);
        assert_eq!(record.remote_id().unwrap().as_str(), "abc123");
        assert_eq!(record.definition(), &echoed);
        assert!(record.deployed_at().is_some());
        assert!(record.last_sync_at().is_some());
    }

    #[test]
    fn test_record_sync_full_overwrite() {
        let mut record = WorkflowRecord::new("Email digest", sample_definition());
        record.record_deploy(RemoteWorkflowId::new("abc123").unwrap(), sample_definition());

        let remote_truth = json!({"nodes": [{"name": "Renamed"}]});
        record.record_sync(remote_truth.clone());

        // Exactly the remote body, not a merge with the prior definition.
        assert_eq!(record.definition(), &remote_truth);
        assert_eq!(record.status(), WorkflowStatus::Deployed);
    }

    #[test]
    fn test_record_error_keeps_remote_id() {
        let mut record = WorkflowRecord::new("Email digest", sample_definition());
        record.record_deploy(RemoteWorkflowId::new("abc123").unwrap(), sample_definition());
        record.record_error();

        assert_eq!(record.status(), WorkflowStatus::Error);
        // Invariant holds: remote_id set, status in {Deployed, Error}.
        assert!(record.remote_id().is_some());
    }

    #[test]
    fn test_draft_definition_rejected_after_deploy() {
        let mut record = WorkflowRecord::new("Email digest", sample_definition());
        record.record_deploy(RemoteWorkflowId::new("abc123").unwrap(), sample_definition());

        let result = record.set_draft_definition(json!({"nodes": []}));
        assert!(result.is_err());
    }

    #[test]
    fn test_record_serialization_round_trip() {
        let mut record = WorkflowRecord::new("Email digest", sample_definition());
        record.record_deploy(RemoteWorkflowId::new("abc123").unwrap(), sample_definition());

        let json = serde_json::to_string(&record).unwrap();
        let restored: WorkflowRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id(), record.id());
        assert_eq!(restored.status(), WorkflowStatus::Deployed);
        assert_eq!(restored.remote_id().unwrap().as_str(), "abc123");
    }
}
