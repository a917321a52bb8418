//! In-memory workflow repository for development and tests

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{
    DomainError, RemoteWorkflowId, WorkflowId, WorkflowRecord, WorkflowRepository,
};

/// Thread-safe in-memory repository
#[derive(Debug, Default)]
pub struct InMemoryWorkflowRepository {
    records: RwLock<HashMap<String, WorkflowRecord>>,
}

impl InMemoryWorkflowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn get(&self, id: &WorkflowId) -> Result<Option<WorkflowRecord>, DomainError> {
        let records = self
            .records
            .read()
            .map_err(|_| DomainError::persistence("Repository lock poisoned"))?;
        Ok(records.get(id.as_str()).cloned())
    }

    async fn get_by_remote_id(
        &self,
        remote_id: &RemoteWorkflowId,
    ) -> Result<Option<WorkflowRecord>, DomainError> {
        let records = self
            .records
            .read()
            .map_err(|_| DomainError::persistence("Repository lock poisoned"))?;
        Ok(records
            .values()
            .find(|r| r.remote_id() == Some(remote_id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<WorkflowRecord>, DomainError> {
        let records = self
            .records
            .read()
            .map_err(|_| DomainError::persistence("Repository lock poisoned"))?;
        Ok(records.values().cloned().collect())
    }

    async fn create(&self, record: WorkflowRecord) -> Result<WorkflowRecord, DomainError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DomainError::persistence("Repository lock poisoned"))?;

        if records.contains_key(record.id().as_str()) {
            return Err(DomainError::validation(format!(
                "Workflow '{}' already exists",
                record.id()
            )));
        }

        records.insert(record.id().as_str().to_string(), record.clone());
        Ok(record)
    }

    async fn update(&self, record: WorkflowRecord) -> Result<WorkflowRecord, DomainError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DomainError::persistence("Repository lock poisoned"))?;

        if !records.contains_key(record.id().as_str()) {
            return Err(DomainError::not_found(format!(
                "Workflow '{}' not found",
                record.id()
            )));
        }

        records.insert(record.id().as_str().to_string(), record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &WorkflowId) -> Result<bool, DomainError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DomainError::persistence("Repository lock poisoned"))?;
        Ok(records.remove(id.as_str()).is_some())
    }
}
