//! PostgreSQL workflow repository
//!
//! Records are stored as JSONB rows keyed by the local id, with the remote
//! id denormalized into its own column for reverse lookup. Every update is
//! a single-row upsert, which gives the reconciler its atomic full-replace.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::{
    DomainError, RemoteWorkflowId, WorkflowId, WorkflowRecord, WorkflowRepository,
};

pub struct PostgresWorkflowRepository {
    pool: PgPool,
    table_name: String,
}

impl std::fmt::Debug for PostgresWorkflowRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresWorkflowRepository")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl PostgresWorkflowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table_name: "workflow_records".to_string(),
        }
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Ensures the records table exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id VARCHAR(255) PRIMARY KEY,
                remote_id VARCHAR(255),
                data JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table_name
        );

        sqlx::query(&query)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::persistence(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    fn serialize(record: &WorkflowRecord) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(record)
            .map_err(|e| DomainError::persistence(format!("Failed to serialize record: {}", e)))
    }

    fn deserialize(data: serde_json::Value) -> Result<WorkflowRecord, DomainError> {
        serde_json::from_value(data)
            .map_err(|e| DomainError::persistence(format!("Failed to deserialize record: {}", e)))
    }
}

#[async_trait]
impl WorkflowRepository for PostgresWorkflowRepository {
    async fn get(&self, id: &WorkflowId) -> Result<Option<WorkflowRecord>, DomainError> {
        let query = format!("SELECT data FROM {} WHERE id = $1", self.table_name);

        let row = sqlx::query(&query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::persistence(format!("Failed to get record: {}", e)))?;

        row.map(|row| Self::deserialize(row.get("data"))).transpose()
    }

    async fn get_by_remote_id(
        &self,
        remote_id: &RemoteWorkflowId,
    ) -> Result<Option<WorkflowRecord>, DomainError> {
        let query = format!("SELECT data FROM {} WHERE remote_id = $1", self.table_name);

        let row = sqlx::query(&query)
            .bind(remote_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::persistence(format!("Failed to get record: {}", e)))?;

        row.map(|row| Self::deserialize(row.get("data"))).transpose()
    }

    async fn list(&self) -> Result<Vec<WorkflowRecord>, DomainError> {
        let query = format!("SELECT data FROM {} ORDER BY updated_at DESC", self.table_name);

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::persistence(format!("Failed to list records: {}", e)))?;

        rows.into_iter()
            .map(|row| Self::deserialize(row.get("data")))
            .collect()
    }

    async fn create(&self, record: WorkflowRecord) -> Result<WorkflowRecord, DomainError> {
        let query = format!(
            "INSERT INTO {} (id, remote_id, data, updated_at) VALUES ($1, $2, $3, NOW())",
            self.table_name
        );

        let data = Self::serialize(&record)?;
        let result = sqlx::query(&query)
            .bind(record.id().as_str())
            .bind(record.remote_id().map(|r| r.as_str()))
            .bind(data)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(record),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                DomainError::validation(format!("Workflow '{}' already exists", record.id())),
            ),
            Err(e) => Err(DomainError::persistence(format!(
                "Failed to create record: {}",
                e
            ))),
        }
    }

    async fn update(&self, record: WorkflowRecord) -> Result<WorkflowRecord, DomainError> {
        let query = format!(
            "UPDATE {} SET remote_id = $2, data = $3, updated_at = NOW() WHERE id = $1",
            self.table_name
        );

        let data = Self::serialize(&record)?;
        let result = sqlx::query(&query)
            .bind(record.id().as_str())
            .bind(record.remote_id().map(|r| r.as_str()))
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::persistence(format!("Failed to update record: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Workflow '{}' not found",
                record.id()
            )));
        }

        Ok(record)
    }

    async fn delete(&self, id: &WorkflowId) -> Result<bool, DomainError> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.table_name);

        let result = sqlx::query(&query)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::persistence(format!("Failed to delete record: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
