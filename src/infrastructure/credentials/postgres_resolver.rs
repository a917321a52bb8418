//! Per-user engine credentials stored in PostgreSQL

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::{CredentialResolver, DomainError, EngineCredential, UserId};

/// Credential resolver reading one row per user.
///
/// Queried on every call by design - no cache layer - so key rotation in
/// the table takes effect on the next engine operation without a restart.
pub struct PostgresCredentialResolver {
    pool: PgPool,
    table_name: String,
}

impl std::fmt::Debug for PostgresCredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCredentialResolver")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl PostgresCredentialResolver {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table_name: "engine_credentials".to_string(),
        }
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Ensures the credentials table exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                user_id VARCHAR(255) PRIMARY KEY,
                base_url TEXT NOT NULL,
                api_key TEXT NOT NULL,
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
}

#[async_trait]
impl CredentialResolver for PostgresCredentialResolver {
    async fn resolve(&self, user_id: &UserId) -> Result<Option<EngineCredential>, DomainError> {
        let query = format!(
            "SELECT base_url, api_key FROM {} WHERE user_id = $1",
            self.table_name
        );

        let row = sqlx::query(&query)
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::persistence(format!("Credential lookup failed: {}", e)))?;

        Ok(row.map(|row| {
            let base_url: String = row.get("base_url");
            let api_key: String = row.get("api_key");
            EngineCredential::new(base_url, api_key)
        }))
    }
}
