//! Workflow Bridge
//!
//! Deploys AI-drafted workflow graphs to a remote execution engine and keeps
//! the local and remote copies convergent over repeated edit/deploy/sync
//! cycles:
//! - Typed client over the engine's REST API with per-user credentials
//! - Sync reconciler with an authoritative-response overwrite rule
//! - Best-effort error extraction over inconsistently-shaped run payloads
//! - Auto-remediation: diagnose a failing execution, patch the implicated
//!   node, redeploy

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use sqlx::postgres::PgPool;
use tracing::info;

use api::state::AppState;
use domain::{CredentialResolver, DefinitionProposer, PatchConfig, UserId, WorkflowRepository};
use infrastructure::credentials::{EnvCredentialResolver, PostgresCredentialResolver};
use infrastructure::engine::{HttpClient, HttpEngineClient};
use infrastructure::proposer::HttpDefinitionProposer;
use infrastructure::services::{RemediationService, SyncService};
use infrastructure::workflow::{InMemoryWorkflowRepository, PostgresWorkflowRepository};

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state for the configured backends
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let use_postgres_storage = config.storage.backend == "postgres";
    let use_postgres_credentials = config.credentials.backend == "postgres";

    info!(
        storage = %config.storage.backend,
        credentials = %config.credentials.backend,
        "Selected backends"
    );

    match (use_postgres_storage, use_postgres_credentials) {
        (true, true) => {
            let pool = connect_pool().await?;
            let repository = Arc::new(PostgresWorkflowRepository::new(pool.clone()));
            repository.ensure_table().await?;
            let resolver = Arc::new(PostgresCredentialResolver::new(pool));
            resolver.ensure_table().await?;
            Ok(build_state(repository, resolver, config))
        }
        (true, false) => {
            let pool = connect_pool().await?;
            let repository = Arc::new(PostgresWorkflowRepository::new(pool));
            repository.ensure_table().await?;
            Ok(build_state(repository, Arc::new(EnvCredentialResolver::new()), config))
        }
        (false, true) => {
            let pool = connect_pool().await?;
            let resolver = Arc::new(PostgresCredentialResolver::new(pool));
            resolver.ensure_table().await?;
            Ok(build_state(
                Arc::new(InMemoryWorkflowRepository::new()),
                resolver,
                config,
            ))
        }
        (false, false) => Ok(build_state(
            Arc::new(InMemoryWorkflowRepository::new()),
            Arc::new(EnvCredentialResolver::new()),
            config,
        )),
    }
}

async fn connect_pool() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

    info!("Connecting to PostgreSQL...");
    let pool = PgPool::connect(&database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
    info!("PostgreSQL connection established");

    Ok(pool)
}

fn build_state<R, Cr>(repository: Arc<R>, resolver: Arc<Cr>, config: &AppConfig) -> AppState
where
    R: WorkflowRepository + 'static,
    Cr: CredentialResolver + 'static,
{
    let engine = Arc::new(HttpEngineClient::new(HttpClient::new()));

    let patch_config = PatchConfig {
        credential_type: config.remediation.credential_type.clone(),
        credential_name: config.remediation.credential_name.clone(),
        credential_id: config.remediation.credential_id.clone(),
        max_tries: config.remediation.max_tries,
    };

    let sync_service = Arc::new(SyncService::new(
        repository.clone(),
        engine.clone(),
        resolver.clone(),
    ));
    let remediation_service = Arc::new(RemediationService::new(
        sync_service.clone(),
        repository.clone(),
        engine.clone(),
        resolver.clone(),
        patch_config,
    ));

    let definition_proposer = config.proposer.endpoint.as_ref().map(|endpoint| {
        Arc::new(HttpDefinitionProposer::new(HttpClient::new(), endpoint))
            as Arc<dyn DefinitionProposer>
    });

    AppState {
        sync_service,
        remediation_service,
        engine_client: engine,
        credential_resolver: resolver,
        workflow_repository: repository,
        definition_proposer,
        default_user: UserId::new(&config.identity.default_user),
    }
}
