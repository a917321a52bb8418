//! Domain layer - Core entities, errors and the traits the seams mock at

pub mod credentials;
pub mod diagnosis;
pub mod engine;
pub mod error;
pub mod proposer;
pub mod user;
pub mod workflow;

pub use credentials::{CredentialResolver, EngineCredential};
pub use diagnosis::{Classification, Diagnosis, PatchConfig, RootCause};
pub use engine::{EngineClient, ExecutionRecord, RemoteWorkflow, RemoteWorkflowId};
pub use error::DomainError;
pub use proposer::DefinitionProposer;
pub use user::UserId;
pub use workflow::{WorkflowId, WorkflowRecord, WorkflowRepository, WorkflowStatus};
