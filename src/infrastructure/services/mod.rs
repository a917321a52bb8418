//! Service layer - reconciliation and remediation orchestration

pub mod remediation_service;
pub mod sync_service;

pub use remediation_service::{RemediationOutcome, RemediationService};
pub use sync_service::{SyncService, SYNC_DRIFT_COUNTER};
