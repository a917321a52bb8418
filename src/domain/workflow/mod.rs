//! Workflow record domain types

pub mod entity;
pub mod repository;

pub use entity::{WorkflowId, WorkflowRecord, WorkflowStatus};
pub use repository::WorkflowRepository;
