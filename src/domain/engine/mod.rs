//! Remote engine boundary - typed request/response contract

pub mod client;
pub mod remote;

pub use client::EngineClient;
pub use remote::{ExecutionRecord, RemoteWorkflow, RemoteWorkflowId};
