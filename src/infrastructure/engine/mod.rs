//! Remote engine client implementation

pub mod client;
pub mod http_client;

pub use client::{HttpEngineClient, MAX_FAILING_EXECUTIONS};
pub use http_client::{HttpClient, HttpClientTrait};
