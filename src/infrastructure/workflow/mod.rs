//! Workflow record persistence backends

pub mod in_memory_repository;
pub mod postgres_repository;

pub use in_memory_repository::InMemoryWorkflowRepository;
pub use postgres_repository::PostgresWorkflowRepository;
