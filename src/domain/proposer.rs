//! Text-to-graph proposal boundary

use async_trait::async_trait;

use crate::domain::DomainError;

/// Opaque function that turns a natural-language description into an
/// engine-native workflow definition. Consumed as a black box; the
/// reconciliation core never inspects how the graph was produced.
#[async_trait]
pub trait DefinitionProposer: Send + Sync + std::fmt::Debug {
    async fn propose(&self, description: &str) -> Result<serde_json::Value, DomainError>;
}
