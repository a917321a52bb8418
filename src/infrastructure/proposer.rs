//! HTTP-backed definition proposer
//!
//! Thin adapter over the external text-to-graph service. The proposal
//! endpoint takes `{"prompt": ...}` and answers `{"definition": {...}}`;
//! everything about how the graph is produced stays behind that contract.

use async_trait::async_trait;
use serde_json::json;

use super::engine::HttpClientTrait;
use crate::domain::{DefinitionProposer, DomainError};

#[derive(Debug)]
pub struct HttpDefinitionProposer<C: HttpClientTrait> {
    client: C,
    endpoint: String,
}

impl<C: HttpClientTrait> HttpDefinitionProposer<C> {
    pub fn new(client: C, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> DefinitionProposer for HttpDefinitionProposer<C> {
    async fn propose(&self, description: &str) -> Result<serde_json::Value, DomainError> {
        let body = json!({"prompt": description});
        let response = self
            .client
            .post_json(&self.endpoint, vec![("Accept", "application/json")], &body)
            .await?;

        response
            .get("definition")
            .cloned()
            .filter(|d| d.is_object())
            .ok_or_else(|| {
                DomainError::internal("Proposal service returned no workflow definition")
            })
    }
}
