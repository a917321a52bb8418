//! Types for data owned by the remote execution engine

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::DomainError;

/// Identifier assigned by the remote engine. Format is engine-owned; the
/// only local requirement is non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteWorkflowId(String);

impl RemoteWorkflowId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::validation("Remote workflow id cannot be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RemoteWorkflowId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RemoteWorkflowId> for String {
    fn from(id: RemoteWorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for RemoteWorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A workflow as the remote engine reports it.
///
/// `definition` is the engine's full echoed body for the workflow - the
/// single source of truth for what actually runs. Local state is only ever
/// overwritten from this, never from the payload a caller sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteWorkflow {
    pub id: RemoteWorkflowId,
    pub name: String,
    pub active: bool,
    pub definition: serde_json::Value,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RemoteWorkflow {
    /// Build from the engine's response body. The body itself becomes the
    /// authoritative definition.
    pub fn from_response(body: serde_json::Value) -> Result<Self, DomainError> {
        let id = body
            .get("id")
            .and_then(value_as_id_string)
            .ok_or_else(|| {
                DomainError::remote_rejected("Engine response has no workflow id")
            })?;

        let name = body
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let active = body.get("active").and_then(|v| v.as_bool()).unwrap_or(false);

        let updated_at = body
            .get("updatedAt")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Self {
            id: RemoteWorkflowId::new(id)?,
            name,
            active,
            definition: body,
            updated_at,
        })
    }
}

/// One run of a deployed workflow, as logged by the remote engine.
///
/// The error payload shape is not contractually stable across engine
/// versions, so everything beyond the identity fields is kept opaque:
/// `data` holds the nested run detail and unknown top-level fields land in
/// `extra` instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub workflow_id: Option<String>,

    /// Engine-owned vocabulary; only `error` has meaning to this core.
    pub status: String,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub stopped_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExecutionRecord {
    pub const STATUS_ERROR: &'static str = "error";

    pub fn is_error(&self) -> bool {
        self.status == Self::STATUS_ERROR
    }
}

/// Engines have been observed returning ids as either strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    value_as_id_string(&value)
        .ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_id_string))
}

fn value_as_id_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
