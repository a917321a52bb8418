//! Failure diagnosis for remote executions
//!
//! Three pure stages: extract the best diagnostic string from an
//! inconsistently-shaped execution payload, classify it against a fixed
//! root-cause taxonomy, and apply a node-scoped patch to the opaque
//! definition tree.

pub mod classifier;
pub mod extractor;
pub mod patcher;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use classifier::{classify, Classification};
pub use extractor::extract_error_message;
pub use patcher::{apply_patch, PatchConfig};

/// Fixed root-cause taxonomy for failed executions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootCause {
    /// A node references a credential that is missing or invalid
    MissingCredential,
    /// A node parameter holds a template expression with broken syntax
    MalformedExpression,
    /// A required node parameter is absent
    MissingParameter,
    /// The node's target endpoint is unreachable or misconfigured
    ConnectionFailure,
    /// No pattern rule matched; remediation must not guess
    Unrecognized,
}

impl fmt::Display for RootCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "missing_credential"),
            Self::MalformedExpression => write!(f, "malformed_expression"),
            Self::MissingParameter => write!(f, "missing_parameter"),
            Self::ConnectionFailure => write!(f, "connection_failure"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Result of one diagnose-and-patch pass. Ephemeral - only the patched
/// definition and the redeploy outcome survive into the workflow record.
#[derive(Debug, Clone)]
pub struct Diagnosis {
    pub root_cause: RootCause,
    pub affected_node: Option<String>,
    pub patch_description: String,
    pub patched_definition: serde_json::Value,
}
