//! Root-cause classification over diagnostic strings

use once_cell::sync::Lazy;
use regex::Regex;

use super::RootCause;

/// Extracts the node name from a `Node "<name>": ...` diagnostic prefix
static NODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^Node "([^"]+)""#).unwrap());

/// Captures a quoted parameter name from messages like
/// `Parameter "url" is required` or `The parameter "channel" is missing`
static PARAMETER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)parameter ["']([^"']+)["']|["']([^"']+)["'] (?:is required|is missing)"#)
        .unwrap()
});

/// Classification of one failing execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub root_cause: RootCause,
    /// Node the diagnostic names, when it names one
    pub affected_node: Option<String>,
    /// Required parameter the diagnostic names, for `MissingParameter`
    pub missing_parameter: Option<String>,
}

/// Classify a diagnostic string against the fixed root-cause taxonomy.
///
/// Pattern rules are checked in order of specificity; anything that matches
/// no rule is `Unrecognized` - remediation never guesses.
pub fn classify(diagnostic: &str) -> Classification {
    let affected_node = NODE_PREFIX
        .captures(diagnostic)
        .map(|caps| caps[1].to_string());

    let lower = diagnostic.to_lowercase();

    let (root_cause, missing_parameter) = if is_credential_failure(&lower) {
        (RootCause::MissingCredential, None)
    } else if is_connection_failure(&lower) {
        (RootCause::ConnectionFailure, None)
    } else if is_expression_failure(&lower) {
        (RootCause::MalformedExpression, None)
    } else if let Some(parameter) = missing_parameter_name(diagnostic, &lower) {
        (RootCause::MissingParameter, Some(parameter))
    } else {
        (RootCause::Unrecognized, None)
    };

    Classification {
        root_cause,
        affected_node,
        missing_parameter,
    }
}

fn is_credential_failure(lower: &str) -> bool {
    lower.contains("credential")
        || lower.contains("authorization failed")
        || lower.contains("unable to sign without access token")
}

fn is_connection_failure(lower: &str) -> bool {
    const MARKERS: &[&str] = &[
        "econnrefused",
        "etimedout",
        "enotfound",
        "ehostunreach",
        "getaddrinfo",
        "socket hang up",
        "timed out",
        "timeout exceeded",
        "could not connect",
        "connection refused",
        "unreachable",
    ];
    MARKERS.iter().any(|m| lower.contains(m))
}

fn is_expression_failure(lower: &str) -> bool {
    (lower.contains("expression") && (lower.contains("invalid") || lower.contains("error")))
        || lower.contains("unexpected token")
        || lower.contains("invalid syntax")
}

fn missing_parameter_name(diagnostic: &str, lower: &str) -> Option<String> {
    let mentions_missing = lower.contains("is required")
        || lower.contains("required parameter")
        || lower.contains("is missing")
        || lower.contains("must be provided");
    if !mentions_missing {
        return None;
    }

    PARAMETER_NAME.captures(diagnostic).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    })
}
