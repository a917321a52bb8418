//! Node-scoped structural patches on opaque workflow definitions
//!
//! The definition is a generic JSON tree in the engine's native schema.
//! Patches never model node types; they apply one targeted, path-based
//! edit to the single implicated node and leave everything else untouched.

use serde_json::{json, Map, Value};

use super::{Classification, Diagnosis, RootCause};
use crate::domain::DomainError;

/// Defaults injected by patch rules, supplied by deployment configuration
#[derive(Debug, Clone)]
pub struct PatchConfig {
    /// Credential slot key on the node, e.g. `httpBasicAuth`
    pub credential_type: String,
    pub credential_name: String,
    pub credential_id: String,
    /// Bounded retry count for connection patches
    pub max_tries: u32,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            credential_type: "httpHeaderAuth".to_string(),
            credential_name: "Default credential".to_string(),
            credential_id: "default".to_string(),
            max_tries: 3,
        }
    }
}

/// Apply the patch rule for a classification to the implicated node.
///
/// Returns `UnrecognizedFailure` whenever no rule can produce a meaningful
/// edit - unknown root cause, no implicated node, node not present in the
/// definition, or a matching rule that finds nothing to change. In every
/// such case the input definition is left untouched; remediation never
/// guesses silently.
pub fn apply_patch(
    definition: &Value,
    classification: &Classification,
    config: &PatchConfig,
) -> Result<Diagnosis, DomainError> {
    if classification.root_cause == RootCause::Unrecognized {
        return Err(DomainError::unrecognized_failure(
            "No patch rule matches this failure",
        ));
    }

    let node_name = classification.affected_node.as_deref().ok_or_else(|| {
        DomainError::unrecognized_failure("Diagnostic does not name a node to patch")
    })?;

    let mut patched = definition.clone();
    let node = find_node_mut(&mut patched, node_name).ok_or_else(|| {
        DomainError::unrecognized_failure(format!(
            "Node \"{}\" is not present in the definition",
            node_name
        ))
    })?;

    let patch_description = match classification.root_cause {
        RootCause::MissingCredential => inject_credential(node, node_name, config)?,
        RootCause::MalformedExpression => fix_expressions(node, node_name)?,
        RootCause::MissingParameter => {
            let parameter = classification.missing_parameter.as_deref().ok_or_else(|| {
                DomainError::unrecognized_failure("Diagnostic does not name the missing parameter")
            })?;
            fill_parameter(node, node_name, parameter)?
        }
        RootCause::ConnectionFailure => enable_retry(node, node_name, config)?,
        RootCause::Unrecognized => unreachable!("handled above"),
    };

    Ok(Diagnosis {
        root_cause: classification.root_cause,
        affected_node: Some(node_name.to_string()),
        patch_description,
        patched_definition: patched,
    })
}

/// Locate a node by name in the definition's `nodes` array
fn find_node_mut<'a>(definition: &'a mut Value, name: &str) -> Option<&'a mut Map<String, Value>> {
    definition
        .get_mut("nodes")?
        .as_array_mut()?
        .iter_mut()
        .find(|n| n.get("name").and_then(|v| v.as_str()) == Some(name))?
        .as_object_mut()
}

fn inject_credential(
    node: &mut Map<String, Value>,
    node_name: &str,
    config: &PatchConfig,
) -> Result<String, DomainError> {
    let reference = json!({
        "id": config.credential_id,
        "name": config.credential_name,
    });

    let credentials = node
        .entry("credentials".to_string())
        .or_insert_with(|| json!({}));
    let credentials = credentials.as_object_mut().ok_or_else(|| {
        DomainError::unrecognized_failure(format!(
            "Node \"{}\" has a non-object credentials block",
            node_name
        ))
    })?;

    if credentials.get(&config.credential_type) == Some(&reference) {
        return Err(DomainError::unrecognized_failure(format!(
            "Node \"{}\" already references the default credential",
            node_name
        )));
    }

    credentials.insert(config.credential_type.clone(), reference);

    Ok(format!(
        "Injected default credential reference \"{}\" ({}) into node \"{}\"",
        config.credential_name, config.credential_type, node_name
    ))
}

/// Template strings must carry the leading `=` expression marker; a bare
/// `{{...}}` renders literally instead of evaluating.
fn fix_expressions(node: &mut Map<String, Value>, node_name: &str) -> Result<String, DomainError> {
    let fixed = match node.get_mut("parameters") {
        Some(parameters) => prefix_template_strings(parameters),
        None => 0,
    };

    if fixed == 0 {
        return Err(DomainError::unrecognized_failure(format!(
            "Node \"{}\" has no unmarked template expression to correct",
            node_name
        )));
    }

    Ok(format!(
        "Prefixed {} template expression(s) with the '=' marker on node \"{}\"",
        fixed, node_name
    ))
}

fn prefix_template_strings(value: &mut Value) -> usize {
    match value {
        Value::String(s) => {
            if s.contains("{{") && !s.starts_with('=') {
                *s = format!("={}", s);
                1
            } else {
                0
            }
        }
        Value::Array(items) => items.iter_mut().map(prefix_template_strings).sum(),
        Value::Object(map) => map.values_mut().map(prefix_template_strings).sum(),
        _ => 0,
    }
}

fn fill_parameter(
    node: &mut Map<String, Value>,
    node_name: &str,
    parameter: &str,
) -> Result<String, DomainError> {
    let parameters = node
        .entry("parameters".to_string())
        .or_insert_with(|| json!({}));
    let parameters = parameters.as_object_mut().ok_or_else(|| {
        DomainError::unrecognized_failure(format!(
            "Node \"{}\" has a non-object parameters block",
            node_name
        ))
    })?;

    let current = parameters.get(parameter);
    if current.is_some() && current != Some(&Value::Null) {
        return Err(DomainError::unrecognized_failure(format!(
            "Parameter \"{}\" on node \"{}\" is already set",
            parameter, node_name
        )));
    }

    parameters.insert(parameter.to_string(), json!(""));

    Ok(format!(
        "Filled required parameter \"{}\" on node \"{}\" with an empty default",
        parameter, node_name
    ))
}

fn enable_retry(
    node: &mut Map<String, Value>,
    node_name: &str,
    config: &PatchConfig,
) -> Result<String, DomainError> {
    if node.get("retryOnFail").and_then(|v| v.as_bool()) == Some(true) {
        return Err(DomainError::unrecognized_failure(format!(
            "Node \"{}\" already retries on failure",
            node_name
        )));
    }

    node.insert("retryOnFail".to_string(), json!(true));
    node.insert("maxTries".to_string(), json!(config.max_tries));

    Ok(format!(
        "Enabled bounded retry ({} tries) on node \"{}\"",
        config.max_tries, node_name
    ))
}
