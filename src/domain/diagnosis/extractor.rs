//! Best-effort diagnostic extraction from execution payloads
//!
//! Engine versions and node types nest error detail differently, and some
//! paths legitimately hold non-string, empty, or absent data. Rather than
//! one deep conditional, extraction runs an ordered list of independent
//! candidate probes; adding a newly observed shape is a one-line addition
//! to the list.

use serde_json::Value;

use crate::domain::engine::ExecutionRecord;

type Candidate = fn(&ExecutionRecord) -> Option<String>;

/// Ordered by diagnostic value: node-level errors are the most actionable,
/// then the historical top-level locations, then a node reference alone.
const CANDIDATES: &[Candidate] = &[
    node_run_error,
    result_error_message,
    result_error_string,
    top_level_error_message,
    top_level_error_string,
    last_node_error_object,
];

/// Extract the single best human-readable diagnostic for an execution.
///
/// Total: tolerates any payload shape, never panics, never returns an
/// empty string - callers render the result directly.
pub fn extract_error_message(execution: &ExecutionRecord) -> String {
    for candidate in CANDIDATES {
        if let Some(message) = candidate(execution) {
            let trimmed = message.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }

    fallback_message(execution)
}

/// First node in run-data iteration order with a populated error entry.
fn node_run_error(execution: &ExecutionRecord) -> Option<String> {
    let run_data = execution
        .data
        .get("resultData")?
        .get("runData")?
        .as_object()?;

    for (node_name, runs) in run_data {
        let Some(runs) = runs.as_array() else {
            continue;
        };
        for run in runs {
            let Some(error) = run.get("error") else {
                continue;
            };
            if error.is_null() {
                continue;
            }
            if let Some(message) = error_text(error) {
                return Some(format!("Node \"{}\": {}", node_name, message));
            }
        }
    }

    None
}

fn result_error_message(execution: &ExecutionRecord) -> Option<String> {
    nested_str(&execution.data, &["resultData", "error", "message"])
}

fn result_error_string(execution: &ExecutionRecord) -> Option<String> {
    nested_str(&execution.data, &["resultData", "error"])
}

fn top_level_error_message(execution: &ExecutionRecord) -> Option<String> {
    let error = execution.extra.get("error")?;
    error.get("message")?.as_str().map(str::to_string)
}

fn top_level_error_string(execution: &ExecutionRecord) -> Option<String> {
    execution.extra.get("error")?.as_str().map(str::to_string)
}

/// An error object with no usable message, attributed to the last node the
/// engine reports having executed.
fn last_node_error_object(execution: &ExecutionRecord) -> Option<String> {
    let node = nested_str(&execution.data, &["resultData", "lastNodeExecuted"])?;
    let error = execution.data.get("resultData")?.get("error")?;
    if !error.is_object() {
        return None;
    }
    Some(format!(
        "Node \"{}\": {}",
        node,
        serde_json::to_string(error).unwrap_or_else(|_| "unknown error".to_string())
    ))
}

fn fallback_message(execution: &ExecutionRecord) -> String {
    let status = if execution.status.trim().is_empty() {
        "failed"
    } else {
        execution.status.as_str()
    };

    match nested_str(&execution.data, &["resultData", "lastNodeExecuted"]) {
        Some(node) => format!(
            "Execution {} at {} - No detailed error message available",
            status, node
        ),
        None => format!("Execution {} - No detailed error message available", status),
    }
}

/// Message string if present, otherwise the stringified error value.
fn error_text(error: &Value) -> Option<String> {
    if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
        if !message.trim().is_empty() {
            return Some(message.to_string());
        }
    }
    if let Some(description) = error.get("description").and_then(|d| d.as_str()) {
        if !description.trim().is_empty() {
            return Some(description.to_string());
        }
    }
    if let Some(text) = error.as_str() {
        if !text.trim().is_empty() {
            return Some(text.to_string());
        }
        return None;
    }
    serde_json::to_string(error).ok()
}

fn nested_str(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    let text = current.as_str()?;
    if text.trim().is_empty() {
        return None;
    }
    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn execution(status: &str, data: Value) -> ExecutionRecord {
        serde_json::from_value(json!({
            "id": "1",
            "status": status,
            "data": data,
        }))
        .unwrap()
    }

    #[test]
    fn test_node_level_error_with_message() {
        let execution = execution(
            "error",
            json!({
                "resultData": {
                    "runData": {
                        "Send Email": [{"error": {"message": "Invalid recipient"}}]
                    }
                }
            }),
        );

        assert_eq!(
            extract_error_message(&execution),
            "Node \"Send Email\": Invalid recipient"
        );
    }

    #[test]
    fn test_node_level_error_beats_top_level() {
        let mut execution = execution(
            "error",
            json!({
                "resultData": {
                    "runData": {
                        "nodeA": [{"error": {"message": "node-level detail"}}]
                    },
                    "error": {"message": "top-level detail"}
                }
            }),
        );
        execution.extra.insert(
            "error".to_string(),
            json!({"message": "outermost detail"}),
        );

        let message = extract_error_message(&execution);
        assert!(message.contains("nodeA"));
        assert!(message.contains("node-level detail"));
    }

    #[test]
    fn test_node_error_without_message_is_stringified() {
        let execution = execution(
            "error",
            json!({
                "resultData": {
                    "runData": {
                        "HTTP Request": [{"error": {"httpCode": 500}}]
                    }
                }
            }),
        );

        let message = extract_error_message(&execution);
        assert!(message.starts_with("Node \"HTTP Request\":"));
        assert!(message.contains("httpCode"));
    }

    #[test]
    fn test_null_node_error_skipped() {
        let execution = execution(
            "error",
            json!({
                "resultData": {
                    "runData": {
                        "Healthy": [{"error": null}],
                        "Broken": [{"error": {"message": "boom"}}]
                    }
                }
            }),
        );

        assert_eq!(extract_error_message(&execution), "Node \"Broken\": boom");
    }

    #[test]
    fn test_result_error_message_location() {
        let execution = execution(
            "error",
            json!({"resultData": {"error": {"message": "  Workflow could not start  "}}}),
        );

        assert_eq!(extract_error_message(&execution), "Workflow could not start");
    }

    #[test]
    fn test_result_error_plain_string() {
        let execution = execution("error", json!({"resultData": {"error": "timed out"}}));
        assert_eq!(extract_error_message(&execution), "timed out");
    }

    #[test]
    fn test_top_level_error_locations() {
        let mut record = execution("error", json!({}));
        record
            .extra
            .insert("error".to_string(), json!({"message": "engine exploded"}));
        assert_eq!(extract_error_message(&record), "engine exploded");

        let mut record = execution("error", json!({}));
        record
            .extra
            .insert("error".to_string(), json!("bare string error"));
        assert_eq!(extract_error_message(&record), "bare string error");
    }

    #[test]
    fn test_last_node_error_object() {
        let execution = execution(
            "error",
            json!({
                "resultData": {
                    "lastNodeExecuted": "Webhook",
                    "error": {"code": 404}
                }
            }),
        );

        let message = extract_error_message(&execution);
        assert!(message.starts_with("Node \"Webhook\":"));
        assert!(message.contains("404"));
    }

    #[test]
    fn test_fallback_with_last_node() {
        let execution = execution(
            "crashed",
            json!({"resultData": {"lastNodeExecuted": "Set Fields"}}),
        );

        assert_eq!(
            extract_error_message(&execution),
            "Execution crashed at Set Fields - No detailed error message available"
        );
    }

    #[test]
    fn test_fallback_without_any_detail() {
        let execution = execution("error", json!({}));
        assert_eq!(
            extract_error_message(&execution),
            "Execution error - No detailed error message available"
        );
    }

    #[test]
    fn test_totality_on_malformed_shapes() {
        // Shapes that historically crashed naive extractors: non-object
        // runData, runs that are not arrays, errors that are numbers.
        let cases = vec![
            json!({"resultData": {"runData": "not-an-object"}}),
            json!({"resultData": {"runData": {"n": "not-an-array"}}}),
            json!({"resultData": {"runData": {"n": [{"error": 42}]}}}),
            json!({"resultData": null}),
            json!(null),
            json!([1, 2, 3]),
        ];

        for data in cases {
            let record = execution("error", data);
            let message = extract_error_message(&record);
            assert!(!message.is_empty());
        }
    }

    #[test]
    fn test_empty_strings_never_returned() {
        let execution = execution(
            "error",
            json!({
                "resultData": {
                    "error": {"message": "   "},
                }
            }),
        );

        let message = extract_error_message(&execution);
        assert!(!message.trim().is_empty());
        assert!(message.contains("No detailed error message available"));
    }
}
