//! Content-block builders shared by tool handlers.

use chrono::Utc;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use tracing::warn;

pub const VALIDATION_ERROR: &str = "ValidationError";
pub const OPERATION_ERROR: &str = "OperationError";

/// Success block carrying `value` as JSON text plus structured content.
pub fn json_success<T: Serialize>(value: &T) -> CallToolResult {
    match serde_json::to_value(value) {
        Ok(structured) => CallToolResult {
            content: vec![Content::text(structured.to_string())],
            structured_content: Some(structured),
            is_error: Some(false),
            meta: None,
        },
        Err(e) => {
            warn!("Failed to serialize tool result: {}", e);
            operation_error("serialize", "Failed to serialize tool result")
        }
    }
}

/// Error block naming the parameter that failed validation.
pub fn validation_error(parameter: &str, message: &str) -> CallToolResult {
    error_block(serde_json::json!({
        "error": VALIDATION_ERROR,
        "parameter": parameter,
        "message": message,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Error block for an operation that could not complete.
pub fn operation_error(operation: &str, message: &str) -> CallToolResult {
    error_block(serde_json::json!({
        "error": OPERATION_ERROR,
        "operation": operation,
        "message": message,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

fn error_block(body: serde_json::Value) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(body.to_string())],
        structured_content: Some(body),
        is_error: Some(true),
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_block() {
        let result = validation_error("limit", "out of range");
        assert_eq!(result.is_error, Some(true));
        let body = result.structured_content.unwrap();
        assert_eq!(body["error"], VALIDATION_ERROR);
        assert_eq!(body["parameter"], "limit");
        assert_eq!(body["message"], "out of range");
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_operation_error_block() {
        let result = operation_error("search", "cancelled");
        let body = result.structured_content.unwrap();
        assert_eq!(body["error"], OPERATION_ERROR);
        assert_eq!(body["operation"], "search");
    }

    #[test]
    fn test_json_success_block() {
        let result = json_success(&serde_json::json!({"is_success": true}));
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.structured_content.unwrap()["is_success"], true);
    }
}
