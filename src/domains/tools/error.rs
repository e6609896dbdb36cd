//! Tool-specific error types.
//!
//! Handled business conditions become error content blocks; a `ToolError`
//! reaches the transport as a protocol-level fault.

use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Errors that escape a tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Arguments could not be read at all (e.g. not a JSON object).
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The server is deployed with a configuration the tool cannot run with.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The tool execution failed in a way no handler classifies.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }
}

impl From<ToolError> for McpError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::NotFound(_)
            | ToolError::InvalidArguments(_)
            | ToolError::Configuration(_) => McpError::invalid_params(e.to_string(), None),
            ToolError::ExecutionFailed(_) => McpError::internal_error(e.to_string(), None),
        }
    }
}
