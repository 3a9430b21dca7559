use bookeo_core::errors::{ErrorKind, QueryError};
use rmcp::model::CallToolResult;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Failure as reported to the calling agent.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[error("{kind:?}: {message}")]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    pub correlation_id: Uuid,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self { kind, message: message.into(), retryable, correlation_id: Uuid::new_v4() }
    }

    /// Maps a query failure and logs the internal detail under the new correlation id.
    pub fn from_query(tool: &str, error: &QueryError) -> Self {
        let tool_error = Self::new(error.kind(), error.user_message(), error.is_retryable());
        warn!(
            event_name = "mcp.tool.failed",
            correlation_id = %tool_error.correlation_id,
            tool,
            kind = tool_error.kind.as_str(),
            retryable = tool_error.retryable,
            error = %error,
            "tool call failed"
        );
        tool_error
    }

    /// Tool arguments that do not match the advertised input schema.
    pub fn invalid_arguments(tool: &str, error: &serde_json::Error) -> Self {
        let tool_error =
            Self::new(ErrorKind::Validation, format!("invalid arguments: {error}"), false);
        warn!(
            event_name = "mcp.tool.failed",
            correlation_id = %tool_error.correlation_id,
            tool,
            kind = tool_error.kind.as_str(),
            error = %error,
            "tool arguments rejected"
        );
        tool_error
    }

    pub fn unexpected(tool: &str, detail: impl std::fmt::Display) -> Self {
        let tool_error = Self::new(
            ErrorKind::Unexpected,
            "The tool could not render its result.",
            false,
        );
        warn!(
            event_name = "mcp.tool.failed",
            correlation_id = %tool_error.correlation_id,
            tool,
            kind = tool_error.kind.as_str(),
            error = %detail,
            "tool result could not be serialized"
        );
        tool_error
    }

    pub fn into_call_tool_result(self) -> CallToolResult {
        CallToolResult::structured_error(json!({ "error": self }))
    }
}
