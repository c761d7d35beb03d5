//! Error types for the MCP server.

use thiserror::Error;

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur in the MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// No usable connection or credential information.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The MongoDB server could not be reached when acquiring a handle.
    #[error("Failed to connect to MongoDB: {0}")]
    Connection(String),

    /// A MongoDB operation failed after the connection was established.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Alibaba Cloud OpenAPI returned an error response.
    #[error("OpenAPI {action} failed: [{code}] {message}")]
    OpenApi {
        /// The API action that was called
        action: String,
        /// Error code from the response body
        code: String,
        /// Error message from the response body
        message: String,
    },

    /// Transport failure talking to an OpenAPI endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Unknown tool name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Missing required argument.
    #[error("Missing required argument: {0}")]
    MissingArg(String),

    /// Invalid argument value.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// JSON serialization or parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error on the transport.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// JSON-RPC error code for this error when it escapes as a protocol error.
    pub fn code(&self) -> i64 {
        match self {
            // MCP reports an unknown tool name as invalid params
            McpError::UnknownTool(_) | McpError::MissingArg(_) | McpError::InvalidArg { .. } => {
                -32602
            }
            McpError::Json(_) => -32700,
            _ => -32603,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_message_keeps_cause() {
        let err = McpError::Connection("No servers available".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to connect to MongoDB: No servers available"
        );
    }

    #[test]
    fn test_openapi_error_message() {
        let err = McpError::OpenApi {
            action: "DescribeVpcs".to_string(),
            code: "Forbidden.RAM".to_string(),
            message: "User not authorized".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "OpenAPI DescribeVpcs failed: [Forbidden.RAM] User not authorized"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(McpError::UnknownTool("x".into()).code(), -32602);
        assert_eq!(McpError::MissingArg("x".into()).code(), -32602);
        assert_eq!(McpError::Internal("x".into()).code(), -32603);
    }
}
