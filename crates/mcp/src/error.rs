//! Error types for MCP server operations.

use crate::protocol::JsonRpcError;
use thiserror::Error;

pub type McpResult<T> = Result<T, McpError>;

/// MCP server error types
#[derive(Error, Debug)]
pub enum McpError {
    /// Message was not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Valid JSON, but not a JSON-RPC request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// Tool arguments or method params did not match the schema
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// JSON serialization error while building a response
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::Parse(_) => JsonRpcError::PARSE_ERROR,
            McpError::InvalidRequest(_) => JsonRpcError::INVALID_REQUEST,
            McpError::MethodNotFound(_) => JsonRpcError::METHOD_NOT_FOUND,
            McpError::ToolNotFound(_) | McpError::InvalidParams(_) => JsonRpcError::INVALID_PARAMS,
            McpError::Json(_) | McpError::Io(_) => JsonRpcError::INTERNAL_ERROR,
        }
    }
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        JsonRpcError::new(err.error_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(McpError::Parse("x".into()).error_code(), -32700);
        assert_eq!(McpError::MethodNotFound("x".into()).error_code(), -32601);
        assert_eq!(McpError::ToolNotFound("x".into()).error_code(), -32602);
        assert_eq!(McpError::InvalidParams("x".into()).error_code(), -32602);
    }

    #[test]
    fn test_into_json_rpc_error() {
        let error: JsonRpcError = McpError::ToolNotFound("identity-nope".into()).into();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("identity-nope"));
    }
}
