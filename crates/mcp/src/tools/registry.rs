// MCP tool trait, registry and shared helpers

use crate::error::{McpError, McpResult};
use crate::protocol::{CallToolResult, ToolContent, ToolSchema};
use identity_mcp_core::ToolResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments.
    ///
    /// Domain failures are reported inside the result envelope; `Err` is
    /// reserved for arguments that cannot be decoded at all.
    async fn execute(&self, arguments: serde_json::Value) -> McpResult<CallToolResult>;
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, ordered by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up and run a tool
    pub async fn call(&self, name: &str, arguments: serde_json::Value) -> McpResult<CallToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))?;
        tool.execute(arguments).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode tool arguments. Missing arguments decode like an empty object.
pub fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: serde_json::Value) -> McpResult<T> {
    let arguments = if arguments.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| McpError::InvalidParams(format!("Invalid arguments for {tool}: {e}")))
}

/// Render an envelope as a tool result: JSON text plus structured content.
/// `isError` mirrors `!isSuccess`.
pub fn envelope<T: Serialize>(result: &ToolResult<T>) -> McpResult<CallToolResult> {
    let structured = serde_json::to_value(result)?;
    Ok(CallToolResult {
        content: vec![ToolContent::text(serde_json::to_string(&structured)?)],
        structured_content: Some(structured),
        is_error: Some(!result.is_success()),
    })
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_string_map(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "additionalProperties": { "type": "string" },
        "description": description
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".to_string(),
                description: "Echo the input".to_string(),
                input_schema: json_schema_object(serde_json::json!({}), vec![]),
                annotations: None,
            }
        }

        async fn execute(&self, arguments: serde_json::Value) -> McpResult<CallToolResult> {
            envelope(&ToolResult::success(arguments))
        }
    }

    #[derive(Debug, Deserialize)]
    struct Args {
        #[serde(default)]
        name: String,
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.call("missing", serde_json::Value::Null).await.unwrap_err();
        assert!(matches!(err, McpError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_call_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert!(registry.contains("echo"));

        let result = registry.call("echo", serde_json::json!({"a": 1})).await.unwrap();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.structured_content.unwrap()["value"]["a"], 1);
    }

    #[test]
    fn test_parse_null_arguments_as_empty_object() {
        let args: Args = parse_arguments("test", serde_json::Value::Null).unwrap();
        assert_eq!(args.name, "");
    }

    #[test]
    fn test_parse_mistyped_arguments() {
        let err = parse_arguments::<Args>("test", serde_json::json!({"name": 5})).unwrap_err();
        assert_eq!(err.error_code(), -32602);
    }

    #[test]
    fn test_envelope_marks_failures_as_errors() {
        let result = envelope(&ToolResult::<()>::warning("Claim not found")).unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(result.text().unwrap().contains("Claim not found"));
    }
}
