// General application information tool

use crate::error::McpResult;
use crate::protocol::{CallToolResult, ToolAnnotations, ToolContent, ToolSchema};
use crate::tools::registry::{json_schema_object, Tool};
use identity_mcp_core::dto::AppVersionDto;

pub const GET_APP_VERSION: &str = "general-get_app_version";

/// Reported when no version is configured
pub const UNKNOWN_VERSION: &str = "?.?";

/// Tool reporting the configured application version and the current clock
pub struct AppVersionTool {
    version: String,
}

impl AppVersionTool {
    pub fn new(version: Option<String>) -> Self {
        let version = version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string());
        Self { version }
    }
}

#[async_trait::async_trait]
impl Tool for AppVersionTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: GET_APP_VERSION.to_string(),
            description: "Returns the current application version, local time, UTC time, and UTC ticks as a JSON object.".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), vec![]),
            annotations: Some(ToolAnnotations::read_only()),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> McpResult<CallToolResult> {
        let structured = serde_json::to_value(AppVersionDto::now(self.version.clone()))?;
        Ok(CallToolResult {
            content: vec![ToolContent::text(serde_json::to_string(&structured)?)],
            structured_content: Some(structured),
            is_error: Some(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_configured_version() {
        let tool = AppVersionTool::new(Some("1.4.2".to_string()));
        let result = tool.execute(serde_json::Value::Null).await.unwrap();

        let body = result.structured_content.unwrap();
        assert_eq!(body["appVersion"], "1.4.2");
        assert!(body["appUtcTicks"].as_i64().unwrap() > 0);
        assert!(body["appNowUtc"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_missing_version_placeholder() {
        let tool = AppVersionTool::new(None);
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert_eq!(result.structured_content.unwrap()["appVersion"], UNKNOWN_VERSION);
    }
}
