pub mod app_info;
pub mod claims;
mod registry;

pub use app_info::AppVersionTool;
pub use claims::{
    register_claim_tools, CreateClaimTool, DeleteClaimTool, GetClaimDetailsTool, GetClaimsTool,
    UpdateClaimTool,
};
pub use registry::{
    envelope, json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string,
    json_schema_string_map, parse_arguments, Tool, ToolRegistry,
};

use identity_mcp_core::ClaimClient;
use std::sync::Arc;

/// Registry with every tool the identity server exposes
pub fn identity_tools(client: Arc<dyn ClaimClient>, app_version: Option<String>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_claim_tools(&mut registry, client);
    registry.register(Arc::new(AppVersionTool::new(app_version)));
    registry
}
