// MCP (Model Context Protocol) server for identity claims.
// Exposes the claim tools to agent clients over any JSON-RPC transport.

pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::{McpError, McpResult};
pub use server::McpServer;
pub use tools::{identity_tools, ToolRegistry};
