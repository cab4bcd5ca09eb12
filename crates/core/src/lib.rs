// Core types and functionality for the identity claims MCP server

pub mod client;
pub mod dto;
pub mod result;
pub mod types;
pub mod validation;

pub use client::ClaimClient;
pub use result::{ToolError, ToolResult, ToolStatus};
pub use types::*;
