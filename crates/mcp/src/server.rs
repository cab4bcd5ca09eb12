//! MCP request dispatcher and stdio transport.

use crate::error::{McpError, McpResult};
use crate::protocol::*;
use crate::tools::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

pub const DEFAULT_INSTRUCTIONS: &str = "Manage identity claims.";

/// Longest stdio message accepted; longer lines are skipped
pub const MAX_MESSAGE_LENGTH: usize = 4 * 1024 * 1024;

/// Transport-independent MCP server: turns JSON-RPC messages into responses.
#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
    instructions: String,
    max_message_length: usize,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, info: ServerInfo) -> Self {
        Self {
            registry: Arc::new(registry),
            info,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            max_message_length: MAX_MESSAGE_LENGTH,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_max_message_length(mut self, max: usize) -> Self {
        self.max_message_length = max;
        self
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw message. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Unparseable MCP message");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    McpError::Parse(e.to_string()).into(),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                id,
                McpError::InvalidRequest(e.to_string()).into(),
            )),
        }
    }

    /// Handle one decoded request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let JsonRpcRequest {
            jsonrpc,
            id,
            method,
            params,
        } = request;

        let Some(id) = id else {
            debug!(method = %method, "MCP notification");
            return None;
        };

        if jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                McpError::InvalidRequest(format!("unsupported jsonrpc version {jsonrpc}")).into(),
            ));
        }

        debug!(method = %method, "MCP request");
        let response = match self.dispatch(&method, params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                warn!(method = %method, code = e.error_code(), error = %e, "MCP request failed");
                JsonRpcResponse::error(id, e.into())
            }
        };
        Some(response)
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> McpResult<Value> {
        match method {
            "initialize" => self.initialize(params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(serde_json::to_value(ListToolsResult {
                tools: self.registry.list_schemas(),
            })?),
            "tools/call" => self.call_tool(params).await,
            other => Err(McpError::MethodNotFound(other.to_string())),
        }
    }

    fn initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let params: InitializeParams = match params {
            Some(params) => serde_json::from_value(params)
                .map_err(|e| McpError::InvalidParams(e.to_string()))?,
            None => InitializeParams::default(),
        };

        let protocol_version = params
            .protocol_version
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(&v.as_str()))
            .unwrap_or_else(|| MCP_PROTOCOL_VERSION.to_string());

        if let Some(client) = &params.client_info {
            info!(client = %client.name, version = %client.version, protocol = %protocol_version, "MCP client initialized");
        }

        Ok(serde_json::to_value(InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.info.clone(),
            instructions: Some(self.instructions.clone()),
        })?)
    }

    async fn call_tool(&self, params: Option<Value>) -> McpResult<Value> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| McpError::InvalidParams(e.to_string()))?;

        debug!(tool = %params.name, "Calling tool");
        let result = self.registry.call(&params.name, params.arguments).await?;
        Ok(serde_json::to_value(result)?)
    }

    /// Serve newline-delimited JSON-RPC until the reader is exhausted.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> McpResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // Driven by hand: a framed stream stops at the first oversized line,
        // the codec itself resumes at the next newline.
        let mut codec = LinesCodec::new_with_max_length(self.max_message_length);
        let mut buf = BytesMut::with_capacity(8 * 1024);
        let mut eof = false;

        loop {
            let decoded = if eof {
                codec.decode_eof(&mut buf)
            } else {
                codec.decode(&mut buf)
            };

            let line = match decoded {
                Ok(Some(line)) => line,
                Ok(None) if eof => break,
                Ok(None) => {
                    eof = reader.read_buf(&mut buf).await? == 0;
                    continue;
                }
                Err(LinesCodecError::Io(e)) => return Err(e.into()),
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    warn!(max = self.max_message_length, "Dropping oversized MCP message");
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line).await {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Serve over the process stdin/stdout.
    pub async fn run_stdio(&self) -> McpResult<()> {
        info!(tools = self.registry.len(), "MCP stdio server started");
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }
}
