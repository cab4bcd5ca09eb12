//! HTTP host for the identity MCP server: configuration, fixed-token
//! authentication, health endpoints and the MCP HTTP/SSE transport.

pub mod api;
pub mod config;
pub mod middleware;

pub use config::{ConfigArgs, ServerConfig};

const DEFAULT_FILTER: &str = "identity_mcp=info,identity_mcp_server=info,identity_storage_sdk=info,tower_http=debug";

/// Initialize tracing. The stdio transport owns stdout, so it logs to stderr.
pub fn init_tracing(stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if stderr {
        builder.with_writer(std::io::stderr).with_ansi(false).init();
    } else {
        builder.init();
    }
}
