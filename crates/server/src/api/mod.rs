use crate::config::ServerConfig;
use crate::middleware::FixedTokenAuth;
use anyhow::{Context, Result};
use axum::Router;
use identity_mcp::protocol::ServerInfo;
use identity_mcp::{identity_tools, McpServer};
use identity_mcp_core::ClaimClient;
use identity_storage_sdk::IdentityStorageClient;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

pub mod health;
pub mod mcp;

use health::HealthChecks;
use mcp::McpTransportState;

/// Everything the routers need, built once from configuration
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub client: Arc<dyn ClaimClient>,
    pub server: McpServer,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let client = claim_client(&config)?;
        Ok(Self::with_client(config, client))
    }

    /// Build around an existing identity store client
    pub fn with_client(config: ServerConfig, client: Arc<dyn ClaimClient>) -> Self {
        let server = mcp_server(&config, client.clone());
        Self {
            config: Arc::new(config),
            client,
            server,
        }
    }
}

/// HTTP client for the identity storage API
pub fn claim_client(config: &ServerConfig) -> Result<Arc<dyn ClaimClient>> {
    let api = &config.identity_storage_api;
    let client = IdentityStorageClient::builder()
        .api_url(&api.api_url)
        .api_base_path(&api.api_base_path)
        .timeout(api.timeout())
        .build()
        .context("Invalid identity_storage_api configuration")?;

    tracing::info!(base_url = %client.base_url(), "Identity storage client configured");
    Ok(Arc::new(client))
}

/// MCP dispatcher exposing the identity tools
pub fn mcp_server(config: &ServerConfig, client: Arc<dyn ClaimClient>) -> McpServer {
    let version = Some(config.app.version.clone()).filter(|v| !v.trim().is_empty());
    let registry = identity_tools(client, version);
    tracing::info!(tools = registry.len(), "Registered MCP tools");

    McpServer::new(
        registry,
        ServerInfo {
            name: config.app.name.clone(),
            version: config.app.version.clone(),
        },
    )
}

/// Start the HTTP server, plus a separate health listener when
/// `health.port` is configured.
pub async fn serve(config: ServerConfig) -> Result<()> {
    config.validate()?;
    let state = AppState::new(config)?;
    let app_addr = state.config.app.listen_addr();

    match state.config.health.port {
        Some(port) if port != app_addr.port() => {
            let health_addr = SocketAddr::new(app_addr.ip(), port);
            tokio::try_join!(
                listen(app_addr, mcp_router(&state)),
                listen(health_addr, health_router(&state)),
            )?;
        }
        _ => listen(app_addr, create_router(&state)).await?,
    }

    Ok(())
}

async fn listen(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// MCP and health routes on one listener
pub fn create_router(state: &AppState) -> Router {
    with_layers(mcp_routes(state).merge(health_routes(state)))
}

/// MCP routes only, for when health has its own port
pub fn mcp_router(state: &AppState) -> Router {
    with_layers(mcp_routes(state))
}

pub fn health_router(state: &AppState) -> Router {
    with_layers(health_routes(state))
}

fn mcp_routes(state: &AppState) -> Router {
    let auth = Arc::new(FixedTokenAuth::new(&state.config.authentication));
    let transport = McpTransportState::new(state.server.clone(), state.config.app.mcp_base_path());
    mcp::router(transport, auth)
}

fn health_routes(state: &AppState) -> Router {
    let checks = HealthChecks::standard(&state.config.app, state.client.clone());
    health::router(&state.config.health, Arc::new(checks))
}

fn with_layers(router: Router) -> Router {
    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
