// Identity MCP server over stdin/stdout

use anyhow::Result;
use clap::Parser;
use identity_mcp_server::{api, init_tracing, ConfigArgs};

#[derive(Parser, Debug)]
#[command(name = "identity-mcp-stdio")]
#[command(about = "MCP server for managing identity claims over stdio", long_about = None)]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(true);

    let args = Args::parse();
    let config = args.config.load()?;

    let client = api::claim_client(&config)?;
    let server = api::mcp_server(&config, client);

    tracing::info!(version = %config.app.version, "Identity MCP server ready on stdio");
    server.run_stdio().await?;

    Ok(())
}
