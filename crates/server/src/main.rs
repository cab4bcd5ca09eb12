use anyhow::Result;
use clap::Parser;
use identity_mcp_server::{api, init_tracing, ConfigArgs};

#[derive(Parser, Debug)]
#[command(name = "identity-mcp-server")]
#[command(about = "MCP server for managing identity claims over HTTP", long_about = None)]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(false);

    let args = Args::parse();
    let config = args.config.load()?;

    tracing::info!(
        name = %config.app.name,
        version = %config.app.version,
        "Starting identity MCP server"
    );

    api::serve(config).await?;

    Ok(())
}
