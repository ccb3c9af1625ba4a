use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tinvest_bridge::ToolBridge;
use tinvest_mcp::protocol::McpServer;
use tinvest_mcp::transport;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[derive(Parser, Debug)]
#[command(name = "tinvest-mcp", about = "Tinkoff Invest brokerage tools over MCP")]
struct Cli {
    /// Optional TOML config file with a [broker] table
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transport to serve on
    #[arg(short, long, value_enum, default_value_t = Transport::Http)]
    transport: Transport,

    /// HTTP listen host
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// HTTP listen port
    #[arg(short, long, default_value_t = 8100)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before the subscriber so RUST_LOG can come from .env.
    let dotenv = tinvest_mcp::load_dotenv();

    // Logs go to stderr; stdout belongs to the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env loaded"),
    }

    let cli = Cli::parse();

    let config = tinvest_mcp::load_config(cli.config.as_deref())?;
    info!(
        endpoint = %config.endpoint,
        app_name = %config.app_name,
        sandbox = config.is_sandbox(),
        "Configuration loaded"
    );

    let session = tinvest_mcp::build_session(&config)
        .await
        .context("Failed to start brokerage session")?;
    let session = Arc::new(session);
    let server = Arc::new(McpServer::new(ToolBridge::new(Arc::clone(&session))));

    let cancel = CancellationToken::new();
    tokio::spawn(await_shutdown(cancel.clone()));

    let served = match cli.transport {
        Transport::Stdio => transport::serve_stdio(server, cancel).await,
        Transport::Http => {
            let addr = SocketAddr::new(cli.host, cli.port);
            transport::serve_http(server, addr, cancel).await
        }
    };

    session.shutdown().await;

    served
}

async fn await_shutdown(cancel: CancellationToken) {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        return;
    }
    info!("Shutdown requested");
    cancel.cancel();
}
