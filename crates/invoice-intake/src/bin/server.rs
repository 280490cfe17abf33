//! Invoice intake server binary
//!
//! Run with: cargo run -p invoice-intake --bin invoice-intake-server -- --config intake.toml

use clap::Parser;
use invoice_intake::{config::AppConfig, server::InvoiceServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "invoice-intake-server", version, about = "Invoice upload and analysis service")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "INVOICE_INTAKE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invoice_intake=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Analyzer: {:?} ({})", config.llm.backend, config.llm.model);
    tracing::info!("  - Analyzer URL: {}", config.llm.base_url);
    tracing::info!("  - Max file size: {} bytes", config.upload.max_file_size);
    tracing::info!("  - Staging dir: {}", config.upload.staging_dir.display());

    let server = InvoiceServer::new(config)?;

    if !server.state().pipeline().relay().analyzer().health_check().await? {
        tracing::warn!("Analyzer backend is not reachable yet; requests will fail until it is");
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/invoice-analysis - Upload an invoice (field: invoice)");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
