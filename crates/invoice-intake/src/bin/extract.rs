//! Run the upload gate and format extractor on a local file
//!
//! Prints the `ExtractionResult` as JSON, i.e. exactly what the analyzer would receive.

use anyhow::Context;
use clap::Parser;
use invoice_intake::{config::AppConfig, FormatExtractor, UploadGate, UploadedFile};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "invoice-extract", version, about = "Extract invoice text without calling the analyzer")]
struct Cli {
    /// Invoice file to extract
    path: PathBuf,

    /// Declared MIME type (guessed from the extension when omitted)
    #[arg(long)]
    mime: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "INVOICE_INTAKE_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invoice_intake=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    let filename = cli
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .context("path has no usable file name")?
        .to_string();
    let mime_type = cli
        .mime
        .or_else(|| mime_guess::from_path(&cli.path).first_raw().map(str::to_string));

    let data = std::fs::read(&cli.path)
        .with_context(|| format!("failed to read {}", cli.path.display()))?;

    let gate = UploadGate::new(&config.upload);
    gate.validate(&UploadedFile::new(
        filename.clone(),
        mime_type.clone(),
        data.len() as u64,
    ))?;

    let extractor = FormatExtractor::new(&config.extraction);
    let result = extractor.extract(&filename, mime_type.as_deref(), &data)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
