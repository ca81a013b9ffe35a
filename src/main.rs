use anyhow::Result;
use clap::Parser;
use digit_recognizer::{config::Config, web::serve};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "digit-recognizer")]
#[command(about = "ONNX-powered handwritten digit recognition service")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,

    /// Directory holding model_info.json and the models/ folder
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Manifest path (defaults to <base-dir>/model_info.json)
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Model directory path (defaults to <base-dir>/models)
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// ONNX Runtime intra-op threads
    #[arg(long)]
    intra_threads: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting digit recognition service...");

    let config = Config::new(
        args.bind,
        args.base_dir,
        args.manifest,
        args.models_dir,
        args.intra_threads,
        args.dev,
    )?;

    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Manifest: {}", config.manifest_path.display());
    tracing::info!("Models directory: {}", config.models_dir.display());

    serve(config).await?;

    Ok(())
}
