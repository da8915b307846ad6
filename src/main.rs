// Creditwatch - prediction monitoring and alerting engine
// Main entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use creditwatch::config::load_config;
use creditwatch::engine::{run_rotation_task, MonitoringEngine};
use creditwatch::server::run_server;

#[derive(Parser, Debug)]
#[command(name = "creditwatch")]
#[command(about = "Prediction monitoring and alerting engine", version)]
struct Args {
    /// Path to config.toml (default: ~/.creditwatch/config.toml)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Bind address override (default from config: 127.0.0.1:8600)
    #[arg(long = "bind")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    let engine = Arc::new(MonitoringEngine::new(config.monitor.clone()));

    // Rotation runs on its own cadence, independent of ingestion bursts
    let rotation_engine = Arc::clone(&engine);
    tokio::spawn(async move {
        run_rotation_task(rotation_engine).await;
    });

    run_server(engine, &config.server).await
}
