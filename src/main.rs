use anyhow::Result;
use clap::Parser;
use tracing::info;

mod charts;
mod config;
mod dashboard;
mod dataset;
mod error;
mod report;
mod stats;

use config::{Command, Config};
use dashboard::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    match config.command {
        Command::Report(args) => {
            info!(
                "Static report: matches={} deliveries={} -> {}",
                args.matches.display(),
                args.deliveries.display(),
                args.out_dir.display()
            );
            // Parsing and rendering are blocking work
            let written = tokio::task::spawn_blocking(move || report::run(&args)).await??;
            info!("Report complete: {} file(s) written", written.len());
        }
        Command::Serve(args) => {
            let addr = args.socket_addr()?;
            let app = dashboard::router(AppState {
                max_upload_bytes: args.max_upload_bytes(),
            });
            info!(
                "Dashboard listening on http://{} (upload limit {} MiB)",
                addr, args.max_upload_mb
            );
            let listener = tokio::net::TcpListener::bind(addr).await?;

            // Run dashboard server (blocks until shutdown)
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
