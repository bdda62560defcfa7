use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::charts::ImageFormat;

/// Cricket match statistics: chart report and upload dashboard
#[derive(Parser, Debug, Clone)]
#[command(name = "ipl-insights", version, about)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compute every statistic from local CSV files and write chart images
    Report(ReportArgs),
    /// Serve the upload dashboard
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Match-level records (one row per match)
    #[arg(long, env = "MATCHES_CSV", default_value = "matches.csv")]
    pub matches: PathBuf,

    /// Ball-by-ball delivery records
    #[arg(long, env = "DELIVERIES_CSV", default_value = "deliveries.csv")]
    pub deliveries: PathBuf,

    /// Directory the chart images are written to
    #[arg(long, env = "CHARTS_DIR", default_value = "charts")]
    pub out_dir: PathBuf,

    /// Chart image format
    #[arg(long, env = "CHART_FORMAT", value_enum, default_value = "png")]
    pub format: ImageFormat,

    /// Also write the computed statistics to report.json
    #[arg(long, env = "WRITE_JSON", default_value = "false")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,

    /// Largest accepted upload request, in MiB (both files together)
    #[arg(long, env = "MAX_UPLOAD_MB", default_value = "64")]
    pub max_upload_mb: usize,
}

impl ServeArgs {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.dashboard_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid dashboard_addr '{}': {}", self.dashboard_addr, e))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        match &self.command {
            Command::Report(args) => {
                if args.matches == args.deliveries {
                    anyhow::bail!("--matches and --deliveries must be different files");
                }
            }
            Command::Serve(args) => {
                args.socket_addr()?;
                if args.max_upload_mb == 0 {
                    anyhow::bail!("max_upload_mb must be positive");
                }
            }
        }
        Ok(())
    }
}
