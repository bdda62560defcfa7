use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::charts::{self, ImageFormat};
use crate::config::ReportArgs;
use crate::dataset::Dataset;
use crate::stats::{MatchStatsEngine, StatsReport};

/// Console line for the toss metric
pub fn toss_impact_line(pct: f64) -> String {
    format!("Toss Impact: {:.2}% of toss winners also won the match.", pct)
}

/// Load both files, compute every statistic and write one image per chart.
/// Returns the written file paths.
pub fn run(args: &ReportArgs) -> Result<Vec<PathBuf>> {
    let data = Dataset::load(&args.matches, &args.deliveries).with_context(|| {
        format!(
            "loading {} and {}",
            args.matches.display(),
            args.deliveries.display()
        )
    })?;
    let engine = MatchStatsEngine::new(data);
    let report = engine.report()?;

    match report.toss_impact_pct {
        Some(pct) => {
            let line = toss_impact_line(pct);
            info!("{}", line);
            println!("{}", line);
        }
        None => warn!("Toss impact not available for this dataset"),
    }

    let mut written = write_charts(&report, &args.out_dir, args.format)?;

    if args.json {
        let path = args.out_dir.join("report.json");
        let body = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// Render every chart of `report` into `out_dir`.
pub fn write_charts(report: &StatsReport, out_dir: &Path, format: ImageFormat) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut written = Vec::new();
    for chart in charts::charts_for(report) {
        let path = out_dir.join(format!("{}.{}", chart.id, format.extension()));
        charts::render_to_file(&chart, &path, format)
            .with_context(|| format!("rendering {}", chart.title))?;
        info!("Chart '{}' written to {}", chart.title, path.display());
        written.push(path);
    }
    Ok(written)
}
