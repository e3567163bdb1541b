//! splat-analyze: scale anisotropy of a Gaussian splat PLY
//!
//! Usage:
//!   splat-analyze scene.ply > anisotropy.csv
//!
//! CSV goes to stdout (`value,kind`, one `min` and one `mid` row per splat);
//! the summary goes to the log on stderr.

use anyhow::{Context, Result};
use clap::Parser;
use splat_view::analysis::{analyze_scales, summarize, write_csv};
use splat_view::io::load_ply;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "splat-analyze")]
#[command(about = "Report per-splat scale ratios as CSV")]
#[command(version)]
struct Cli {
    /// Input PLY with scale_0..scale_2 vertex properties
    input: PathBuf,

    /// Ratio below which an axis counts as collapsed
    #[arg(long, default_value = "0.1")]
    threshold: f32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let table = load_ply(&cli.input).with_context(|| format!("loading {}", cli.input.display()))?;
    let stats = analyze_scales(&table).context("reading scale columns")?;

    let stdout = std::io::stdout();
    write_csv(BufWriter::new(stdout.lock()), &stats)?;

    let summary = summarize(&stats, cli.threshold);
    tracing::info!(
        "{} splats: mean min ratio {:.3}, mean mid ratio {:.3}, flat {:.1}%, needle {:.1}%",
        summary.count,
        summary.mean_min_ratio,
        summary.mean_mid_ratio,
        summary.flat_fraction * 100.0,
        summary.needle_fraction * 100.0
    );

    Ok(())
}
