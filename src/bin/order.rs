//! splat-order: build Gaussians from a PLY file and compute a draw order
//!
//! Usage:
//!   splat-order scene.ply --camera 0,1,5 --strategy exact --out order.bin
//!
//! The order file is a flat array of little-endian u32 indices.

use anyhow::{bail, Context, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use clap::Parser;
use nalgebra::Vector3;
use splat_view::core::Viewpoint;
use splat_view::io::load_ply;
use splat_view::sort::is_permutation;
use splat_view::{GaussianBuilder, SortStrategy, ViewerConfig, VisibilitySorter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "splat-order")]
#[command(about = "Compute a back-to-front draw order for a Gaussian splat PLY")]
#[command(version)]
struct Cli {
    /// Input PLY with 3DGS vertex attributes
    input: PathBuf,

    /// Camera position as "x,y,z" (overrides the config camera)
    #[arg(short, long, value_parser = parse_vec3, allow_hyphen_values = true)]
    camera: Option<Vector3<f32>>,

    /// exact | approximate (overrides the config strategy)
    #[arg(short, long)]
    strategy: Option<SortStrategy>,

    /// JSON viewer config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the order as little-endian u32 indices
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn parse_vec3(s: &str) -> Result<Vector3<f32>, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("'{}': {}", p, e)))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(format!("expected three comma-separated floats, got '{}'", s)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    tracing::info!("splat-order v{}", splat_view::VERSION);

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config.sort.strategy = strategy;
    }
    if let Some(position) = cli.camera {
        config.camera.position = position;
    }

    let table = load_ply(&cli.input).with_context(|| format!("loading {}", cli.input.display()))?;
    let cloud = GaussianBuilder::new(config.build)
        .build(&table)
        .context("building Gaussians")?;

    let bounds = cloud.bounds();
    tracing::info!(
        "bounds min=({:.3}, {:.3}, {:.3}) max=({:.3}, {:.3}, {:.3}) diagonal={:.3}",
        bounds.min.x,
        bounds.min.y,
        bounds.min.z,
        bounds.max.x,
        bounds.max.y,
        bounds.max.z,
        bounds.diagonal()
    );

    let mut sorter = VisibilitySorter::for_cloud(&cloud, &config.sort);
    let eye = config.camera.position();
    let start = Instant::now();
    let order = sorter.compute_order(cloud.as_slice(), &config.camera);
    tracing::info!(
        "{} order for {} splats from ({}, {}, {}) in {:.2?}",
        sorter.strategy(),
        order.len(),
        eye.x,
        eye.y,
        eye.z,
        start.elapsed()
    );
    if !is_permutation(&order, cloud.len()) {
        bail!("sorter returned an order that is not a permutation");
    }

    match &cli.out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            for &index in &order {
                writer.write_u32::<LittleEndian>(index)?;
            }
            writer.flush()?;
            tracing::info!("wrote {} indices to {}", order.len(), path.display());
        }
        None => {
            let preview: Vec<String> = order.iter().take(16).map(|i| i.to_string()).collect();
            println!("first {} of {}: {}", preview.len(), order.len(), preview.join(" "));
        }
    }

    Ok(())
}
