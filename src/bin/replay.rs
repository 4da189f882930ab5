//! Terminal map viewer.
//!
//! Connects to a running happymap server, draws the first year, then plays
//! through every year, logging each marker (or boundary polygon) it would
//! draw. Stops on Ctrl+C.

use anyhow::Context;
use clap::Parser;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use happymap::animation::Animator;
use happymap::fetch::{DataSource, HttpDataSource};
use happymap::render::LogSurface;
use happymap::viewer::{Layer, MapViewer};
use happymap::{init_tracing, ColorStrategy, MetricId, MetricRegistry};

#[derive(Parser, Debug)]
#[command(name = "happymap-replay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API root of a running happymap server
    #[arg(long, env = "HAPPYMAP_API", default_value = "http://localhost:5000/api")]
    api: String,

    /// Metric to show
    #[arg(short, long, default_value = "happiness")]
    metric: String,

    /// Color policy (gradient, banded)
    #[arg(short, long, default_value = "gradient")]
    policy: String,

    /// GeoJSON boundaries URL; draws polygons instead of markers
    #[arg(long)]
    boundaries: Option<String>,

    /// Milliseconds between years
    #[arg(long, default_value = "200", value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Draw the first year only, without animating
    #[arg(long)]
    once: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let metric: MetricId = args.metric.parse()?;
    let strategy: ColorStrategy = args.policy.parse()?;
    let registry = Arc::new(MetricRegistry::builtin().context("building metric registry")?);

    let mut source = HttpDataSource::new(&args.api)?;
    let layer = match args.boundaries {
        Some(url) => {
            source = source.with_boundaries_url(url);
            Layer::Polygons
        }
        None => Layer::Markers,
    };
    let source: Arc<dyn DataSource> = Arc::new(source);

    let viewer = Arc::new(
        MapViewer::new(registry, source, Arc::new(Mutex::new(LogSurface)), strategy)
            .with_layer(layer)
            .with_default_metric(metric),
    );

    let years = viewer
        .start()
        .await
        .with_context(|| format!("starting viewer against {}", args.api))?;
    if args.once {
        return Ok(());
    }

    let follower = Arc::clone(&viewer).follow();
    let animator = Animator::new(
        viewer.selection().clone(),
        years,
        Duration::from_millis(args.tick_ms),
    );
    if !animator.start() {
        anyhow::bail!("animation did not start");
    }

    tokio::signal::ctrl_c().await.context("waiting for Ctrl+C")?;
    animator.stop();
    follower.abort();
    info!("Replay stopped");
    Ok(())
}
