//! Map Layer Painter CLI
//!
//! Loads the dashboard datasets and writes a GeoJSON copy of the country
//! geometry with per-feature scores and fill colours for one layer.
//!
//! Usage:
//!   paint-layers --geometry public/countries.geojson \
//!                --layer china \
//!                --output public/countries_china.geojson
//!
//! Data locations come from the environment (`DASHBOARD_BASE_URL`,
//! `MASTER_DATA_URL`, ...).

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use dashboard_data::{load_dashboard_data, DashboardConfig, JsonFetcher};
use geojson::FeatureCollection;
use layer_scoring::legacy_iso::NAME_OVERRIDES;
use layer_scoring::{paint_features, Layer, LegacyIsoTable, PaintOptions};
use serde_json::json;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    name = "paint-layers",
    about = "Join dashboard scores onto country geometry and colour one map layer"
)]
struct Args {
    /// Country geometry GeoJSON
    #[arg(short, long, default_value = "public/countries.geojson")]
    geometry: PathBuf,

    /// Layer to paint: fsi, china, us or resources
    #[arg(short, long, default_value_t = Layer::Fsi)]
    layer: Layer,

    /// Output GeoJSON file
    #[arg(short, long, default_value = "painted_layer.geojson")]
    output: PathBuf,

    /// Use the blended 0-100 FSI score instead of the raw total
    #[arg(long)]
    redefine_fsi: bool,

    /// Emit fill colours as rgb(r,g,b)
    #[arg(long)]
    css_rgb: bool,

    /// Also resolve features by display name
    #[arg(long)]
    name_overrides: bool,

    /// Override DASHBOARD_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("Map Layer Painter ({})", args.layer);
    info!("{}", "=".repeat(60));

    let mut config = DashboardConfig::from_env();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }

    let fetcher = JsonFetcher::new(config.http_timeout)?;
    let data = load_dashboard_data(&fetcher, &config).await;
    let scores = data.layer_scores(args.redefine_fsi);

    let file = File::open(&args.geometry)
        .with_context(|| format!("Failed to open geometry {:?}", args.geometry))?;
    let geometry: FeatureCollection = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Invalid GeoJSON in {:?}", args.geometry))?;

    let mut table = LegacyIsoTable::standard();
    if args.name_overrides {
        table = table.with_name_overrides(NAME_OVERRIDES.iter().copied());
    }

    let options = PaintOptions {
        layer: args.layer,
        css_rgb: args.css_rgb,
    };
    let mut painted = paint_features(&geometry, options, &scores, &table);

    let metadata = json!({
        "layer": args.layer,
        "generated_at": Utc::now().to_rfc3339(),
        "redefined_fsi": args.redefine_fsi,
        "summary": painted.summary,
        "legend": args.layer.style(),
    });
    painted
        .collection
        .foreign_members
        .get_or_insert_with(Default::default)
        .insert("metadata".to_string(), metadata);

    info!("Writing painted layer to {:?}", args.output);
    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {:?}", args.output))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &painted.collection)?;

    let summary = painted.summary;
    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Features:   {}", summary.total);
    info!("Scored:     {}", summary.scored);
    info!("No data:    {}", summary.no_data);
    info!("Countries:  {}", summary.countries);
    info!("Disputed:   {}", summary.disputed);
    info!("Inert:      {}", summary.inert);
    info!("Reports:    {}", data.reports.len());

    Ok(())
}
