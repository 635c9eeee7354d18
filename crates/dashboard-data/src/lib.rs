//! # Dashboard Data
//!
//! Loads the documents behind the map layers: the master country dataset,
//! the three influence/resource indices and the regional report shards.
//!
//! Loading is best-effort. Each document is tried from its dynamic URL (if
//! configured) and then from the static file under the base location; one
//! failed document never blocks the others.
//!
//! ```text
//! DashboardConfig ──► JsonFetcher ──► DashboardData ──► LayerScores
//!   (env vars)       (url / file)     (Option per doc)   (layer-scoring)
//! ```

pub mod config;
pub mod reports;
pub mod source;

pub use config::DashboardConfig;
pub use reports::{merge_reports, shard_reports, REPORT_FILES};
pub use source::{JsonFetcher, Location};

use futures::future::join_all;
use layer_scoring::fsi::redefine_fsi_scores;
use layer_scoring::{LayerScores, LayerSources, MasterDataset};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

pub const MASTER_FILE: &str = "worlddash_global_master.json";
pub const CHINA_FILE: &str = "china_influence_index.json";
pub const RESOURCES_FILE: &str = "natural_resources_index.json";
pub const US_FILE: &str = "us_influence_index.json";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// Everything the dashboard loaded. Missing documents are `None`.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub master: Option<MasterDataset>,
    pub china: Option<Value>,
    pub resources: Option<Value>,
    pub us: Option<Value>,
    /// Reports keyed by uppercased ISO3
    pub reports: BTreeMap<String, Value>,
}

impl DashboardData {
    /// Score maps for all four layers. With `redefine_fsi` the FSI layer uses
    /// the 0-100 blended score instead of the raw total.
    pub fn layer_scores(&self, redefine_fsi: bool) -> LayerScores {
        let redefined = match (&self.master, redefine_fsi) {
            (Some(master), true) => Some(redefine_fsi_scores(master)),
            _ => None,
        };

        LayerScores::from_sources(LayerSources {
            master: redefined.as_ref().or(self.master.as_ref()),
            china: self.china.as_ref(),
            resources: self.resources.as_ref(),
            us: self.us.as_ref(),
        })
    }
}

async fn load_optional(
    fetcher: &JsonFetcher,
    name: &str,
    dynamic: Option<&str>,
    base: &str,
    static_file: &str,
) -> Option<Value> {
    match fetcher.fetch_with_fallback(dynamic, base, static_file).await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Could not load {} data: {}", name, e);
            None
        }
    }
}

/// Fetch every report shard concurrently. A shard that fails to load
/// contributes no reports.
pub async fn load_report_shards(fetcher: &JsonFetcher, config: &DashboardConfig) -> Vec<Vec<Value>> {
    let futures = REPORT_FILES.iter().map(|file| async move {
        let dynamic = config.report_url(file);
        match fetcher
            .fetch_with_fallback(dynamic.as_deref(), &config.base_url, file)
            .await
        {
            Ok(document) => shard_reports(document),
            Err(e) => {
                warn!("Skipping report shard {}: {}", file, e);
                Vec::new()
            }
        }
    });

    join_all(futures).await
}

pub async fn load_dashboard_data(fetcher: &JsonFetcher, config: &DashboardConfig) -> DashboardData {
    let base = config.base_url.as_str();

    let (master, china, resources, us, shards) = tokio::join!(
        fetcher.fetch_with_fallback(config.master_url.as_deref(), base, MASTER_FILE),
        load_optional(fetcher, "china influence", config.china_url.as_deref(), base, CHINA_FILE),
        load_optional(fetcher, "natural resources", config.resources_url.as_deref(), base, RESOURCES_FILE),
        load_optional(fetcher, "us influence", config.us_url.as_deref(), base, US_FILE),
        load_report_shards(fetcher, config),
    );

    let master = match master {
        Ok(value) => Some(MasterDataset::from_value(&value)),
        Err(e) => {
            error!("Could not load master dataset: {}", e);
            None
        }
    };

    let data = DashboardData {
        master,
        china,
        resources,
        us,
        reports: merge_reports(shards),
    };

    info!(
        "Loaded dashboard data: {} countries, {} reports",
        data.master.as_ref().map_or(0, MasterDataset::country_count),
        data.reports.len()
    );

    data
}
