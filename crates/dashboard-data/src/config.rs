//! Environment configuration

use std::time::Duration;

pub const ENV_BASE_URL: &str = "DASHBOARD_BASE_URL";
pub const ENV_MASTER_URL: &str = "MASTER_DATA_URL";
pub const ENV_CHINA_URL: &str = "CHINA_INFLUENCE_DATA_URL";
pub const ENV_RESOURCES_URL: &str = "RESOURCE_DATA_URL";
pub const ENV_US_URL: &str = "US_INFLUENCE_DATA_URL";
pub const ENV_REPORTS_BASE_URL: &str = "REPORTS_DATA_BASE_URL";
pub const ENV_HTTP_TIMEOUT: &str = "DASHBOARD_HTTP_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "public/";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Where each dashboard document comes from.
///
/// Every `*_url` is an optional dynamic source tried before the static file
/// under `base_url`. Blank values count as unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub base_url: String,
    pub master_url: Option<String>,
    pub china_url: Option<String>,
    pub resources_url: Option<String>,
    pub us_url: Option<String>,
    /// Report shard base, trailing `/` removed
    pub reports_base_url: Option<String>,
    pub http_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            master_url: None,
            china_url: None,
            resources_url: None,
            us_url: None,
            reports_base_url: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let http_timeout = value(ENV_HTTP_TIMEOUT)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS), Duration::from_secs);

        Self {
            base_url: value(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            master_url: value(ENV_MASTER_URL),
            china_url: value(ENV_CHINA_URL),
            resources_url: value(ENV_RESOURCES_URL),
            us_url: value(ENV_US_URL),
            reports_base_url: value(ENV_REPORTS_BASE_URL)
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            http_timeout,
        }
    }

    /// Dynamic URL for one report shard, if a report base is configured.
    pub fn report_url(&self, file_name: &str) -> Option<String> {
        self.reports_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base, file_name))
    }
}
