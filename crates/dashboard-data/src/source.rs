//! JSON document sources: local files or HTTP

use crate::{LoadError, Result};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// A document location, either a URL or a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Url(String),
    Path(PathBuf),
}

impl Location {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Location::Url(raw.to_string())
        } else {
            Location::Path(PathBuf::from(raw))
        }
    }

    /// `file_name` under `base`, which may itself be a URL or a directory.
    pub fn join(base: &str, file_name: &str) -> Self {
        match Self::parse(base) {
            Location::Url(url) => Location::Url(format!("{}/{}", url.trim_end_matches('/'), file_name)),
            Location::Path(dir) => Location::Path(dir.join(file_name)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Url(url) => f.write_str(url),
            Location::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Loads JSON from files and URLs with one shared HTTP client.
#[derive(Debug, Clone)]
pub struct JsonFetcher {
    client: reqwest::Client,
}

impl JsonFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, location: &Location) -> Result<Value> {
        debug!("Fetching {}", location);
        match location {
            Location::Url(url) => {
                let response = self.client.get(url).send().await?;
                if !response.status().is_success() {
                    return Err(LoadError::Status {
                        url: url.clone(),
                        status: response.status().as_u16(),
                    });
                }
                Ok(response.json().await?)
            }
            Location::Path(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(serde_json::from_slice(&bytes)?)
            }
        }
    }

    /// Try the dynamic source first; on any failure log the fallback and load
    /// `static_file` under `base`.
    pub async fn fetch_with_fallback(
        &self,
        dynamic: Option<&str>,
        base: &str,
        static_file: &str,
    ) -> Result<Value> {
        let fallback = Location::join(base, static_file);

        if let Some(dynamic) = dynamic.map(str::trim).filter(|d| !d.is_empty()) {
            match self.fetch(&Location::parse(dynamic)).await {
                Ok(value) => return Ok(value),
                Err(e) => warn!("[data-fallback] {} -> {}: {}", dynamic, fallback, e),
            }
        }

        self.fetch(&fallback).await
    }
}
