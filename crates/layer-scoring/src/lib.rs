//! World-map layer scoring
//!
//! Joins heterogeneous per-domain score documents onto map geometry and
//! turns the joined scores into fill colours.
//!
//! # Pipeline
//!
//! ```text
//! index JSON ──► extract ──► ScoreMap ──┐
//!                                       ├──► paint ──► fill colour per feature
//! geometry ────► resolver ──► FeatureId ┘        (gradient per layer)
//! ```
//!
//! | Layer     | Source document                  | Score domain |
//! |-----------|----------------------------------|--------------|
//! | fsi       | master dataset (`fsi_total`)     | 0-120 raw, 0-100 redefined |
//! | china     | `china_influence_index.json`     | 0-100 |
//! | us        | `us_influence_index.json`        | 0-100 |
//! | resources | `natural_resources_index.json`   | 0-100 |
//!
//! Everything in this crate is synchronous and side-effect free. Bad input
//! degrades to "no data", it never surfaces as an error on the colouring path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod extract;
pub mod fsi;
pub mod gradient;
pub mod legacy_iso;
pub mod master;
pub mod paint;
pub mod resolver;

pub use extract::{extract_fsi_scores, extract_index_scores, LayerScores, LayerSources};
pub use gradient::{ColorStop, Gradient, LayerStyle, Rgb, ThreeColorScale};
pub use legacy_iso::LegacyIsoTable;
pub use master::{CountryRecord, MasterDataset, Region};
pub use paint::{paint_features, PaintOptions, PaintSummary, PaintedMap};
pub use resolver::{
    classify_feature, is_disputed, resolve_feature, FeatureResolution, FeatureRole, GeoProperties,
    IsoSource,
};

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("invalid colour {0:?}: expected #rrggbb")]
    InvalidColor(String),
    #[error("gradient needs at least one stop")]
    EmptyGradient,
    #[error("gradient stop {0} is not finite")]
    NonFiniteStop(f64),
    #[error("gradient stops must increase: {prev} is followed by {next}")]
    UnorderedStops { prev: f64, next: f64 },
    #[error("unknown layer {0:?}")]
    UnknownLayer(String),
}

pub type Result<T> = std::result::Result<T, ScoringError>;

/// Placeholder values some sources use for "no code"; never identifiers
pub const SENTINEL_IDS: [&str; 4] = ["", "-99", "---", "N/A"];

/// Canonical join key: trimmed, uppercased, never empty or a sentinel.
///
/// Holds either an ISO 3166-1 alpha-3 code or a synthetic geo-ID used by
/// regions and disputed territories that have no sovereign code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    /// Normalise a raw identifier. Blank and sentinel input yield `None`.
    pub fn normalise(raw: &str) -> Option<Self> {
        let id = raw.trim().to_uppercase();
        if SENTINEL_IDS.contains(&id.as_str()) {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Normalise a JSON value; only strings carry identifiers.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        value.as_str().and_then(Self::normalise)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flat mapping from canonical feature identifier to a finite score.
///
/// Absence means "no data" and is distinct from a score of zero. Non-finite
/// scores are rejected on the way in, so every stored value is finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScoreMap {
    scores: BTreeMap<FeatureId, f64>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a score, overwriting any previous value for the same id.
    /// Returns `false` (and stores nothing) when the score is not finite.
    pub(crate) fn insert(&mut self, id: FeatureId, score: f64) -> bool {
        if !score.is_finite() {
            return false;
        }
        self.scores.insert(id, score);
        true
    }

    /// Look up a score. The key is normalised first, so `"jpn "` finds `JPN`.
    pub fn get(&self, id: &str) -> Option<f64> {
        FeatureId::normalise(id).and_then(|key| self.scores.get(&key).copied())
    }

    pub fn get_id(&self, id: &FeatureId) -> Option<f64> {
        self.scores.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FeatureId, f64)> {
        self.scores.iter().map(|(id, score)| (id, *score))
    }

    /// Ordered merge: maps are applied front to back and a later map
    /// overwrites an earlier one for the same identifier.
    pub fn merge_ordered<I>(maps: I) -> Self
    where
        I: IntoIterator<Item = ScoreMap>,
    {
        let mut merged = Self::new();
        for map in maps {
            merged.scores.extend(map.scores);
        }
        merged
    }
}

impl FromIterator<(FeatureId, f64)> for ScoreMap {
    fn from_iter<T: IntoIterator<Item = (FeatureId, f64)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (id, score) in iter {
            map.insert(id, score);
        }
        map
    }
}

/// Named visualisation mode, each with its own score map and gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    #[default]
    Fsi,
    China,
    Us,
    Resources,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Fsi, Layer::China, Layer::Us, Layer::Resources];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Fsi => "fsi",
            Layer::China => "china",
            Layer::Us => "us",
            Layer::Resources => "resources",
        }
    }

    /// Parse a layer name, falling back to `Fsi` for anything unknown.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl FromStr for Layer {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fsi" => Ok(Layer::Fsi),
            "china" => Ok(Layer::China),
            "us" => Ok(Layer::Us),
            "resources" => Ok(Layer::Resources),
            _ => Err(ScoringError::UnknownLayer(s.to_string())),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
