//! Score extraction
//!
//! Two extractors feed the same canonical-identifier space:
//!
//! - [`extract_index_scores`] for `{ countries, regions, disputed }` index documents
//! - [`extract_fsi_scores`] for the master dataset's `fsi_total` risk values
//!
//! Both are best effort: a missing or malformed payload yields an empty map.

use crate::master::{lenient_score, lenient_string, MasterDataset};
use crate::{FeatureId, Layer, ScoreMap};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Bucket iteration order. Later buckets overwrite earlier ones.
pub const INDEX_BUCKETS: [&str; 3] = ["countries", "regions", "disputed"];

/// One entry of an index bucket
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndexEntry {
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub feature_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub custom_geoid: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub iso3: Option<String>,
}

impl IndexEntry {
    /// Identifier precedence: `feature_id` → `custom_geoid` → `iso3` → bucket key.
    pub fn resolve_id(&self, key: &str) -> Option<FeatureId> {
        [
            self.feature_id.as_deref(),
            self.custom_geoid.as_deref(),
            self.iso3.as_deref(),
            Some(key),
        ]
        .into_iter()
        .flatten()
        .find_map(FeatureId::normalise)
    }
}

/// Scores from a single bucket, in document order.
fn extract_bucket(bucket: &str, collection: &Value) -> ScoreMap {
    let Some(entries) = collection.as_object() else {
        return ScoreMap::new();
    };

    let mut scores = ScoreMap::new();
    let mut skipped = 0usize;

    for (key, raw) in entries {
        let entry = IndexEntry::deserialize(raw).unwrap_or_default();
        let inserted = match (entry.resolve_id(key), entry.score) {
            (Some(id), Some(score)) => scores.insert(id, score),
            _ => false,
        };
        if !inserted {
            skipped += 1;
        }
    }

    if skipped > 0 {
        debug!("Bucket {}: {} entries without a finite score", bucket, skipped);
    }

    scores
}

/// Flatten an index document into a score map.
pub fn extract_index_scores(payload: &Value) -> ScoreMap {
    let buckets = INDEX_BUCKETS
        .iter()
        .filter_map(|bucket| payload.get(*bucket).map(|c| extract_bucket(bucket, c)));

    ScoreMap::merge_ordered(buckets)
}

/// FSI risk values keyed by each record's `master` identity.
pub fn extract_fsi_scores(master: &MasterDataset) -> ScoreMap {
    master
        .countries()
        .filter_map(|record| Some((record.feature_id()?, record.fsi_total()?)))
        .collect()
}

/// Raw documents a full set of layers is built from. Any of them may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerSources<'a> {
    pub master: Option<&'a MasterDataset>,
    pub china: Option<&'a Value>,
    pub resources: Option<&'a Value>,
    pub us: Option<&'a Value>,
}

/// One score map per layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerScores {
    pub fsi: ScoreMap,
    pub china: ScoreMap,
    pub us: ScoreMap,
    pub resources: ScoreMap,
}

impl LayerScores {
    /// Rebuild every layer from its source. Nothing is carried over from a
    /// previous build.
    pub fn from_sources(sources: LayerSources<'_>) -> Self {
        let index = |doc: Option<&Value>| doc.map(extract_index_scores).unwrap_or_default();

        let scores = Self {
            fsi: sources.master.map(extract_fsi_scores).unwrap_or_default(),
            china: index(sources.china),
            us: index(sources.us),
            resources: index(sources.resources),
        };

        debug!(
            "Layer scores: fsi={} china={} us={} resources={}",
            scores.fsi.len(),
            scores.china.len(),
            scores.us.len(),
            scores.resources.len()
        );

        scores
    }

    pub fn get(&self, layer: Layer) -> &ScoreMap {
        match layer {
            Layer::Fsi => &self.fsi,
            Layer::China => &self.china,
            Layer::Us => &self.us,
            Layer::Resources => &self.resources,
        }
    }
}
