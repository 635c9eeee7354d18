//! Master dataset: region name → ordered country records.
//!
//! Only the identity block is typed. `canonical`, `ui_view` and unknown
//! fields stay as raw JSON and are written back unchanged. Identity fields
//! that are not strings, regions that are not arrays and top-level keys other
//! than `regions` are dropped on load.

use crate::FeatureId;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Read a field as a string, treating any other JSON type as absent.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_owned))
}

/// Read a field as a finite number, treating anything else as absent.
pub(crate) fn lenient_score<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|score| score.is_finite()))
}

/// Identity block of a country record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterBlock {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub iso3: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub custom_geoid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One country entry inside a region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    #[serde(default)]
    pub master: MasterBlock,
    /// Typed factual data (risk, economy, society, politics)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub canonical: Value,
    /// Display-only derived scores and text
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub ui_view: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CountryRecord {
    /// Canonical identifier: `feature_id` → `custom_geoid` → `iso3`.
    pub fn feature_id(&self) -> Option<FeatureId> {
        [
            self.master.feature_id.as_deref(),
            self.master.custom_geoid.as_deref(),
            self.master.iso3.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find_map(FeatureId::normalise)
    }

    /// `canonical.risk.fsi_total.value`
    pub fn fsi_total(&self) -> Option<f64> {
        self.canonical
            .pointer("/risk/fsi_total/value")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }

    /// `ui_view.scores.stability_score`
    pub fn stability_score(&self) -> Option<f64> {
        self.ui_view
            .pointer("/scores/stability_score")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }

    /// Overwrite `canonical.risk.fsi_total.value`. Only applies when the
    /// `fsi_total` block already exists as an object.
    pub(crate) fn replace_fsi_total(&mut self, value: f64) -> bool {
        let Some(number) = serde_json::Number::from_f64(value) else {
            return false;
        };
        match self
            .canonical
            .pointer_mut("/risk/fsi_total")
            .and_then(Value::as_object_mut)
        {
            Some(block) => {
                block.insert("value".to_string(), Value::Number(number));
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    pub name: String,
    pub countries: Vec<CountryRecord>,
}

/// `{ regions: { [regionName]: CountryRecord[] } }`
///
/// Regions keep document order. A region that is not an array, or a record
/// that is not an object, is skipped rather than failing the whole document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterDataset {
    pub regions: Vec<Region>,
}

impl MasterDataset {
    /// Build from an already-parsed document. Never fails: a document with an
    /// unexpected shape yields an empty dataset.
    pub fn from_value(value: &Value) -> Self {
        let Some(regions) = value.get("regions").and_then(Value::as_object) else {
            return Self::default();
        };

        let mut skipped = 0usize;
        let regions = regions
            .iter()
            .filter_map(|(name, entries)| {
                let Some(entries) = entries.as_array() else {
                    skipped += 1;
                    return None;
                };
                let countries = entries
                    .iter()
                    .filter_map(|entry| match CountryRecord::deserialize(entry) {
                        Ok(record) if entry.is_object() => Some(record),
                        _ => {
                            skipped += 1;
                            None
                        }
                    })
                    .collect();
                Some(Region {
                    name: name.clone(),
                    countries,
                })
            })
            .collect();

        if skipped > 0 {
            debug!("Master dataset: skipped {} malformed regions/records", skipped);
        }

        Self { regions }
    }

    pub fn countries(&self) -> impl Iterator<Item = &CountryRecord> {
        self.regions.iter().flat_map(|r| r.countries.iter())
    }

    pub fn country_count(&self) -> usize {
        self.regions.iter().map(|r| r.countries.len()).sum()
    }

    /// First record whose canonical identifier matches `iso`.
    pub fn find_country(&self, iso: &str) -> Option<&CountryRecord> {
        let wanted = FeatureId::normalise(iso)?;
        self.countries()
            .find(|record| record.feature_id().as_ref() == Some(&wanted))
    }
}

impl<'de> Deserialize<'de> for MasterDataset {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl Serialize for MasterDataset {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct Regions<'a>(&'a [Region]);

        impl Serialize for Regions<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for region in self.0 {
                    map.serialize_entry(&region.name, &region.countries)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("regions", &Regions(&self.regions))?;
        map.end()
    }
}
