//! Country deep-dive reports, sharded by region

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

pub const REPORT_FILES: [&str; 5] = [
    "reports_africa.json",
    "reports_asia.json",
    "reports_europe.json",
    "reports_americas.json",
    "reports_oceania.json",
];

/// Reports in one shard document. A bare object counts as a single report;
/// anything else is an empty shard.
pub fn shard_reports(document: Value) -> Vec<Value> {
    match document {
        Value::Array(reports) => reports,
        report @ Value::Object(_) => vec![report],
        _ => Vec::new(),
    }
}

/// Key every report by `meta.country_iso3` (uppercased). Reports without a
/// country code are dropped; later shards overwrite earlier ones.
pub fn merge_reports<I>(shards: I) -> BTreeMap<String, Value>
where
    I: IntoIterator<Item = Vec<Value>>,
{
    let mut merged = BTreeMap::new();
    let mut dropped = 0usize;

    for report in shards.into_iter().flatten() {
        let iso = report
            .pointer("/meta/country_iso3")
            .and_then(Value::as_str)
            .map(|iso| iso.trim().to_uppercase())
            .filter(|iso| !iso.is_empty());
        match iso {
            Some(iso) => {
                merged.insert(iso, report);
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("Dropped {} reports without meta.country_iso3", dropped);
    }

    merged
}
