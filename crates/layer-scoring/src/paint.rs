//! Paint a GeoJSON feature collection for one layer
//!
//! Each output feature keeps its geometry and properties and gains the join
//! results the renderer needs:
//!
//! | Property     | Value |
//! |--------------|-------|
//! | `feature_id` | canonical join key or null |
//! | `iso`        | validated ISO3 or null |
//! | `iso_source` | where the ISO came from |
//! | `score`      | layer score or null |
//! | `fill_color` | interpolated colour, no-data colour when unscored |
//! | `role`       | `country`, `disputed` or `inert` |
//! | `clickable`  | true only for `country` |
//!
//! Disputed features are emitted first so they draw below country fills.

use crate::extract::LayerScores;
use crate::legacy_iso::LegacyIsoTable;
use crate::resolver::{classify_feature, resolve_feature, FeatureRole, GeoProperties};
use crate::Layer;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, JsonObject};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintOptions {
    pub layer: Layer,
    /// Emit `rgb(r,g,b)` instead of `#rrggbb`
    pub css_rgb: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaintSummary {
    pub total: usize,
    pub scored: usize,
    pub no_data: usize,
    pub countries: usize,
    pub disputed: usize,
    pub inert: usize,
}

#[derive(Debug, Clone)]
pub struct PaintedMap {
    pub collection: FeatureCollection,
    pub summary: PaintSummary,
}

/// Raw top-level id as text. Integral numbers render without a fraction,
/// so `4` and `4.0` both become `"4"`.
fn geo_id_text(id: Option<&Id>) -> Option<String> {
    let n = match id? {
        Id::String(s) => return Some(s.clone()),
        Id::Number(n) => n,
    };
    let text = match (n.as_i64(), n.as_f64()) {
        (Some(int), _) => int.to_string(),
        (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
        _ => n.to_string(),
    };
    Some(text)
}

pub fn paint_features(
    collection: &FeatureCollection,
    options: PaintOptions,
    scores: &LayerScores,
    table: &LegacyIsoTable,
) -> PaintedMap {
    let gradient = options.layer.style().gradient();
    let layer_scores = scores.get(options.layer);
    let empty = JsonObject::new();

    let mut summary = PaintSummary::default();
    let mut disputed = Vec::new();
    let mut others = Vec::new();

    for feature in &collection.features {
        let raw = feature.properties.as_ref().unwrap_or(&empty);
        let properties = GeoProperties::from_object(raw);
        let geo_id = geo_id_text(feature.id.as_ref());
        let resolution = resolve_feature(&properties, geo_id.as_deref(), table);
        let role = classify_feature(&properties, &resolution);

        let score = resolution
            .feature_id
            .as_ref()
            .and_then(|id| layer_scores.get_id(id));
        let color = gradient.color_for(score);
        let fill = if options.css_rgb {
            color.to_css_rgb()
        } else {
            color.to_hex()
        };

        let mut painted_properties = raw.clone();
        painted_properties.insert("feature_id".into(), json!(resolution.feature_id));
        painted_properties.insert("iso".into(), json!(resolution.iso));
        painted_properties.insert("iso_source".into(), json!(resolution.source));
        painted_properties.insert("score".into(), json!(score));
        painted_properties.insert("fill_color".into(), Value::String(fill));
        painted_properties.insert("role".into(), json!(role));
        painted_properties.insert("clickable".into(), Value::Bool(role.is_selectable()));

        let painted = Feature {
            bbox: feature.bbox.clone(),
            geometry: feature.geometry.clone(),
            id: feature.id.clone(),
            properties: Some(painted_properties),
            foreign_members: feature.foreign_members.clone(),
        };

        summary.total += 1;
        if score.is_some() {
            summary.scored += 1;
        } else {
            summary.no_data += 1;
        }
        match role {
            FeatureRole::Country => {
                summary.countries += 1;
                others.push(painted);
            }
            FeatureRole::Disputed => {
                summary.disputed += 1;
                disputed.push(painted);
            }
            FeatureRole::Inert => {
                summary.inert += 1;
                others.push(painted);
            }
        }
    }

    info!(
        "Painted {} features for layer {} ({} scored, {} no data, {} disputed)",
        summary.total, options.layer, summary.scored, summary.no_data, summary.disputed
    );

    disputed.extend(others);
    PaintedMap {
        collection: FeatureCollection {
            bbox: collection.bbox.clone(),
            features: disputed,
            foreign_members: collection.foreign_members.clone(),
        },
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::LayerSources;
    use crate::gradient::{Gradient, Rgb};
    use crate::master::MasterDataset;

    fn collection(features: Value) -> FeatureCollection {
        serde_json::from_value(json!({ "type": "FeatureCollection", "features": features })).unwrap()
    }

    fn feature(id: Value, properties: Value) -> Value {
        json!({
            "type": "Feature",
            "id": id,
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] },
            "properties": properties
        })
    }

    fn prop<'a>(feature: &'a Feature, key: &str) -> &'a Value {
        &feature.properties.as_ref().unwrap()[key]
    }

    #[test]
    fn test_paint_joins_scores_and_orders_disputed_first() {
        let china = json!({
            "countries": { "PAK": { "score": 80 } },
            "disputed": { "aksai": { "custom_geoid": "geo-aksai-chin", "score": 100 } }
        });
        let scores = LayerScores::from_sources(LayerSources {
            china: Some(&china),
            ..Default::default()
        });
        let map = collection(json!([
            feature(json!("586"), json!({ "name": "Pakistan" })),
            feature(json!("-99"), json!({ "custom_geoid": "geo-aksai-chin", "status": "Disputed" })),
            feature(json!(4), json!({ "NAME": "Afghanistan" })),
            feature(json!("-99"), json!({ "name": "Somaliland", "iso_a3": "-99" })),
        ]));

        let painted = paint_features(
            &map,
            PaintOptions { layer: Layer::China, css_rgb: false },
            &scores,
            &LegacyIsoTable::standard(),
        );
        let features = &painted.collection.features;

        assert_eq!(features.len(), 4);
        assert_eq!(prop(&features[0], "role"), "disputed");
        assert_eq!(prop(&features[0], "fill_color"), "#991b1b");
        assert_eq!(prop(&features[0], "clickable"), false);

        assert_eq!(prop(&features[1], "iso"), "PAK");
        assert_eq!(prop(&features[1], "iso_source"), "ISO_MAP");
        assert_eq!(prop(&features[1], "score"), 80.0);
        assert_eq!(prop(&features[1], "clickable"), true);

        assert_eq!(prop(&features[2], "iso"), "AFG");
        assert_eq!(prop(&features[2], "score"), &Value::Null);
        assert_eq!(prop(&features[2], "fill_color"), "#334155");

        assert_eq!(prop(&features[3], "role"), "inert");
        assert_eq!(prop(&features[3], "iso"), &Value::Null);
        assert_eq!(prop(&features[3], "name"), "Somaliland");

        assert_eq!(
            painted.summary,
            PaintSummary { total: 4, scored: 2, no_data: 2, countries: 2, disputed: 1, inert: 1 }
        );
    }

    #[test]
    fn test_integral_float_id_hits_legacy_table() {
        let float = |f: f64| Id::Number(serde_json::Number::from_f64(f).unwrap());
        assert_eq!(geo_id_text(Some(&float(4.0))).as_deref(), Some("4"));
        assert_eq!(geo_id_text(Some(&float(4.5))).as_deref(), Some("4.5"));
        assert_eq!(geo_id_text(Some(&Id::Number(392.into()))).as_deref(), Some("392"));
        assert_eq!(geo_id_text(Some(&Id::Number((-7).into()))).as_deref(), Some("-7"));
        assert_eq!(geo_id_text(Some(&Id::String("004".into()))).as_deref(), Some("004"));
        assert_eq!(geo_id_text(None), None);

        let map = collection(json!([feature(json!(4.0), json!({}))]));
        let painted = paint_features(&map, PaintOptions::default(), &LayerScores::default(), &LegacyIsoTable::standard());
        assert_eq!(prop(&painted.collection.features[0], "iso"), "AFG");
    }

    #[test]
    fn test_sentinel_iso_keys_still_join_scores() {
        let us = json!({ "countries": { "NOR": { "score": 90 } } });
        let scores = LayerScores::from_sources(LayerSources {
            us: Some(&us),
            ..Default::default()
        });
        let map = collection(json!([feature(
            json!("-99"),
            json!({ "NAME": "Norway", "ISO_A3": "-99", "ADM0_A3": "NOR" })
        )]));

        let painted = paint_features(
            &map,
            PaintOptions { layer: Layer::Us, css_rgb: false },
            &scores,
            &LegacyIsoTable::standard(),
        );
        let norway = &painted.collection.features[0];
        assert_eq!(prop(norway, "feature_id"), "NOR");
        assert_eq!(prop(norway, "iso"), "NOR");
        assert_eq!(prop(norway, "score"), 90.0);
        assert_ne!(prop(norway, "fill_color"), "#334155");
        assert_eq!(prop(norway, "clickable"), true);
    }

    #[test]
    fn test_css_rgb_output() {
        let resources = json!({ "countries": { "CHL": { "score": 0 } } });
        let scores = LayerScores::from_sources(LayerSources {
            resources: Some(&resources),
            ..Default::default()
        });
        let map = collection(json!([feature(json!("152"), json!({ "ISO_A3": "CHL" }))]));

        let painted = paint_features(
            &map,
            PaintOptions { layer: Layer::Resources, css_rgb: true },
            &scores,
            &LegacyIsoTable::empty(),
        );
        assert_eq!(prop(&painted.collection.features[0], "fill_color"), "rgb(71,85,105)");
    }

    #[test]
    fn test_feature_without_properties() {
        let map = collection(json!([{ "type": "Feature", "geometry": null, "properties": null }]));
        let painted = paint_features(&map, PaintOptions::default(), &LayerScores::default(), &LegacyIsoTable::standard());
        assert_eq!(painted.summary.inert, 1);
        assert_eq!(prop(&painted.collection.features[0], "fill_color"), "#334155");
    }

    #[test]
    fn test_end_to_end_japan() {
        let master = MasterDataset::from_value(&json!({
            "regions": { "Asia": [
                { "master": { "iso3": "JPN", "name": "Japan" },
                  "canonical": { "risk": { "fsi_total": { "value": 45.2 } } } }
            ] }
        }));
        let scores = LayerScores::from_sources(LayerSources {
            master: Some(&master),
            ..Default::default()
        });
        let fsi = Gradient::from_hex_stops(
            &[(0.0, "#06b6d4"), (60.0, "#8b5cf6"), (120.0, "#ef4444")],
            "#334155",
        )
        .unwrap();

        let properties = GeoProperties::from_object(json!({ "iso_a3": "JPN" }).as_object().unwrap());
        let resolution = resolve_feature(&properties, Some("392"), &LegacyIsoTable::standard());
        let score = scores.fsi.get_id(resolution.feature_id.as_ref().unwrap());

        let expected = Rgb::from_u32(0x06b6d4).mix(Rgb::from_u32(0x8b5cf6), 45.2 / 60.0);
        assert_eq!(fsi.color_for(score), expected);
        assert_eq!(expected, Rgb::new(106, 114, 238));
    }
}
