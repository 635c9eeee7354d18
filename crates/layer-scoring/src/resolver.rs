//! Feature-ID resolution for map geometry
//!
//! Geometry sources disagree on how they identify countries: some carry
//! `iso_a3`, some `ADM0_A3`, some only a numeric id, and disputed areas carry
//! synthetic ids. Two independent answers are computed per feature:
//!
//! - `iso`: a validated ISO 3166-1 alpha-3 code, which makes the feature selectable
//! - `feature_id`: the broader join key used for score lookups and disputed overlays

use crate::legacy_iso::LegacyIsoTable;
use crate::{FeatureId, SENTINEL_IDS};
use serde::Serialize;
use serde_json::{Map, Value};

/// Property keys the resolver knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKey {
    FeatureId,
    CustomGeoid,
    IsoA3,
    IsoA3Upper,
    Adm0A3,
    Adm0A3Upper,
}

impl PropertyKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            PropertyKey::FeatureId => "feature_id",
            PropertyKey::CustomGeoid => "custom_geoid",
            PropertyKey::IsoA3 => "iso_a3",
            PropertyKey::IsoA3Upper => "ISO_A3",
            PropertyKey::Adm0A3 => "adm0_a3",
            PropertyKey::Adm0A3Upper => "ADM0_A3",
        }
    }
}

/// ISO-bearing keys, in precedence order
pub const ISO_KEYS: [PropertyKey; 4] = [
    PropertyKey::IsoA3,
    PropertyKey::IsoA3Upper,
    PropertyKey::Adm0A3,
    PropertyKey::Adm0A3Upper,
];

/// Join-key precedence, broader than [`ISO_KEYS`]
pub const FEATURE_ID_KEYS: [PropertyKey; 6] = [
    PropertyKey::FeatureId,
    PropertyKey::CustomGeoid,
    PropertyKey::IsoA3,
    PropertyKey::IsoA3Upper,
    PropertyKey::Adm0A3,
    PropertyKey::Adm0A3Upper,
];

/// The subset of a feature's property bag the resolver reads.
///
/// Non-string values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoProperties {
    pub feature_id: Option<String>,
    pub custom_geoid: Option<String>,
    pub iso_a3: Option<String>,
    pub iso_a3_upper: Option<String>,
    pub adm0_a3: Option<String>,
    pub adm0_a3_upper: Option<String>,
    pub name: Option<String>,
    pub name_upper: Option<String>,
    /// `feature_type`, `feature_class`, `kind`, `status`, `boundary_type`
    pub classification: Vec<String>,
}

impl GeoProperties {
    pub fn from_object(properties: &Map<String, Value>) -> Self {
        let text = |key: &str| properties.get(key).and_then(Value::as_str).map(str::to_owned);

        Self {
            feature_id: text(PropertyKey::FeatureId.as_str()),
            custom_geoid: text(PropertyKey::CustomGeoid.as_str()),
            iso_a3: text(PropertyKey::IsoA3.as_str()),
            iso_a3_upper: text(PropertyKey::IsoA3Upper.as_str()),
            adm0_a3: text(PropertyKey::Adm0A3.as_str()),
            adm0_a3_upper: text(PropertyKey::Adm0A3Upper.as_str()),
            name: text("name"),
            name_upper: text("NAME"),
            classification: ["feature_type", "feature_class", "kind", "status", "boundary_type"]
                .into_iter()
                .filter_map(text)
                .collect(),
        }
    }

    pub fn get(&self, key: PropertyKey) -> Option<&str> {
        match key {
            PropertyKey::FeatureId => self.feature_id.as_deref(),
            PropertyKey::CustomGeoid => self.custom_geoid.as_deref(),
            PropertyKey::IsoA3 => self.iso_a3.as_deref(),
            PropertyKey::IsoA3Upper => self.iso_a3_upper.as_deref(),
            PropertyKey::Adm0A3 => self.adm0_a3.as_deref(),
            PropertyKey::Adm0A3Upper => self.adm0_a3_upper.as_deref(),
        }
    }

    /// Display name: `name`, then `NAME`
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.name_upper.as_deref())
    }

    /// First key in `keys` whose value passes `accept`.
    pub fn first_match<T>(
        &self,
        keys: &[PropertyKey],
        accept: impl Fn(&str) -> Option<T>,
    ) -> Option<(PropertyKey, T)> {
        keys.iter()
            .find_map(|key| self.get(*key).and_then(&accept).map(|v| (*key, v)))
    }
}

/// Where a resolved ISO code came from. Serialises as its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoSource {
    Property(PropertyKey),
    LegacyTable,
    NameOverride,
    Unresolved,
}

impl IsoSource {
    pub fn label(&self) -> String {
        match self {
            IsoSource::Property(key) => format!("properties.{}", key.as_str()),
            IsoSource::LegacyTable => "ISO_MAP".to_string(),
            IsoSource::NameOverride => "name_override".to_string(),
            IsoSource::Unresolved => "unresolved".to_string(),
        }
    }
}

impl Serialize for IsoSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// Per-feature resolution result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureResolution {
    pub iso: Option<String>,
    pub feature_id: Option<FeatureId>,
    pub source: IsoSource,
    pub clickable: bool,
    pub name: Option<String>,
}

/// Trim, reject sentinels, uppercase; `None` for anything that is not a
/// three-letter code.
pub fn normalise_iso(raw: &str) -> Option<String> {
    let iso = raw.trim().to_uppercase();
    if SENTINEL_IDS.contains(&iso.as_str()) {
        return None;
    }
    is_iso_alpha3(&iso).then_some(iso)
}

pub fn is_iso_alpha3(value: &str) -> bool {
    value.len() == 3 && value.bytes().all(|b| b.is_ascii_uppercase())
}

/// Broad join key for score lookups. Sentinels fall through to the next key.
pub fn resolve_feature_id(properties: &GeoProperties) -> Option<FeatureId> {
    properties
        .first_match(&FEATURE_ID_KEYS, FeatureId::normalise)
        .map(|(_, id)| id)
}

/// Resolve a feature's identity.
///
/// `geo_id` is the feature's raw top-level id (numeric ids already rendered as
/// strings). ISO attempts, first success wins: ISO-bearing properties, the
/// legacy id table, the table's name overrides.
pub fn resolve_feature(
    properties: &GeoProperties,
    geo_id: Option<&str>,
    table: &LegacyIsoTable,
) -> FeatureResolution {
    let feature_id = resolve_feature_id(properties);
    let name = properties.display_name().map(str::to_owned);

    let from_properties = properties
        .first_match(&ISO_KEYS, normalise_iso)
        .map(|(key, iso)| (iso, IsoSource::Property(key)));

    let from_table = || {
        geo_id
            .and_then(|id| table.lookup_id(id))
            .filter(|iso| is_iso_alpha3(iso))
            .map(|iso| (iso.to_string(), IsoSource::LegacyTable))
    };

    let from_name = || {
        properties
            .display_name()
            .and_then(|n| table.lookup_name(n))
            .filter(|iso| is_iso_alpha3(iso))
            .map(|iso| (iso.to_string(), IsoSource::NameOverride))
    };

    match from_properties.or_else(from_table).or_else(from_name) {
        Some((iso, source)) => FeatureResolution {
            feature_id: feature_id.or_else(|| FeatureId::normalise(&iso)),
            iso: Some(iso),
            source,
            clickable: true,
            name,
        },
        None => FeatureResolution {
            iso: None,
            feature_id,
            source: IsoSource::Unresolved,
            clickable: false,
            name,
        },
    }
}

/// Disputed if any classification property mentions "disputed" in any case.
pub fn is_disputed(properties: &GeoProperties) -> bool {
    properties
        .classification
        .iter()
        .any(|token| token.to_lowercase().contains("disputed"))
}

/// How the rendering layer should treat a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureRole {
    /// Normal fill, selectable
    Country,
    /// Drawn in the overlay below countries, never selectable
    Disputed,
    /// Drawn as "no data", not interactive
    Inert,
}

impl FeatureRole {
    pub fn is_selectable(&self) -> bool {
        matches!(self, FeatureRole::Country)
    }
}

/// Combine ISO resolution with disputed classification.
pub fn classify_feature(properties: &GeoProperties, resolution: &FeatureResolution) -> FeatureRole {
    if is_disputed(properties) {
        FeatureRole::Disputed
    } else if resolution.clickable {
        FeatureRole::Country
    } else {
        FeatureRole::Inert
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy_iso::NAME_OVERRIDES;
    use serde_json::json;

    fn props(value: Value) -> GeoProperties {
        GeoProperties::from_object(value.as_object().unwrap())
    }

    fn resolve(value: Value, geo_id: Option<&str>) -> FeatureResolution {
        resolve_feature(&props(value), geo_id, &LegacyIsoTable::standard())
    }

    #[test]
    fn test_sentinel_iso_is_unresolved() {
        let r = resolve(json!({ "iso_a3": "-99" }), None);
        assert_eq!(r.iso, None);
        assert!(!r.clickable);
        assert_eq!(r.source, IsoSource::Unresolved);
        assert_eq!(r.source.label(), "unresolved");
    }

    #[test]
    fn test_iso_is_case_normalised() {
        let r = resolve(json!({ "iso_a3": "usa", "name": "United States" }), None);
        assert_eq!(r.iso.as_deref(), Some("USA"));
        assert!(r.clickable);
        assert_eq!(r.source.label(), "properties.iso_a3");
        assert_eq!(r.name.as_deref(), Some("United States"));
        assert_eq!(r.feature_id.unwrap().as_str(), "USA");
    }

    #[test]
    fn test_iso_key_precedence() {
        let r = resolve(json!({ "iso_a3": "-99", "ISO_A3": "---", "adm0_a3": "kos", "ADM0_A3": "SRB" }), None);
        assert_eq!(r.iso.as_deref(), Some("KOS"));
        assert_eq!(r.source, IsoSource::Property(PropertyKey::Adm0A3));
    }

    #[test]
    fn test_iso_shape_is_enforced() {
        for bad in ["US", "USAA", "U1A", "N/A"] {
            let r = resolve(json!({ "iso_a3": bad }), None);
            assert!(r.iso.is_none(), "{bad}");
        }
        let numeric = resolve(json!({ "iso_a3": 840 }), None);
        assert!(numeric.iso.is_none());
    }

    #[test]
    fn test_legacy_fallback() {
        let r = resolve(json!({}), Some("004"));
        assert_eq!(r.iso.as_deref(), Some("AFG"));
        assert_eq!(r.source.label(), "ISO_MAP");
        assert!(r.clickable);
        assert_eq!(r.feature_id.unwrap().as_str(), "AFG");

        let padded = resolve(json!({ "NAME": "Afghanistan" }), Some("4"));
        assert_eq!(padded.iso.as_deref(), Some("AFG"));
        assert_eq!(padded.name.as_deref(), Some("Afghanistan"));
    }

    #[test]
    fn test_properties_beat_legacy_table() {
        let r = resolve(json!({ "ISO_A3": "FRA" }), Some("392"));
        assert_eq!(r.iso.as_deref(), Some("FRA"));
    }

    #[test]
    fn test_generic_feature_id_without_iso() {
        let r = resolve(
            json!({ "custom_geoid": "geo-aksai-chin", "iso_a3": "-99", "status": "disputed" }),
            None,
        );
        assert!(r.iso.is_none());
        assert!(!r.clickable);
        assert_eq!(r.feature_id.unwrap().as_str(), "GEO-AKSAI-CHIN");
    }

    #[test]
    fn test_sentinel_feature_id_falls_through() {
        let r = resolve(json!({ "ISO_A3": "-99", "ADM0_A3": "NOR", "NAME": "Norway" }), None);
        assert_eq!(r.iso.as_deref(), Some("NOR"));
        assert_eq!(r.feature_id.unwrap().as_str(), "NOR");

        let r = resolve(json!({ "feature_id": "---", "custom_geoid": "-99", "iso_a3": "FRA" }), None);
        assert_eq!(r.feature_id.unwrap().as_str(), "FRA");

        let r = resolve(json!({ "iso_a3": "-99", "name": "Somaliland" }), Some("-99"));
        assert!(r.feature_id.is_none());
    }

    #[test]
    fn test_feature_id_prefers_explicit_key() {
        let r = resolve(json!({ "feature_id": "geo-crimea", "iso_a3": "UKR" }), None);
        assert_eq!(r.iso.as_deref(), Some("UKR"));
        assert_eq!(r.feature_id.unwrap().as_str(), "GEO-CRIMEA");
    }

    #[test]
    fn test_name_override_when_configured() {
        let table = LegacyIsoTable::standard().with_name_overrides(NAME_OVERRIDES.iter().copied());
        let properties = props(json!({ "name": "N. Cyprus", "iso_a3": "-99" }));

        let r = resolve_feature(&properties, Some("-99"), &table);
        assert_eq!(r.iso.as_deref(), Some("CYP"));
        assert_eq!(r.source, IsoSource::NameOverride);

        let plain = resolve_feature(&properties, Some("-99"), &LegacyIsoTable::standard());
        assert!(plain.iso.is_none());
    }

    #[test]
    fn test_disputed_classification() {
        assert!(is_disputed(&props(json!({ "status": "Disputed" }))));
        assert!(is_disputed(&props(json!({ "boundary_type": "DISPUTED_BORDER" }))));
        assert!(is_disputed(&props(json!({ "kind": "disputed" }))));
        assert!(!is_disputed(&props(json!({ "status": "Definite" }))));
        assert!(!is_disputed(&props(json!({ "status": 1, "name": "disputed" }))));
    }

    #[test]
    fn test_classify_feature_roles() {
        let table = LegacyIsoTable::standard();
        let cases = [
            (json!({ "iso_a3": "IND" }), FeatureRole::Country),
            (json!({ "iso_a3": "IND", "feature_type": "Disputed area" }), FeatureRole::Disputed),
            (json!({ "custom_geoid": "GEO-X", "status": "disputed" }), FeatureRole::Disputed),
            (json!({ "custom_geoid": "GEO-X" }), FeatureRole::Inert),
        ];
        for (value, expected) in cases {
            let properties = props(value);
            let resolution = resolve_feature(&properties, None, &table);
            let role = classify_feature(&properties, &resolution);
            assert_eq!(role, expected, "{properties:?}");
        }
        assert!(FeatureRole::Country.is_selectable());
        assert!(!FeatureRole::Disputed.is_selectable());
    }
}
