//! Redefined FSI layer score
//!
//! The raw Fragile States Index runs 0-120. The map shows a 0-100 blend:
//!
//! ```text
//! score = clamp(fsi/120·100·0.85 + (100 - stability)·0.15, 0, 100)
//! ```
//!
//! A missing stability score contributes no penalty.

use crate::master::MasterDataset;
use tracing::debug;

const FSI_MAX: f64 = 120.0;
const W_FSI: f64 = 0.85;
const W_STABILITY: f64 = 0.15;

/// Blend a raw FSI total with the stability score, rounded to one decimal.
pub fn fsi_layer_score(fsi_total: Option<f64>, stability_score: Option<f64>) -> Option<f64> {
    let fsi = fsi_total.filter(|v| v.is_finite())?;
    let normalized = fsi / FSI_MAX * 100.0;
    let penalty = stability_score
        .filter(|v| v.is_finite())
        .map_or(0.0, |s| 100.0 - s);

    let blended = (normalized * W_FSI + penalty * W_STABILITY).clamp(0.0, 100.0);
    Some((blended * 10.0).round() / 10.0)
}

/// Copy of `master` with every computable `fsi_total.value` replaced by the
/// redefined layer score. Records without an FSI total are left as they are.
pub fn redefine_fsi_scores(master: &MasterDataset) -> MasterDataset {
    let mut redefined = master.clone();
    let mut updated = 0usize;

    for region in &mut redefined.regions {
        for record in &mut region.countries {
            let Some(score) = fsi_layer_score(record.fsi_total(), record.stability_score()) else {
                continue;
            };
            if record.replace_fsi_total(score) {
                updated += 1;
            }
        }
    }

    debug!("Redefined FSI layer score for {} records", updated);
    redefined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_fsi_scores;
    use serde_json::json;

    #[test]
    fn test_fsi_layer_score() {
        assert_eq!(fsi_layer_score(None, Some(50.0)), None);
        assert_eq!(fsi_layer_score(Some(120.0), None), Some(85.0));
        assert_eq!(fsi_layer_score(Some(60.0), Some(100.0)), Some(42.5));
        // 45.2/120*100*0.85 + 18*0.15 = 32.0166.. + 2.7
        assert_eq!(fsi_layer_score(Some(45.2), Some(82.0)), Some(34.7));
    }

    #[test]
    fn test_fsi_layer_score_clamps() {
        assert_eq!(fsi_layer_score(Some(200.0), Some(-100.0)), Some(100.0));
        assert_eq!(fsi_layer_score(Some(0.0), Some(200.0)), Some(0.0));
    }

    #[test]
    fn test_redefine_leaves_input_untouched() {
        let master = MasterDataset::from_value(&json!({
            "regions": {
                "Asia": [
                    {
                        "master": { "iso3": "JPN" },
                        "canonical": { "risk": { "fsi_total": { "value": 45.2 } } },
                        "ui_view": { "scores": { "stability_score": 82 } }
                    },
                    { "master": { "iso3": "TWN" } }
                ]
            }
        }));

        let redefined = redefine_fsi_scores(&master);
        assert_eq!(extract_fsi_scores(&master).get("JPN"), Some(45.2));
        assert_eq!(extract_fsi_scores(&redefined).get("JPN"), Some(34.7));
        assert_eq!(redefined.regions[0].countries[1], master.regions[0].countries[1]);
    }
}
