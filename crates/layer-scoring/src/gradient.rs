//! Gradient colour mapping
//!
//! Piecewise-linear interpolation over `[score, colour]` stops, channel by
//! channel, rounding to the nearest integer. Scores outside the stop domain
//! saturate to the end colours; a missing score gets the layer's no-data colour.

use crate::{Layer, Result, ScoringError};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 8-bit sRGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a packed `0xRRGGBB` literal
    pub const fn from_u32(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
        }
    }

    /// Parse `#rrggbb` or `rrggbb` (case-insensitive)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || ScoringError::InvalidColor(hex.to_string());

        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).map_err(|_| invalid());

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// `#rrggbb`, lowercase
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `rgb(r,g,b)`
    pub fn to_css_rgb(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    /// Linear mix; `t` is clamped to [0, 1].
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let lerp = |a: u8, b: u8| {
            let a = f64::from(a);
            (a + (f64::from(b) - a) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: lerp(self.r, other.r),
            g: lerp(self.g, other.g),
            b: lerp(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// A single `[score, colour]` stop
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorStop {
    pub score: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(score: f64, color: Rgb) -> Self {
        Self { score, color }
    }
}

/// Validated, strictly increasing stop sequence plus a no-data colour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gradient {
    stops: Vec<ColorStop>,
    no_data: Rgb,
}

impl Gradient {
    pub fn new(stops: Vec<ColorStop>, no_data: Rgb) -> Result<Self> {
        let Some(first) = stops.first() else {
            return Err(ScoringError::EmptyGradient);
        };
        if !first.score.is_finite() {
            return Err(ScoringError::NonFiniteStop(first.score));
        }
        for pair in stops.windows(2) {
            if let [prev, next] = pair {
                if !next.score.is_finite() {
                    return Err(ScoringError::NonFiniteStop(next.score));
                }
                if next.score <= prev.score {
                    return Err(ScoringError::UnorderedStops {
                        prev: prev.score,
                        next: next.score,
                    });
                }
            }
        }
        Ok(Self { stops, no_data })
    }

    /// Build from `(score, "#rrggbb")` pairs, the shape layer configs use.
    pub fn from_hex_stops(stops: &[(f64, &str)], no_data: &str) -> Result<Self> {
        let stops = stops
            .iter()
            .map(|(score, hex)| Ok(ColorStop::new(*score, Rgb::from_hex(hex)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(stops, Rgb::from_hex(no_data)?)
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn no_data(&self) -> Rgb {
        self.no_data
    }

    /// Colour for a score. `None` and non-finite scores map to the no-data
    /// colour; out-of-range scores saturate to the nearest end stop.
    pub fn color_for(&self, score: Option<f64>) -> Rgb {
        let Some(score) = score.filter(|s| s.is_finite()) else {
            return self.no_data;
        };
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return self.no_data;
        };
        if score <= first.score {
            return first.color;
        }
        if score >= last.score {
            return last.color;
        }

        self.stops
            .windows(2)
            .find_map(|pair| match pair {
                [low, high] if score <= high.score => {
                    let t = (score - low.score) / (high.score - low.score);
                    Some(low.color.mix(high.color, t))
                }
                _ => None,
            })
            .unwrap_or(last.color)
    }
}

/// Legacy low → mid → high scale split at the half-way point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreeColorScale {
    pub low: Rgb,
    pub mid: Rgb,
    pub high: Rgb,
    /// Score that maps to `high`
    pub max: f64,
    pub no_data: Rgb,
}

impl ThreeColorScale {
    /// Cyan → purple → red risk scale
    pub const LEGACY_RISK: Self = Self {
        low: Rgb::from_u32(0x06b6d4),
        mid: Rgb::from_u32(0x8b5cf6),
        high: Rgb::from_u32(0xef4444),
        max: 100.0,
        no_data: Rgb::from_u32(0x1e293b),
    };

    /// Slate → amber → crimson
    pub const CHINA: Self = Self {
        low: Rgb::from_u32(0x6b7280),
        mid: Rgb::from_u32(0xfbbf24),
        high: Rgb::from_u32(0xdc2626),
        max: 100.0,
        no_data: Rgb::from_u32(0x1e293b),
    };

    /// Navy → royal blue → light blue
    pub const US: Self = Self {
        low: Rgb::from_u32(0x0f172a),
        mid: Rgb::from_u32(0x2563eb),
        high: Rgb::from_u32(0xdbeafe),
        max: 100.0,
        no_data: Rgb::from_u32(0x1e293b),
    };

    pub fn color_for(&self, score: Option<f64>) -> Rgb {
        let Some(score) = score.filter(|s| s.is_finite()) else {
            return self.no_data;
        };
        let t = if self.max > 0.0 {
            (score / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if t < 0.5 {
            self.low.mix(self.mid, t / 0.5)
        } else {
            self.mid.mix(self.high, (t - 0.5) / 0.5)
        }
    }
}

/// Legend and palette for one layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerStyle {
    pub layer: Layer,
    pub title: &'static str,
    pub subtitle: &'static str,
    /// CSS `linear-gradient(...)` for the legend bar
    pub css_gradient: &'static str,
    pub labels: [&'static str; 5],
    pub stops: &'static [ColorStop],
    pub no_data: Rgb,
}

const NO_DATA: Rgb = Rgb::from_u32(0x334155);
const LEGEND_LABELS: [&str; 5] = ["0", "25", "50", "75", "100"];

pub const FSI_STYLE: LayerStyle = LayerStyle {
    layer: Layer::Fsi,
    title: "Fragile States Index (FSI)",
    subtitle: "Redefined Risk Score (0-100)",
    css_gradient: "linear-gradient(to right, #06b6d4, #8b5cf6, #ef4444)",
    labels: LEGEND_LABELS,
    stops: &[
        ColorStop::new(0.0, Rgb::from_u32(0x06b6d4)),
        ColorStop::new(50.0, Rgb::from_u32(0x8b5cf6)),
        ColorStop::new(100.0, Rgb::from_u32(0xef4444)),
    ],
    no_data: NO_DATA,
};

pub const US_STYLE: LayerStyle = LayerStyle {
    layer: Layer::Us,
    title: "US Influence Sphere",
    subtitle: "Diplomatic & Military Alignment (0-100)",
    css_gradient: "linear-gradient(to right, #0f172a, #1e40af, #3b82f6, #93c5fd)",
    labels: LEGEND_LABELS,
    stops: &[
        ColorStop::new(0.0, Rgb::from_u32(0x0f172a)),
        ColorStop::new(35.0, Rgb::from_u32(0x1e40af)),
        ColorStop::new(70.0, Rgb::from_u32(0x3b82f6)),
        ColorStop::new(100.0, Rgb::from_u32(0x93c5fd)),
    ],
    no_data: NO_DATA,
};

pub const CHINA_STYLE: LayerStyle = LayerStyle {
    layer: Layer::China,
    title: "China Influence Sphere",
    subtitle: "Economic & Political Alignment (0-100)",
    css_gradient: "linear-gradient(to right, #6b7280, #fbbf24, #ef4444, #991b1b)",
    labels: LEGEND_LABELS,
    stops: &[
        ColorStop::new(0.0, Rgb::from_u32(0x6b7280)),
        ColorStop::new(35.0, Rgb::from_u32(0xfbbf24)),
        ColorStop::new(70.0, Rgb::from_u32(0xef4444)),
        ColorStop::new(100.0, Rgb::from_u32(0x991b1b)),
    ],
    no_data: NO_DATA,
};

pub const RESOURCES_STYLE: LayerStyle = LayerStyle {
    layer: Layer::Resources,
    title: "Resource Strategy Index",
    subtitle: "Critical Minerals & Energy (0-100)",
    css_gradient: "linear-gradient(to right, #475569, #50C878, #D4AF37, #CD7F32)",
    labels: LEGEND_LABELS,
    stops: &[
        ColorStop::new(0.0, Rgb::from_u32(0x475569)),
        ColorStop::new(35.0, Rgb::from_u32(0x50c878)),
        ColorStop::new(70.0, Rgb::from_u32(0xd4af37)),
        ColorStop::new(100.0, Rgb::from_u32(0xcd7f32)),
    ],
    no_data: NO_DATA,
};

impl LayerStyle {
    /// Gradient over this layer's stops. The built-in stops are increasing,
    /// so the checked constructor is skipped.
    pub fn gradient(&self) -> Gradient {
        Gradient {
            stops: self.stops.to_vec(),
            no_data: self.no_data,
        }
    }
}

impl Layer {
    pub fn style(self) -> &'static LayerStyle {
        match self {
            Layer::Fsi => &FSI_STYLE,
            Layer::China => &CHINA_STYLE,
            Layer::Us => &US_STYLE,
            Layer::Resources => &RESOURCES_STYLE,
        }
    }

    pub fn color_for(self, score: Option<f64>) -> Rgb {
        self.style().gradient().color_for(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey_ramp() -> Gradient {
        Gradient::from_hex_stops(&[(0.0, "#000000"), (100.0, "#ffffff")], "#334155").unwrap()
    }

    #[test]
    fn test_hex_round_trip() {
        let c = Rgb::from_hex("#50C878").unwrap();
        assert_eq!(c, Rgb::new(0x50, 0xc8, 0x78));
        assert_eq!(c.to_hex(), "#50c878");
        assert_eq!(c.to_css_rgb(), "rgb(80,200,120)");
        assert_eq!("06b6d4".parse::<Rgb>().unwrap(), Rgb::from_u32(0x06b6d4));
    }

    #[test]
    fn test_hex_rejects_malformed() {
        for bad in ["", "#fff", "#gggggg", "#1234567", "#12345é"] {
            assert!(Rgb::from_hex(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_no_data_is_exact() {
        let g = grey_ramp();
        assert_eq!(g.color_for(None), Rgb::from_u32(0x334155));
        assert_eq!(g.color_for(Some(f64::NAN)), g.no_data());
        assert_eq!(g.color_for(Some(f64::NEG_INFINITY)), g.no_data());
    }

    #[test]
    fn test_boundaries_and_midpoint() {
        let g = grey_ramp();
        assert_eq!(g.color_for(Some(0.0)).to_hex(), "#000000");
        assert_eq!(g.color_for(Some(100.0)).to_hex(), "#ffffff");
        assert_eq!(g.color_for(Some(50.0)).to_hex(), "#808080");
    }

    #[test]
    fn test_out_of_range_saturates() {
        let g = grey_ramp();
        assert_eq!(g.color_for(Some(-20.0)).to_hex(), "#000000");
        assert_eq!(g.color_for(Some(250.0)).to_hex(), "#ffffff");
    }

    #[test]
    fn test_bracketing_stop_pair() {
        let g = Gradient::from_hex_stops(
            &[(0.0, "#000000"), (10.0, "#ff0000"), (20.0, "#ff00ff")],
            "#000000",
        )
        .unwrap();
        assert_eq!(g.color_for(Some(10.0)), Rgb::new(255, 0, 0));
        assert_eq!(g.color_for(Some(15.0)), Rgb::new(255, 0, 128));
        assert_eq!(g.color_for(Some(2.5)), Rgb::new(64, 0, 0));
    }

    #[test]
    fn test_single_stop_gradient() {
        let g = Gradient::from_hex_stops(&[(5.0, "#123456")], "#000000").unwrap();
        assert_eq!(g.color_for(Some(-1.0)).to_hex(), "#123456");
        assert_eq!(g.color_for(Some(99.0)).to_hex(), "#123456");
    }

    #[test]
    fn test_gradient_validation() {
        assert!(matches!(Gradient::new(vec![], Rgb::new(0, 0, 0)), Err(ScoringError::EmptyGradient)));
        assert!(matches!(
            Gradient::from_hex_stops(&[(0.0, "#000000"), (0.0, "#ffffff")], "#000000"),
            Err(ScoringError::UnorderedStops { .. })
        ));
        assert!(matches!(
            Gradient::from_hex_stops(&[(0.0, "#000000"), (f64::NAN, "#ffffff")], "#000000"),
            Err(ScoringError::NonFiniteStop(_))
        ));
        assert!(matches!(
            Gradient::from_hex_stops(&[(0.0, "black")], "#000000"),
            Err(ScoringError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_builtin_styles_are_valid() {
        for layer in Layer::ALL {
            let style = layer.style();
            assert_eq!(style.layer, layer);
            assert!(Gradient::new(style.stops.to_vec(), style.no_data).is_ok(), "{layer}");
            assert_eq!(layer.color_for(None).to_hex(), "#334155");
        }
    }

    #[test]
    fn test_layer_palette_endpoints() {
        assert_eq!(Layer::Fsi.color_for(Some(0.0)).to_hex(), "#06b6d4");
        assert_eq!(Layer::Fsi.color_for(Some(50.0)).to_hex(), "#8b5cf6");
        assert_eq!(Layer::China.color_for(Some(100.0)).to_hex(), "#991b1b");
        assert_eq!(Layer::Us.color_for(Some(35.0)).to_hex(), "#1e40af");
        assert_eq!(Layer::Resources.color_for(Some(70.0)).to_hex(), "#d4af37");
    }

    #[test]
    fn test_three_color_scale() {
        let scale = ThreeColorScale::LEGACY_RISK;
        assert_eq!(scale.color_for(None).to_hex(), "#1e293b");
        assert_eq!(scale.color_for(Some(0.0)).to_hex(), "#06b6d4");
        assert_eq!(scale.color_for(Some(50.0)).to_hex(), "#8b5cf6");
        assert_eq!(scale.color_for(Some(100.0)).to_hex(), "#ef4444");
        assert_eq!(scale.color_for(Some(180.0)).to_hex(), "#ef4444");
        // quarter way: half between low and mid
        assert_eq!(scale.color_for(Some(25.0)), Rgb::from_u32(0x06b6d4).mix(Rgb::from_u32(0x8b5cf6), 0.5));
        assert_eq!(ThreeColorScale::US.color_for(Some(100.0)).to_hex(), "#dbeafe");
        assert_eq!(ThreeColorScale::CHINA.color_for(Some(0.0)).to_hex(), "#6b7280");
    }
}
