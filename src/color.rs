//! Colors, hue ramps and the scales that map statistics onto them.

use crate::catalog::MapStatistic;
use crate::stats::{Aggregates, Metric, Zone};
use std::fmt;

/// 8-bit RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fill for regions without data
    pub const TRANSPARENT: Rgba = Rgba::new(0xff, 0xff, 0xff, 0x00);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xff)
    }

    const fn hex(v: u32) -> Self {
        Self::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        let byte = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            3 => {
                let nib = |i: usize| {
                    let v = u8::from_str_radix(digits.get(i..i + 1)?, 16).ok()?;
                    Some(v * 17)
                };
                Some(Self::rgb(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Straight per-channel interpolation, alpha included
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8;
        Rgba::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Composite this color over an opaque backdrop
    pub fn over(self, backdrop: Rgba) -> Rgba {
        let alpha = self.a as f64 / 255.0;
        let mix = |fg: u8, bg: u8| (fg as f64 * alpha + bg as f64 * (1.0 - alpha)).round() as u8;
        Rgba::rgb(
            mix(self.r, backdrop.r),
            mix(self.g, backdrop.g),
            mix(self.b, backdrop.b),
        )
    }
}

impl fmt::Display for Rgba {
    /// `#rrggbb`, or `#rrggbbaa` when not opaque
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Stroke for the hovered region in zone mode, and for structural borders
pub const DARK: Rgba = Rgba::hex(0x343a40);

/// Base color of each metric (hover strokes, mesh tint)
pub fn case_color(metric: Metric) -> Rgba {
    match metric {
        Metric::Confirmed => Rgba::hex(0xff073a),
        Metric::Active => Rgba::hex(0x007bff),
        Metric::Recovered => Rgba::hex(0x28a745),
        Metric::Deceased => Rgba::hex(0x6c757d),
    }
}

pub fn zone_color(zone: Zone) -> Rgba {
    match zone {
        Zone::Red => Rgba::hex(0xd73027),
        Zone::Orange => Rgba::hex(0xfee08b),
        Zone::Green => Rgba::hex(0x66bd63),
    }
}

// ColorBrewer 9-class sequential schemes
const REDS: [u32; 9] = [
    0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
];
const BLUES: [u32; 9] = [
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
];
const GREENS: [u32; 9] = [
    0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
];
const GREYS: [u32; 9] = [
    0xffffff, 0xf0f0f0, 0xd9d9d9, 0xbdbdbd, 0x969696, 0x737373, 0x525252, 0x252525, 0x000000,
];

fn ramp_stops(metric: Metric) -> &'static [u32; 9] {
    match metric {
        Metric::Confirmed => &REDS,
        Metric::Active => &BLUES,
        Metric::Recovered => &GREENS,
        Metric::Deceased => &GREYS,
    }
}

/// Uniform cubic B-spline through `values`, t in [0, 1]
fn basis(values: &[f64], t: f64) -> f64 {
    let n = values.len() - 1;
    let (t, i) = if t <= 0.0 {
        (0.0, 0)
    } else if t >= 1.0 {
        (1.0, n - 1)
    } else {
        (t, (t * n as f64).floor() as usize)
    };
    let v1 = values[i];
    let v2 = values[i + 1];
    let v0 = if i > 0 { values[i - 1] } else { 2.0 * v1 - v2 };
    let v3 = if i < n - 1 { values[i + 2] } else { 2.0 * v2 - v1 };

    let t1 = (t - i as f64 / n as f64) * n as f64;
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

/// Sample the metric's hue ramp at `t` in [0, 1]
pub fn ramp(metric: Metric, t: f64) -> Rgba {
    let stops = ramp_stops(metric);
    let channel = |shift: u32| -> u8 {
        let values: [f64; 9] = std::array::from_fn(|i| ((stops[i] >> shift) & 0xff) as f64);
        basis(&values, t).round().clamp(0.0, 255.0) as u8
    };
    Rgba::rgb(channel(16), channel(8), channel(0))
}

/// Value to encode for one region
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RegionValue {
    Count(f64),
    Zone(Zone),
    Missing,
}

impl RegionValue {
    /// Zero and missing values are never colored
    pub fn is_empty(self) -> bool {
        match self {
            RegionValue::Count(n) => n == 0.0,
            RegionValue::Zone(_) => false,
            RegionValue::Missing => true,
        }
    }
}

/// Deterministic value -> color function. Rebuilt, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorScale {
    /// Clamped sequential scale over `[0, domain_max]` through a hue ramp
    Sequential {
        metric: Metric,
        domain_max: f64,
        ceiling: f64,
    },
    /// Fixed zone -> color mapping
    Categorical,
}

impl ColorScale {
    pub fn domain(&self) -> Option<(f64, f64)> {
        match self {
            ColorScale::Sequential { domain_max, .. } => Some((0.0, *domain_max)),
            ColorScale::Categorical => None,
        }
    }

    pub fn color(&self, value: RegionValue) -> Rgba {
        match (self, value) {
            (
                ColorScale::Sequential {
                    metric,
                    domain_max,
                    ceiling,
                },
                RegionValue::Count(n),
            ) => {
                let t = (n / domain_max).clamp(0.0, 1.0);
                ramp(*metric, t * ceiling)
            }
            (ColorScale::Categorical, RegionValue::Zone(zone)) => zone_color(zone),
            _ => Rgba::TRANSPARENT,
        }
    }
}

/// Builds the scale for the active statistic mode and metric
#[derive(Clone, Copy, Debug)]
pub struct ColorScaleEngine {
    /// Fraction of the hue ramp the scale may use
    pub ceiling: f64,
}

impl Default for ColorScaleEngine {
    fn default() -> Self {
        Self { ceiling: 0.85 }
    }
}

impl ColorScaleEngine {
    pub fn build(&self, statistic: MapStatistic, metric: Metric, aggregates: &Aggregates) -> ColorScale {
        match statistic {
            MapStatistic::Zone => ColorScale::Categorical,
            MapStatistic::Total => ColorScale::Sequential {
                metric,
                domain_max: aggregates.get(metric).max.max(1.0),
                ceiling: self.ceiling,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hex_roundtrip_formats() {
        assert_eq!(Rgba::from_hex("#ff073a"), Some(Rgba::rgb(0xff, 0x07, 0x3a)));
        assert_eq!(Rgba::from_hex("#00000060"), Some(Rgba::new(0, 0, 0, 0x60)));
        assert_eq!(Rgba::from_hex("#fff"), Some(Rgba::rgb(255, 255, 255)));
        assert_eq!(Rgba::from_hex("#12"), None);
        assert_eq!(case_color(Metric::Active).to_string(), "#007bff");
        assert_eq!(Rgba::TRANSPARENT.to_string(), "#ffffff00");
    }

    #[test]
    fn test_ramp_endpoints_match_scheme() {
        assert_eq!(ramp(Metric::Confirmed, 0.0), Rgba::hex(0xfff5f0));
        assert_eq!(ramp(Metric::Confirmed, 1.0), Rgba::hex(0x67000d));
        assert_eq!(ramp(Metric::Deceased, 0.0), Rgba::rgb(255, 255, 255));
    }

    #[test]
    fn test_ramp_darkens_monotonically() {
        let light = ramp(Metric::Active, 0.2);
        let dark = ramp(Metric::Active, 0.8);
        assert!(dark.r < light.r && dark.g < light.g);
    }

    #[test]
    fn test_domain_floor_is_one() {
        let engine = ColorScaleEngine::default();
        let scale = engine.build(MapStatistic::Total, Metric::Confirmed, &Aggregates::new());
        assert_eq!(scale.domain(), Some((0.0, 1.0)));

        let aggregates = Aggregates::new().with(Metric::Confirmed, 1000.0, 1000.0);
        let scale = engine.build(MapStatistic::Total, Metric::Confirmed, &aggregates);
        assert_eq!(scale.domain(), Some((0.0, 1000.0)));
    }

    #[test]
    fn test_max_maps_to_ceiling() {
        let aggregates = Aggregates::new().with(Metric::Recovered, 40.0, 90.0);
        let scale = ColorScaleEngine::default().build(MapStatistic::Total, Metric::Recovered, &aggregates);
        assert_eq!(scale.color(RegionValue::Count(40.0)), ramp(Metric::Recovered, 0.85));
        assert_eq!(scale.color(RegionValue::Count(20.0)), ramp(Metric::Recovered, 0.5 * 0.85));
    }

    #[test]
    fn test_zone_scale() {
        let scale = ColorScaleEngine::default().build(MapStatistic::Zone, Metric::Active, &Aggregates::new());
        assert_eq!(scale.color(RegionValue::Zone(Zone::Red)), Rgba::hex(0xd73027));
        assert_eq!(scale.color(RegionValue::Zone(Zone::Orange)), Rgba::hex(0xfee08b));
        assert_eq!(scale.color(RegionValue::Zone(Zone::Green)), Rgba::hex(0x66bd63));
        assert_eq!(scale.domain(), None);
    }

    #[test]
    fn test_empty_values() {
        assert!(RegionValue::Count(0.0).is_empty());
        assert!(RegionValue::Missing.is_empty());
        assert!(!RegionValue::Count(3.0).is_empty());
        assert!(!RegionValue::Zone(Zone::Green).is_empty());
    }

    proptest! {
        #[test]
        fn test_values_above_max_clamp(max in 1.0..1e6_f64, excess in 0.0..1e6_f64) {
            let aggregates = Aggregates::new().with(Metric::Confirmed, max, max);
            let scale = ColorScaleEngine::default().build(MapStatistic::Total, Metric::Confirmed, &aggregates);
            prop_assert_eq!(
                scale.color(RegionValue::Count(max + excess)),
                scale.color(RegionValue::Count(max))
            );
        }
    }
}
