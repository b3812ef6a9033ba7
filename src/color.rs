use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

/// Interpolate between colour stops in linear RGB; `t` is clamped to [0, 1].
fn gradient(stops: &[(f32, f32, f32)], t: f64) -> Color32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) as f32 };
    let segments = (stops.len() - 1) as f32;
    let pos = t * segments;
    let i = (pos.floor() as usize).min(stops.len() - 2);
    let (r0, g0, b0) = stops[i];
    let (r1, g1, b1) = stops[i + 1];
    let a: LinSrgb = Srgb::new(r0, g0, b0).into_linear();
    let b: LinSrgb = Srgb::new(r1, g1, b1).into_linear();
    to_color32(Srgb::from_linear(a.mix(b, pos - i as f32)))
}

/// Sequential scale (dark purple → teal → yellow) for magnitudes in [0, 1].
pub fn sequential(t: f64) -> Color32 {
    const VIRIDIS: [(f32, f32, f32); 3] = [(0.267, 0.005, 0.329), (0.128, 0.567, 0.551), (0.993, 0.906, 0.144)];
    gradient(&VIRIDIS, t)
}

/// Diverging scale (blue → white → red) for coefficients in [-1, 1].
/// NaN renders grey.
pub fn diverging(r: f64) -> Color32 {
    const COOLWARM: [(f32, f32, f32); 3] = [(0.230, 0.299, 0.754), (0.865, 0.865, 0.865), (0.706, 0.016, 0.150)];
    if r.is_nan() {
        return Color32::GRAY;
    }
    gradient(&COOLWARM, (r + 1.0) / 2.0)
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a categorical column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given values, in their order.
    pub fn new(values: &[Value]) -> Self {
        let palette = generate_palette(values.len());
        let mapping: BTreeMap<Value, Color32> = values
            .iter()
            .zip(palette)
            .map(|(v, c)| (v.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}
