use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| hsl_to_color32((i as f32 / n as f32) * 360.0, 0.75, 0.55))
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: crop name → Color32
// ---------------------------------------------------------------------------

/// Maps crop names to distinct, stable colours across all charts.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(keys: &[String]) -> Self {
        let mapping = keys
            .iter()
            .cloned()
            .zip(generate_palette(keys.len()))
            .collect();
        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, key: &str) -> Color32 {
        self.mapping.get(key).copied().unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Sequential scale for the yield map
// ---------------------------------------------------------------------------

/// Pale yellow (low yield) to deep green (high yield).
#[derive(Debug, Clone, Copy)]
pub struct SequentialScale {
    min: f64,
    max: f64,
}

impl SequentialScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Position of `value` in `[0, 1]`; a degenerate range maps to the middle.
    pub fn fraction(&self, value: f64) -> f32 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            0.5
        } else {
            ((value - self.min) / span).clamp(0.0, 1.0) as f32
        }
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let t = self.fraction(value);
        hsl_to_color32(55.0 + 75.0 * t, 0.70, 0.78 - 0.48 * t)
    }
}
