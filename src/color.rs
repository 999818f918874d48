use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

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
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the categories of a chart (regions, products, …) to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the categories present.
    pub fn new<'a>(categories: impl IntoIterator<Item = &'a Value>) -> Self {
        let unique: BTreeSet<&Value> = categories.into_iter().filter(|v| !v.is_null()).collect();
        let palette = generate_palette(unique.len());
        let mapping = unique
            .into_iter()
            .cloned()
            .zip(palette)
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given category.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn unknown_and_null_categories_are_gray() {
        let values = [
            Value::Text("East".into()),
            Value::Null,
            Value::Text("West".into()),
            Value::Text("East".into()),
        ];
        let map = ColorMap::new(&values);
        assert_eq!(map.mapping.len(), 2);
        assert_eq!(map.color_for(&Value::Null), Color32::GRAY);
        assert_eq!(map.color_for(&Value::Text("North".into())), Color32::GRAY);
        assert_ne!(
            map.color_for(&Value::Text("East".into())),
            map.color_for(&Value::Text("West".into()))
        );
    }
}
