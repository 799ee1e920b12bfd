//! Color resolution for shapes.
//!
//! A STEP file may color a shape on its instance, on its prototype label,
//! or not at all. Viewers only ever read instance colors, so resolution
//! doubles as normalization: whatever color is found is written back onto
//! the shape at every scope.

use std::fmt;

use serde::Serialize;
use stepview_kernel::{CafDocument, ColorType, Rgb};

use crate::config::WalkConfig;

/// Where a resolved color came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSource {
    /// The shape itself carried the color.
    Instance(ColorType),
    /// The shape's label carried the color.
    Label(ColorType),
    /// Nothing did; the configured default was used.
    Default,
}

impl fmt::Display for ColorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSource::Instance(scope) => write!(f, "instance/{scope}"),
            ColorSource::Label(scope) => write!(f, "label/{scope}"),
            ColorSource::Default => f.write_str("default"),
        }
    }
}

/// A resolved color and its origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedColor {
    /// The color to display.
    pub color: Rgb,
    /// Where it came from.
    pub source: ColorSource,
}

/// Resolve the color of `shape` (attached to `label`) and normalize it onto
/// the shape's instance colors.
///
/// Instance colors are probed first, then label colors, each in the scope
/// order of `config`. Scopes the config leaves out are probed after the
/// listed ones. A found color is set on `shape` at every scope; the default
/// color is never written. Running this twice is a no-op the second time:
/// the first run leaves an instance color at every scope.
pub fn normalize_color<D: CafDocument>(
    doc: &mut D,
    shape: &D::Shape,
    label: &D::Label,
    config: &WalkConfig,
) -> ResolvedColor {
    let scopes: Vec<ColorType> = config
        .color_scopes
        .iter()
        .copied()
        .chain(
            ColorType::ALL
                .into_iter()
                .filter(|scope| !config.color_scopes.contains(scope)),
        )
        .collect();

    let found = scopes
        .iter()
        .find_map(|&scope| {
            doc.instance_color(shape, scope)
                .map(|color| (color, ColorSource::Instance(scope)))
        })
        .or_else(|| {
            scopes.iter().find_map(|&scope| {
                doc.label_color(label, scope)
                    .map(|color| (color, ColorSource::Label(scope)))
            })
        });

    match found {
        Some((color, source)) => {
            for scope in ColorType::ALL {
                doc.set_instance_color(shape, scope, color);
            }
            ResolvedColor { color, source }
        }
        None => ResolvedColor {
            color: config.default_color,
            source: ColorSource::Default,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepview_kernel::MemoryDocument;

    const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
    const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);

    #[test]
    fn test_instance_color_wins_over_label_color() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("p");
        let shape = doc.shape(&part).unwrap();
        doc.set_label_color(part, ColorType::Surface, BLUE).unwrap();
        doc.set_instance_color(&shape, ColorType::Curve, RED);

        let resolved = normalize_color(&mut doc, &shape, &part, &WalkConfig::default());
        assert_eq!(resolved.color, RED);
        assert_eq!(resolved.source, ColorSource::Instance(ColorType::Curve));
        for scope in ColorType::ALL {
            assert_eq!(doc.instance_color(&shape, scope), Some(RED));
        }
    }

    #[test]
    fn test_label_color_is_written_back() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("p");
        let shape = doc.shape(&part).unwrap();
        doc.set_label_color(part, ColorType::Generic, BLUE).unwrap();

        let resolved = normalize_color(&mut doc, &shape, &part, &WalkConfig::default());
        assert_eq!(resolved.color, BLUE);
        assert_eq!(resolved.source, ColorSource::Label(ColorType::Generic));
        assert_eq!(doc.instance_color(&shape, ColorType::Surface), Some(BLUE));
        assert_eq!(doc.instance_color(&shape, ColorType::Generic), Some(BLUE));
    }

    #[test]
    fn test_no_color_uses_default_without_writing() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("p");
        let shape = doc.shape(&part).unwrap();

        let resolved = normalize_color(&mut doc, &shape, &part, &WalkConfig::default());
        assert_eq!(resolved.color, Rgb::MID_GRAY);
        assert_eq!(resolved.source, ColorSource::Default);
        assert_eq!(doc.instance_color_count(), 0);
    }

    #[test]
    fn test_scope_order_follows_config() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("p");
        let shape = doc.shape(&part).unwrap();
        doc.set_instance_color(&shape, ColorType::Generic, BLUE);
        doc.set_instance_color(&shape, ColorType::Surface, RED);

        let resolved = normalize_color(&mut doc, &shape, &part, &WalkConfig::default());
        assert_eq!(resolved.color, RED);

        let mut doc2 = MemoryDocument::new();
        let part2 = doc2.add_part("p");
        let shape2 = doc2.shape(&part2).unwrap();
        doc2.set_instance_color(&shape2, ColorType::Generic, BLUE);
        doc2.set_instance_color(&shape2, ColorType::Surface, RED);
        let config = WalkConfig {
            color_scopes: vec![ColorType::Generic, ColorType::Surface, ColorType::Curve],
            ..WalkConfig::default()
        };
        let resolved = normalize_color(&mut doc2, &shape2, &part2, &config);
        assert_eq!(resolved.color, BLUE);
    }

    #[test]
    fn test_unlisted_scopes_are_still_probed() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("p");
        let shape = doc.shape(&part).unwrap();
        doc.set_label_color(part, ColorType::Surface, RED).unwrap();
        let config = WalkConfig {
            color_scopes: vec![ColorType::Generic],
            ..WalkConfig::default()
        };

        let resolved = normalize_color(&mut doc, &shape, &part, &config);
        assert_eq!(resolved.color, RED);
        assert_eq!(resolved.source, ColorSource::Label(ColorType::Surface));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("p");
        let shape = doc.shape(&part).unwrap();
        doc.set_label_color(part, ColorType::Curve, BLUE).unwrap();

        let config = WalkConfig::default();
        let first = normalize_color(&mut doc, &shape, &part, &config);
        let count = doc.instance_color_count();
        let second = normalize_color(&mut doc, &shape, &part, &config);
        assert_eq!(first.color, second.color);
        assert_eq!(second.source, ColorSource::Instance(ColorType::Surface));
        assert_eq!(doc.instance_color_count(), count);
    }

    #[test]
    fn test_default_color_follows_config() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("p");
        let shape = doc.shape(&part).unwrap();
        let config = WalkConfig {
            default_color: Rgb::new(0.9, 0.9, 0.9),
            ..WalkConfig::default()
        };
        let resolved = normalize_color(&mut doc, &shape, &part, &config);
        assert_eq!(resolved.color, Rgb::new(0.9, 0.9, 0.9));
    }
}
