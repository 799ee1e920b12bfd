//! JSON snapshots of label documents.
//!
//! A snapshot lists labels by key. Assemblies name their components'
//! targets by key; placements follow STEP's `AXIS2_PLACEMENT_3D` (origin,
//! Z axis, X reference direction).
//!
//! ```json
//! {
//!   "labels": [
//!     { "kind": "assembly", "key": "frame", "name": "Frame",
//!       "components": [
//!         { "refers_to": "bolt", "placement": { "origin": [10.0, 0.0, 0.0] } }
//!       ] },
//!     { "kind": "part", "key": "bolt", "name": "Bolt",
//!       "colors": [ { "scope": "surface", "rgb": [0.8, 0.1, 0.1] } ] }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stepview_math::{Point3, Transform, Vec3};

use super::{LabelId, MemoryDocument};
use crate::color::{ColorType, Rgb};
use crate::error::LoadError;
use crate::{CafDocument, DocumentLoader};

/// A whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Format version string.
    #[serde(default = "default_version")]
    pub version: String,
    /// Top-level labels, in entry order.
    pub labels: Vec<LabelSnapshot>,
}

fn default_version() -> String {
    "0.1".to_string()
}

/// One top-level label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelSnapshot {
    /// An assembly of component instances.
    Assembly {
        /// Key other labels use to refer to this one.
        key: String,
        /// Display name.
        name: String,
        /// Component instances, in order.
        #[serde(default)]
        components: Vec<ComponentSnapshot>,
        /// Label-level colors.
        #[serde(default)]
        colors: Vec<ColorSnapshot>,
    },
    /// A simple shape.
    Part {
        /// Key other labels use to refer to this one.
        key: String,
        /// Display name.
        name: String,
        /// Label-level colors.
        #[serde(default)]
        colors: Vec<ColorSnapshot>,
        /// Colors attached to the part's own shape.
        #[serde(default)]
        instance_colors: Vec<ColorSnapshot>,
        /// Declared sub-shapes.
        #[serde(default)]
        sub_shapes: Vec<SubShapeSnapshot>,
    },
    /// A label that is neither an assembly nor a shape.
    Empty {
        /// Key of this label.
        key: String,
        /// Display name.
        name: String,
    },
}

impl LabelSnapshot {
    /// Key of this label.
    pub fn key(&self) -> &str {
        match self {
            LabelSnapshot::Assembly { key, .. }
            | LabelSnapshot::Part { key, .. }
            | LabelSnapshot::Empty { key, .. } => key,
        }
    }
}

/// One component instance inside an assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    /// Instance name; defaults to the target's name.
    #[serde(default)]
    pub name: Option<String>,
    /// Key of the referred label.
    pub refers_to: String,
    /// Placement of the instance in the assembly.
    #[serde(default)]
    pub placement: PlacementSnapshot,
}

/// An `AXIS2_PLACEMENT_3D`-style placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSnapshot {
    /// Origin of the local frame.
    pub origin: [f64; 3],
    /// Local Z direction.
    pub axis: [f64; 3],
    /// Local X direction.
    pub ref_dir: [f64; 3],
}

impl Default for PlacementSnapshot {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0, 0.0],
            axis: [0.0, 0.0, 1.0],
            ref_dir: [1.0, 0.0, 0.0],
        }
    }
}

impl PlacementSnapshot {
    /// The placement as a transform.
    pub fn to_transform(&self) -> Transform {
        Transform::from_axis2_placement(
            &Point3::from(self.origin),
            &Vec3::from(self.axis),
            &Vec3::from(self.ref_dir),
        )
    }
}

/// A color at one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSnapshot {
    /// Scope the color applies at.
    pub scope: ColorType,
    /// The color.
    pub rgb: Rgb,
}

/// A declared sub-shape of a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubShapeSnapshot {
    /// Display name.
    pub name: String,
    /// Label-level colors.
    #[serde(default)]
    pub colors: Vec<ColorSnapshot>,
    /// Colors attached to the sub-shape itself.
    #[serde(default)]
    pub instance_colors: Vec<ColorSnapshot>,
}

impl DocumentSnapshot {
    /// Deserialize from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Build the document this snapshot describes.
    ///
    /// Components whose target key is unknown become dangling references.
    pub fn to_document(&self) -> Result<MemoryDocument, LoadError> {
        let mut doc = MemoryDocument::new();
        let mut by_key: HashMap<&str, LabelId> = HashMap::new();

        // Labels first, so components can refer forward.
        for snapshot in &self.labels {
            let label = match snapshot {
                LabelSnapshot::Assembly { name, colors, .. } => {
                    let label = doc.add_assembly(name.as_str());
                    apply_label_colors(&mut doc, label, colors)?;
                    label
                }
                LabelSnapshot::Part {
                    name,
                    colors,
                    instance_colors,
                    sub_shapes,
                    ..
                } => {
                    let label = doc.add_part(name.as_str());
                    apply_label_colors(&mut doc, label, colors)?;
                    apply_instance_colors(&mut doc, label, instance_colors);
                    for sub in sub_shapes {
                        let sub_label = doc.add_sub_shape(label, sub.name.as_str())?;
                        apply_label_colors(&mut doc, sub_label, &sub.colors)?;
                        apply_instance_colors(&mut doc, sub_label, &sub.instance_colors);
                    }
                    label
                }
                LabelSnapshot::Empty { name, .. } => doc.add_empty(name.as_str()),
            };
            if by_key.insert(snapshot.key(), label).is_some() {
                return Err(LoadError::Invalid(format!(
                    "duplicate label key '{}'",
                    snapshot.key()
                )));
            }
        }

        for snapshot in &self.labels {
            let LabelSnapshot::Assembly {
                key, components, ..
            } = snapshot
            else {
                continue;
            };
            let assembly = by_key[key.as_str()];
            for component in components {
                let location = component.placement.to_transform();
                match by_key.get(component.refers_to.as_str()) {
                    Some(&target) => {
                        let name = component
                            .name
                            .clone()
                            .unwrap_or_else(|| doc.label_name(&target));
                        doc.add_named_component(assembly, target, name, location)?;
                    }
                    None => {
                        let name = component
                            .name
                            .clone()
                            .unwrap_or_else(|| component.refers_to.clone());
                        doc.add_dangling_component(assembly, name, location)?;
                    }
                }
            }
        }

        Ok(doc)
    }
}

fn apply_label_colors(
    doc: &mut MemoryDocument,
    label: LabelId,
    colors: &[ColorSnapshot],
) -> Result<(), LoadError> {
    for color in colors {
        doc.set_label_color(label, color.scope, color.rgb)?;
    }
    Ok(())
}

fn apply_instance_colors(doc: &mut MemoryDocument, label: LabelId, colors: &[ColorSnapshot]) {
    if let Some(shape) = doc.shape(&label) {
        for color in colors {
            doc.set_instance_color(&shape, color.scope, color.rgb);
        }
    }
}

/// Loads [`MemoryDocument`]s from JSON snapshot files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

impl DocumentLoader for JsonLoader {
    type Document = MemoryDocument;

    fn new_document(&self) -> MemoryDocument {
        MemoryDocument::new()
    }

    fn load(&self, path: &Path) -> Result<MemoryDocument, LoadError> {
        let json = std::fs::read_to_string(path)?;
        DocumentSnapshot::from_json(&json)?.to_document()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_BOLTS: &str = r#"{
        "labels": [
            { "kind": "assembly", "key": "frame", "name": "Frame",
              "components": [
                { "refers_to": "bolt", "placement": { "origin": [10.0, 0.0, 0.0] } },
                { "name": "bolt-2", "refers_to": "bolt",
                  "placement": { "origin": [-10.0, 0.0, 0.0], "axis": [1.0, 0.0, 0.0], "ref_dir": [0.0, 1.0, 0.0] } }
              ] },
            { "kind": "part", "key": "bolt", "name": "Bolt",
              "colors": [ { "scope": "surface", "rgb": [0.8, 0.1, 0.1] } ],
              "sub_shapes": [ { "name": "head" } ] }
        ]
    }"#;

    #[test]
    fn test_snapshot_builds_document() {
        let doc = DocumentSnapshot::from_json(TWO_BOLTS)
            .unwrap()
            .to_document()
            .unwrap();
        let roots = doc.free_shapes();
        assert_eq!(roots.len(), 1);
        let frame = roots[0];
        assert_eq!(doc.label_name(&frame), "Frame");

        let components = doc.components(&frame);
        assert_eq!(components.len(), 2);
        assert_eq!(doc.label_name(&components[0]), "Bolt");
        assert_eq!(doc.label_name(&components[1]), "bolt-2");
        assert_eq!(
            doc.location(&components[0]),
            Transform::translation(10.0, 0.0, 0.0)
        );

        let bolt = doc.referred_shape(&components[1]).unwrap();
        assert_eq!(doc.entry(&bolt), "0:1:1:2");
        assert_eq!(
            doc.label_color(&bolt, ColorType::Surface),
            Some(Rgb::new(0.8, 0.1, 0.1))
        );
        assert_eq!(doc.sub_shapes(&bolt).len(), 1);
    }

    #[test]
    fn test_unknown_target_becomes_dangling() {
        let json = r#"{ "labels": [
            { "kind": "assembly", "key": "a", "name": "A",
              "components": [ { "refers_to": "missing" } ] }
        ] }"#;
        let doc = DocumentSnapshot::from_json(json)
            .unwrap()
            .to_document()
            .unwrap();
        let a = doc.free_shapes()[0];
        let component = doc.components(&a)[0];
        assert!(doc.is_reference(&component));
        assert_eq!(doc.referred_shape(&component), None);
        assert_eq!(doc.label_name(&component), "missing");
    }

    #[test]
    fn test_duplicate_key_is_invalid() {
        let json = r#"{ "labels": [
            { "kind": "part", "key": "p", "name": "P" },
            { "kind": "empty", "key": "p", "name": "Q" }
        ] }"#;
        let err = DocumentSnapshot::from_json(json)
            .unwrap()
            .to_document()
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));
    }

    #[test]
    fn test_instance_colors_land_on_prototype_shape() {
        let json = r#"{ "labels": [
            { "kind": "part", "key": "p", "name": "P",
              "instance_colors": [ { "scope": "generic", "rgb": [0.0, 1.0, 0.0] } ] }
        ] }"#;
        let doc = DocumentSnapshot::from_json(json)
            .unwrap()
            .to_document()
            .unwrap();
        let p = doc.free_shapes()[0];
        let shape = doc.shape(&p).unwrap();
        assert_eq!(
            doc.instance_color(&shape, ColorType::Generic),
            Some(Rgb::new(0.0, 1.0, 0.0))
        );
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = DocumentSnapshot::from_json(TWO_BOLTS).unwrap();
        let json = snapshot.to_json().unwrap();
        assert_eq!(DocumentSnapshot::from_json(&json).unwrap(), snapshot);
        assert_eq!(snapshot.version, "0.1");
    }

    #[test]
    fn test_loader_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_BOLTS.as_bytes()).unwrap();
        let doc = JsonLoader.load(file.path()).unwrap();
        assert_eq!(doc.free_shapes().len(), 1);
    }

    #[test]
    fn test_loader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonLoader.load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_loader_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ISO-10303-21;").unwrap();
        let err = JsonLoader.load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }
}
