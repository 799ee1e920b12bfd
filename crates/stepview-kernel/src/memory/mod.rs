//! In-memory label document.

pub mod snapshot;

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use slotmap::{new_key_type, SlotMap};
use stepview_math::Transform;

use crate::color::{ColorType, Rgb};
use crate::error::{KernelError, Result};
use crate::CafDocument;

/// Entry of the shape-tool label under which top-level shapes live.
const SHAPES_ENTRY: &str = "0:1:1";

new_key_type! {
    /// Handle to a label in a [`MemoryDocument`].
    pub struct LabelId;

    /// Handle to a prototype shape in a [`MemoryDocument`].
    pub struct ShapeId;
}

#[derive(Debug, Clone)]
enum LabelKind {
    Assembly { components: Vec<LabelId> },
    Simple { shape: ShapeId, sub_shapes: Vec<LabelId> },
    Reference { target: Option<LabelId>, location: Transform },
    SubShape { shape: ShapeId },
    Empty,
}

#[derive(Debug, Clone)]
struct LabelNode {
    entry: String,
    name: String,
    kind: LabelKind,
    colors: HashMap<ColorType, Rgb>,
    /// Last child tag handed out under this label.
    last_tag: u32,
}

/// A prototype shape placed by a location.
///
/// Two handles are equal when they share the prototype and the location
/// (compared bit for bit, with `-0.0` equal to `0.0`).
#[derive(Debug, Clone)]
pub struct MemoryShape {
    tshape: ShapeId,
    location: Transform,
}

impl MemoryShape {
    /// The underlying prototype.
    pub fn tshape(&self) -> ShapeId {
        self.tshape
    }

    /// Placement of the prototype.
    pub fn location(&self) -> &Transform {
        &self.location
    }

    /// Whether both handles share the prototype, regardless of placement.
    pub fn is_partner(&self, other: &MemoryShape) -> bool {
        self.tshape == other.tshape
    }
}

impl PartialEq for MemoryShape {
    fn eq(&self, other: &Self) -> bool {
        ShapeKey::from(self) == ShapeKey::from(other)
    }
}

impl Eq for MemoryShape {}

impl Hash for MemoryShape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ShapeKey::from(self).hash(state);
    }
}

/// Hashable identity of a [`MemoryShape`], used to key instance colors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ShapeKey {
    tshape: ShapeId,
    location: [u64; 16],
}

impl From<&MemoryShape> for ShapeKey {
    fn from(shape: &MemoryShape) -> Self {
        let mut location = [0u64; 16];
        for (slot, value) in location.iter_mut().zip(shape.location.matrix.iter()) {
            // fold -0.0 into 0.0
            *slot = if *value == 0.0 { 0 } else { value.to_bits() };
        }
        Self {
            tshape: shape.tshape,
            location,
        }
    }
}

/// A label document held entirely in memory.
///
/// Top-level labels get entries `0:1:1:1`, `0:1:1:2`, ...; components and
/// sub-shapes get their parent's entry with a child tag appended.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    labels: SlotMap<LabelId, LabelNode>,
    shapes: SlotMap<ShapeId, LabelId>,
    top_level: Vec<LabelId>,
    last_top_tag: u32,
    instance_colors: HashMap<(ShapeKey, ColorType), Rgb>,
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Building
    // =========================================================================

    /// Add a top-level assembly with no components.
    pub fn add_assembly(&mut self, name: impl Into<String>) -> LabelId {
        self.add_top_level(
            name.into(),
            LabelKind::Assembly {
                components: Vec::new(),
            },
        )
    }

    /// Add a top-level simple shape with its own prototype geometry.
    pub fn add_part(&mut self, name: impl Into<String>) -> LabelId {
        let label = self.add_top_level(name.into(), LabelKind::Empty);
        let shape = self.shapes.insert(label);
        self.labels[label].kind = LabelKind::Simple {
            shape,
            sub_shapes: Vec::new(),
        };
        label
    }

    /// Add a top-level label that is neither an assembly nor a shape.
    pub fn add_empty(&mut self, name: impl Into<String>) -> LabelId {
        self.add_top_level(name.into(), LabelKind::Empty)
    }

    /// Add a component to `assembly` placing one instance of `target`.
    ///
    /// The component is named after its target.
    pub fn add_component(
        &mut self,
        assembly: LabelId,
        target: LabelId,
        location: Transform,
    ) -> Result<LabelId> {
        let name = self.node(target)?.name.clone();
        self.add_named_component(assembly, target, name, location)
    }

    /// Add a named component to `assembly` placing one instance of `target`.
    pub fn add_named_component(
        &mut self,
        assembly: LabelId,
        target: LabelId,
        name: impl Into<String>,
        location: Transform,
    ) -> Result<LabelId> {
        self.node(assembly)?;
        self.node(target)?;
        if target == assembly || self.contains(target, assembly) {
            return Err(KernelError::CyclicReference {
                assembly: self.labels[assembly].entry.clone(),
                target: self.labels[target].entry.clone(),
            });
        }
        self.push_component(assembly, name.into(), Some(target), location)
    }

    /// Add a component whose target cannot be resolved.
    ///
    /// Models a partially corrupt file; the walker skips such components.
    pub fn add_dangling_component(
        &mut self,
        assembly: LabelId,
        name: impl Into<String>,
        location: Transform,
    ) -> Result<LabelId> {
        self.push_component(assembly, name.into(), None, location)
    }

    /// Declare a sub-shape (face, edge, ...) of a simple shape.
    pub fn add_sub_shape(&mut self, part: LabelId, name: impl Into<String>) -> Result<LabelId> {
        let parent = self.node(part)?;
        if !matches!(parent.kind, LabelKind::Simple { .. }) {
            return Err(KernelError::NotAPart(parent.entry.clone()));
        }
        let label = self.add_child(part, name.into(), LabelKind::Empty);
        let shape = self.shapes.insert(label);
        self.labels[label].kind = LabelKind::SubShape { shape };
        if let LabelKind::Simple { sub_shapes, .. } = &mut self.labels[part].kind {
            sub_shapes.push(label);
        }
        Ok(label)
    }

    /// Attach a prototype-level color to a label.
    pub fn set_label_color(&mut self, label: LabelId, scope: ColorType, color: Rgb) -> Result<()> {
        self.labels
            .get_mut(label)
            .ok_or(KernelError::UnknownLabel)?
            .colors
            .insert(scope, color);
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Find a label by its entry.
    pub fn label_by_entry(&self, entry: &str) -> Option<LabelId> {
        self.labels
            .iter()
            .find(|(_, node)| node.entry == entry)
            .map(|(id, _)| id)
    }

    /// Number of labels in the document.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the document has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of instance colors stored, over all shapes and scopes.
    pub fn instance_color_count(&self) -> usize {
        self.instance_colors.len()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn node(&self, label: LabelId) -> Result<&LabelNode> {
        self.labels.get(label).ok_or(KernelError::UnknownLabel)
    }

    fn new_node(entry: String, name: String, kind: LabelKind) -> LabelNode {
        LabelNode {
            entry,
            name,
            kind,
            colors: HashMap::new(),
            last_tag: 0,
        }
    }

    fn add_top_level(&mut self, name: String, kind: LabelKind) -> LabelId {
        self.last_top_tag += 1;
        let entry = format!("{}:{}", SHAPES_ENTRY, self.last_top_tag);
        let label = self.labels.insert(Self::new_node(entry, name, kind));
        self.top_level.push(label);
        label
    }

    fn add_child(&mut self, parent: LabelId, name: String, kind: LabelKind) -> LabelId {
        let node = &mut self.labels[parent];
        node.last_tag += 1;
        let entry = format!("{}:{}", node.entry, node.last_tag);
        self.labels.insert(Self::new_node(entry, name, kind))
    }

    fn push_component(
        &mut self,
        assembly: LabelId,
        name: String,
        target: Option<LabelId>,
        location: Transform,
    ) -> Result<LabelId> {
        let parent = self.node(assembly)?;
        if !matches!(parent.kind, LabelKind::Assembly { .. }) {
            return Err(KernelError::NotAnAssembly(parent.entry.clone()));
        }
        let label = self.add_child(assembly, name, LabelKind::Reference { target, location });
        if let LabelKind::Assembly { components } = &mut self.labels[assembly].kind {
            components.push(label);
        }
        Ok(label)
    }

    /// Whether `needle` is reachable from `root` through components.
    fn contains(&self, root: LabelId, needle: LabelId) -> bool {
        let mut pending = vec![root];
        let mut seen = HashSet::new();
        while let Some(label) = pending.pop() {
            if !seen.insert(label) {
                continue;
            }
            let Some(node) = self.labels.get(label) else {
                continue;
            };
            match &node.kind {
                LabelKind::Assembly { components } => pending.extend(components.iter().copied()),
                LabelKind::Reference {
                    target: Some(target),
                    ..
                } => {
                    if *target == needle {
                        return true;
                    }
                    pending.push(*target);
                }
                _ => {}
            }
        }
        false
    }

    fn referenced_labels(&self) -> HashSet<LabelId> {
        self.labels
            .values()
            .filter_map(|node| match node.kind {
                LabelKind::Reference { target, .. } => target,
                _ => None,
            })
            .collect()
    }
}

impl CafDocument for MemoryDocument {
    type Label = LabelId;
    type Shape = MemoryShape;

    fn new_shape(&mut self) -> LabelId {
        self.add_assembly(String::new())
    }

    fn free_shapes(&self) -> Vec<LabelId> {
        let referenced = self.referenced_labels();
        self.top_level
            .iter()
            .copied()
            .filter(|label| !referenced.contains(label))
            .collect()
    }

    fn is_assembly(&self, label: &LabelId) -> bool {
        matches!(
            self.labels.get(*label).map(|n| &n.kind),
            Some(LabelKind::Assembly { .. })
        )
    }

    fn is_simple_shape(&self, label: &LabelId) -> bool {
        matches!(
            self.labels.get(*label).map(|n| &n.kind),
            Some(LabelKind::Simple { .. })
        )
    }

    fn is_reference(&self, label: &LabelId) -> bool {
        matches!(
            self.labels.get(*label).map(|n| &n.kind),
            Some(LabelKind::Reference { .. })
        )
    }

    fn components(&self, label: &LabelId) -> Vec<LabelId> {
        match self.labels.get(*label).map(|n| &n.kind) {
            Some(LabelKind::Assembly { components }) => components.clone(),
            _ => Vec::new(),
        }
    }

    fn sub_shapes(&self, label: &LabelId) -> Vec<LabelId> {
        match self.labels.get(*label).map(|n| &n.kind) {
            Some(LabelKind::Simple { sub_shapes, .. }) => sub_shapes.clone(),
            _ => Vec::new(),
        }
    }

    fn referred_shape(&self, label: &LabelId) -> Option<LabelId> {
        match self.labels.get(*label).map(|n| &n.kind) {
            Some(LabelKind::Reference {
                target: Some(target),
                ..
            }) if self.labels.contains_key(*target) => Some(*target),
            _ => None,
        }
    }

    fn location(&self, label: &LabelId) -> Transform {
        match self.labels.get(*label).map(|n| &n.kind) {
            Some(LabelKind::Reference { location, .. }) => location.clone(),
            _ => Transform::identity(),
        }
    }

    fn shape(&self, label: &LabelId) -> Option<MemoryShape> {
        match &self.labels.get(*label)?.kind {
            LabelKind::Simple { shape, .. } | LabelKind::SubShape { shape } => Some(MemoryShape {
                tshape: *shape,
                location: Transform::identity(),
            }),
            LabelKind::Reference {
                target: Some(target),
                location,
            } => {
                let referred = self.shape(target)?;
                Some(self.transform_shape(&referred, location))
            }
            _ => None,
        }
    }

    fn entry(&self, label: &LabelId) -> String {
        self.labels
            .get(*label)
            .map(|n| n.entry.clone())
            .unwrap_or_default()
    }

    fn label_name(&self, label: &LabelId) -> String {
        self.labels
            .get(*label)
            .map(|n| n.name.clone())
            .unwrap_or_default()
    }

    fn set_label_name(&mut self, label: &LabelId, name: &str) {
        if let Some(node) = self.labels.get_mut(*label) {
            node.name = name.to_string();
        }
    }

    fn instance_color(&self, shape: &MemoryShape, scope: ColorType) -> Option<Rgb> {
        self.instance_colors
            .get(&(ShapeKey::from(shape), scope))
            .copied()
    }

    fn set_instance_color(&mut self, shape: &MemoryShape, scope: ColorType, color: Rgb) {
        self.instance_colors
            .insert((ShapeKey::from(shape), scope), color);
    }

    fn label_color(&self, label: &LabelId, scope: ColorType) -> Option<Rgb> {
        self.labels.get(*label)?.colors.get(&scope).copied()
    }

    fn transform_shape(&self, shape: &MemoryShape, transform: &Transform) -> MemoryShape {
        MemoryShape {
            tshape: shape.tshape,
            location: transform.then(&shape.location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_follow_tag_paths() {
        let mut doc = MemoryDocument::new();
        let assembly = doc.add_assembly("asm");
        let part = doc.add_part("part");
        let c1 = doc
            .add_component(assembly, part, Transform::identity())
            .unwrap();
        let c2 = doc
            .add_component(assembly, part, Transform::identity())
            .unwrap();
        let face = doc.add_sub_shape(part, "face").unwrap();

        assert_eq!(doc.entry(&assembly), "0:1:1:1");
        assert_eq!(doc.entry(&part), "0:1:1:2");
        assert_eq!(doc.entry(&c1), "0:1:1:1:1");
        assert_eq!(doc.entry(&c2), "0:1:1:1:2");
        assert_eq!(doc.entry(&face), "0:1:1:2:1");
        assert_eq!(doc.label_by_entry("0:1:1:1:2"), Some(c2));
    }

    #[test]
    fn test_label_kinds() {
        let mut doc = MemoryDocument::new();
        let assembly = doc.add_assembly("asm");
        let part = doc.add_part("part");
        let empty = doc.add_empty("note");
        let component = doc
            .add_component(assembly, part, Transform::identity())
            .unwrap();

        assert!(doc.is_assembly(&assembly));
        assert!(doc.is_simple_shape(&part));
        assert!(doc.is_reference(&component));
        assert!(!doc.is_assembly(&empty) && !doc.is_simple_shape(&empty));
        assert_eq!(doc.label_name(&component), "part");
        assert_eq!(doc.referred_shape(&component), Some(part));
        assert!(doc.shape(&assembly).is_none());
    }

    #[test]
    fn test_free_shapes_exclude_referenced() {
        let mut doc = MemoryDocument::new();
        let root = doc.add_assembly("root");
        let sub = doc.add_assembly("sub");
        let part = doc.add_part("part");
        let loose = doc.add_part("loose");
        doc.add_component(root, sub, Transform::identity()).unwrap();
        doc.add_component(sub, part, Transform::identity()).unwrap();

        assert_eq!(doc.free_shapes(), vec![root, loose]);
    }

    #[test]
    fn test_component_on_part_is_rejected() {
        let mut doc = MemoryDocument::new();
        let a = doc.add_part("a");
        let b = doc.add_part("b");
        let err = doc.add_component(a, b, Transform::identity()).unwrap_err();
        assert!(matches!(err, KernelError::NotAnAssembly(entry) if entry == "0:1:1:1"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut doc = MemoryDocument::new();
        let outer = doc.add_assembly("outer");
        let inner = doc.add_assembly("inner");
        doc.add_component(outer, inner, Transform::identity())
            .unwrap();
        let err = doc
            .add_component(inner, outer, Transform::identity())
            .unwrap_err();
        assert!(matches!(err, KernelError::CyclicReference { .. }));
        assert!(doc
            .add_component(outer, outer, Transform::identity())
            .is_err());
    }

    #[test]
    fn test_dangling_reference_does_not_resolve() {
        let mut doc = MemoryDocument::new();
        let assembly = doc.add_assembly("asm");
        let dangling = doc
            .add_dangling_component(assembly, "lost", Transform::identity())
            .unwrap();
        assert!(doc.is_reference(&dangling));
        assert_eq!(doc.referred_shape(&dangling), None);
        assert!(doc.shape(&dangling).is_none());
    }

    #[test]
    fn test_transform_shape_keeps_prototype() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("part");
        let raw = doc.shape(&part).unwrap();
        let moved = doc.transform_shape(&raw, &Transform::translation(1.0, 0.0, 0.0));
        assert!(moved.is_partner(&raw));
        assert_ne!(moved, raw);
        assert_eq!(moved.location(), &Transform::translation(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_shape_equality_matches_hash() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("part");
        let raw = doc.shape(&part).unwrap();
        let plus = doc.transform_shape(&raw, &Transform::translation(0.0, 0.0, 0.0));
        let minus = doc.transform_shape(&raw, &Transform::translation(-0.0, 0.0, 0.0));
        assert_eq!(plus, minus);

        let set: HashSet<MemoryShape> = [raw.clone(), plus, minus].into_iter().collect();
        assert_eq!(set.len(), 1);
        let moved = doc.transform_shape(&raw, &Transform::translation(1.0, 0.0, 0.0));
        assert!(!set.contains(&moved));
    }

    #[test]
    fn test_reference_shape_is_placed() {
        let mut doc = MemoryDocument::new();
        let assembly = doc.add_assembly("asm");
        let part = doc.add_part("part");
        let placement = Transform::translation(0.0, 2.0, 0.0);
        let component = doc
            .add_component(assembly, part, placement.clone())
            .unwrap();
        let shape = doc.shape(&component).unwrap();
        assert_eq!(shape.location(), &placement);
        assert_eq!(doc.location(&component), placement);
        assert_eq!(doc.location(&part), Transform::identity());
    }

    #[test]
    fn test_instance_colors_are_keyed_by_placement() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("part");
        let raw = doc.shape(&part).unwrap();
        let moved = doc.transform_shape(&raw, &Transform::translation(1.0, 0.0, 0.0));
        let red = Rgb::new(1.0, 0.0, 0.0);

        doc.set_instance_color(&raw, ColorType::Surface, red);
        assert_eq!(doc.instance_color(&raw, ColorType::Surface), Some(red));
        assert_eq!(doc.instance_color(&raw, ColorType::Curve), None);
        assert_eq!(doc.instance_color(&moved, ColorType::Surface), None);
        assert_eq!(doc.instance_color_count(), 1);
    }

    #[test]
    fn test_label_colors() {
        let mut doc = MemoryDocument::new();
        let part = doc.add_part("part");
        let blue = Rgb::new(0.0, 0.0, 1.0);
        doc.set_label_color(part, ColorType::Generic, blue).unwrap();
        assert_eq!(doc.label_color(&part, ColorType::Generic), Some(blue));
        assert_eq!(doc.label_color(&part, ColorType::Surface), None);
    }

    #[test]
    fn test_new_shape_is_empty_assembly() {
        let mut doc = MemoryDocument::new();
        let root = doc.new_shape();
        doc.set_label_name(&root, "Top");
        assert!(doc.is_assembly(&root));
        assert!(doc.components(&root).is_empty());
        assert_eq!(doc.label_name(&root), "Top");
        assert_eq!(doc.entry(&root), "0:1:1:1");
    }

    #[test]
    fn test_sub_shape_on_assembly_is_rejected() {
        let mut doc = MemoryDocument::new();
        let assembly = doc.add_assembly("asm");
        assert!(matches!(
            doc.add_sub_shape(assembly, "face"),
            Err(KernelError::NotAPart(_))
        ));
    }
}
