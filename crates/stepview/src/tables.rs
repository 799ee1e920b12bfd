//! Flat tables produced by a walk.
//!
//! Both tables are keyed by [`Uid`] and keep visit order, so a tree view can
//! be built by a single pass over [`LabelTable`] (parents always come before
//! their children).

use std::hash::Hash;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;
use stepview_kernel::Rgb;
use stepview_math::Transform;

use crate::color::ColorSource;
use crate::uid::Uid;

/// A renderable leaf shape placed in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PartRecord<S> {
    /// The shape moved by [`location`](Self::location).
    pub shape: S,
    /// Name of the shape's label.
    pub name: String,
    /// Resolved color.
    pub color: Rgb,
    /// Where the color came from.
    pub color_source: ColorSource,
    /// Composed placement of all enclosing component instances.
    pub location: Transform,
}

/// One node of the assembly tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRecord {
    /// Label entry in the document.
    pub entry: String,
    /// Label name.
    pub name: String,
    /// Uid of the enclosing assembly; `None` for roots.
    pub parent_uid: Option<Uid>,
    /// Whether the label is an assembly.
    pub is_assembly: bool,
}

/// Part records by uid.
#[derive(Debug, Clone)]
pub struct PartTable<S> {
    records: IndexMap<Uid, PartRecord<S>>,
}

impl<S> Default for PartTable<S> {
    fn default() -> Self {
        Self {
            records: IndexMap::new(),
        }
    }
}

impl<S> PartTable<S> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a part.
    pub fn get(&self, uid: &Uid) -> Option<&PartRecord<S>> {
        self.records.get(uid)
    }

    /// Whether `uid` has a part.
    pub fn contains(&self, uid: &Uid) -> bool {
        self.records.contains_key(uid)
    }

    /// Parts in visit order.
    pub fn iter(&self) -> impl Iterator<Item = (&Uid, &PartRecord<S>)> {
        self.records.iter()
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn insert(&mut self, uid: Uid, record: PartRecord<S>) -> Option<PartRecord<S>> {
        self.records.insert(uid, record)
    }
}

/// Label records by uid.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct LabelTable {
    records: IndexMap<Uid, LabelRecord>,
}

impl LabelTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a label.
    pub fn get(&self, uid: &Uid) -> Option<&LabelRecord> {
        self.records.get(uid)
    }

    /// Whether `uid` has a label record.
    pub fn contains(&self, uid: &Uid) -> bool {
        self.records.contains_key(uid)
    }

    /// Labels in visit order.
    pub fn iter(&self) -> impl Iterator<Item = (&Uid, &LabelRecord)> {
        self.records.iter()
    }

    /// Labels with no parent.
    pub fn roots(&self) -> impl Iterator<Item = (&Uid, &LabelRecord)> {
        self.records
            .iter()
            .filter(|(_, record)| record.parent_uid.is_none())
    }

    /// Direct children of `parent`, in visit order.
    pub fn children<'a>(
        &'a self,
        parent: &'a Uid,
    ) -> impl Iterator<Item = (&'a Uid, &'a LabelRecord)> + 'a {
        self.records
            .iter()
            .filter(move |(_, record)| record.parent_uid.as_ref() == Some(parent))
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn insert(&mut self, uid: Uid, record: LabelRecord) -> Option<LabelRecord> {
        self.records.insert(uid, record)
    }
}

/// How a registered display shape is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayShape {
    /// Label name.
    pub name: String,
    /// Resolved color.
    pub color: Rgb,
}

/// Every positioned part shape and sub-shape of a walk, each at most once.
#[derive(Debug, Clone)]
pub struct DisplayShapes<S> {
    shapes: IndexMap<S, DisplayShape>,
}

impl<S> Default for DisplayShapes<S> {
    fn default() -> Self {
        Self {
            shapes: IndexMap::new(),
        }
    }
}

impl<S: Hash + Eq> DisplayShapes<S> {
    /// Register a shape unless an equal one is already present.
    ///
    /// Returns whether the shape was added.
    pub(crate) fn register(&mut self, shape: S, name: String, color: Rgb) -> bool {
        match self.shapes.entry(shape) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(DisplayShape { name, color });
                true
            }
        }
    }

    /// How `shape` is shown, if registered.
    pub fn get(&self, shape: &S) -> Option<&DisplayShape> {
        self.shapes.get(shape)
    }
}

impl<S> DisplayShapes<S> {
    /// Shapes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&S, &DisplayShape)> {
        self.shapes.iter()
    }

    /// Number of shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether no shape is registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
