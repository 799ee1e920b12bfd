#![warn(missing_docs)]

//! CAD document capability interface for stepview.
//!
//! A STEP file loaded by a CAD kernel becomes a tree of *labels*: assemblies
//! listing their components, references placing one instance of a prototype
//! shape or sub-assembly, and simple shapes carrying renderable geometry.
//! Colors live in a separate table, attached either to labels (prototype
//! level) or to shapes (instance level).
//!
//! [`CafDocument`] is the narrow slice of that kernel the walker in the
//! `stepview` crate relies on, and [`DocumentLoader`] is how documents are
//! created. [`MemoryDocument`] is a complete in-memory implementation of both,
//! with documents loaded from JSON snapshots by [`JsonLoader`].
//!
//! # Example
//!
//! ```
//! use stepview_kernel::{CafDocument, MemoryDocument};
//! use stepview_math::Transform;
//!
//! let mut doc = MemoryDocument::new();
//! let assembly = doc.add_assembly("frame");
//! let bolt = doc.add_part("bolt");
//! doc.add_component(assembly, bolt, Transform::translation(10.0, 0.0, 0.0)).unwrap();
//!
//! assert_eq!(doc.free_shapes(), vec![assembly]);
//! assert_eq!(doc.components(&assembly).len(), 1);
//! ```

use std::fmt;
use std::hash::Hash;
use std::path::Path;

use stepview_math::Transform;

mod color;
mod error;
mod memory;

pub use color::{ColorType, Rgb};
pub use error::{KernelError, LoadError, Result};
pub use memory::snapshot::{
    ColorSnapshot, ComponentSnapshot, DocumentSnapshot, JsonLoader, LabelSnapshot,
    PlacementSnapshot, SubShapeSnapshot,
};
pub use memory::{LabelId, MemoryDocument, MemoryShape, ShapeId};

/// Read access to a hierarchical label document, plus the few writes the
/// walker needs (label names and instance colors).
///
/// Label and shape handles are cheap to clone. A handle that does not belong
/// to the document behaves like an empty label: every predicate is false and
/// every lookup is empty.
pub trait CafDocument {
    /// Handle to a label.
    type Label: Clone + fmt::Debug;
    /// Handle to a (possibly positioned) shape. Equal handles denote the
    /// same prototype at the same placement.
    type Shape: Clone + fmt::Debug + Eq + Hash;

    /// Create a new, empty top-level assembly label.
    fn new_shape(&mut self) -> Self::Label;

    /// Top-level labels not used as a component of any assembly.
    fn free_shapes(&self) -> Vec<Self::Label>;

    /// Whether the label is an assembly.
    fn is_assembly(&self, label: &Self::Label) -> bool;

    /// Whether the label is a leaf carrying a renderable shape.
    fn is_simple_shape(&self, label: &Self::Label) -> bool;

    /// Whether the label is a reference to another label.
    fn is_reference(&self, label: &Self::Label) -> bool;

    /// Component labels of an assembly, in document order.
    fn components(&self, label: &Self::Label) -> Vec<Self::Label>;

    /// Declared sub-shape labels of a simple shape.
    fn sub_shapes(&self, label: &Self::Label) -> Vec<Self::Label>;

    /// The label a reference points at, if it can be resolved.
    fn referred_shape(&self, label: &Self::Label) -> Option<Self::Label>;

    /// Local placement of a reference; identity for other labels.
    fn location(&self, label: &Self::Label) -> Transform;

    /// The shape attached to a label.
    fn shape(&self, label: &Self::Label) -> Option<Self::Shape>;

    /// Kernel-assigned positional token, e.g. `0:1:1:2`.
    fn entry(&self, label: &Self::Label) -> String;

    /// Display name of a label.
    fn label_name(&self, label: &Self::Label) -> String;

    /// Rename a label.
    fn set_label_name(&mut self, label: &Self::Label, name: &str);

    /// Color attached to this exact shape at `scope`.
    fn instance_color(&self, shape: &Self::Shape, scope: ColorType) -> Option<Rgb>;

    /// Attach a color to this exact shape at `scope`.
    fn set_instance_color(&mut self, shape: &Self::Shape, scope: ColorType, color: Rgb);

    /// Color attached to a label at `scope`.
    fn label_color(&self, label: &Self::Label, scope: ColorType) -> Option<Rgb>;

    /// A copy of `shape` moved by `transform`.
    fn transform_shape(&self, shape: &Self::Shape, transform: &Transform) -> Self::Shape;
}

/// Creates documents, either empty or read from a file.
pub trait DocumentLoader {
    /// The document type produced.
    type Document: CafDocument;

    /// A new document with no labels.
    fn new_document(&self) -> Self::Document;

    /// Read a document from `path`.
    fn load(&self, path: &Path) -> std::result::Result<Self::Document, LoadError>;
}
