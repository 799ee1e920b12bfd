#![warn(missing_docs)]

//! stepview: flatten CAD assembly documents for viewers
//!
//! A STEP assembly is a tree of labels in which one prototype part can be
//! placed many times. [`Walker`] visits that tree depth-first and flattens
//! it into two tables keyed by walk-unique [`Uid`]s:
//!
//! - a [`PartTable`] with one positioned, colored shape per part instance;
//! - a [`LabelTable`] with one record per visited assembly or part, linked
//!   to its parent, for building a tree view.
//!
//! [`DocModel`] wraps a document loader, the current document and the
//! tables of its last walk.
//!
//! # Example
//!
//! ```rust
//! use stepview::{UidAllocator, WalkConfig, Walker};
//! use stepview::stepview_kernel::MemoryDocument;
//! use stepview::stepview_math::Transform;
//!
//! let mut doc = MemoryDocument::new();
//! let frame = doc.add_assembly("frame");
//! let bolt = doc.add_part("bolt");
//! doc.add_component(frame, bolt, Transform::translation(10.0, 0.0, 0.0)).unwrap();
//! doc.add_component(frame, bolt, Transform::translation(-10.0, 0.0, 0.0)).unwrap();
//!
//! let config = WalkConfig::default();
//! let out = Walker::new(&config).walk(&mut doc, &mut UidAllocator::new());
//! assert_eq!(out.parts.len(), 2);
//! assert_eq!(out.labels.len(), 3);
//! ```

pub mod color;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod tables;
pub mod uid;
pub mod walker;

pub use color::{normalize_color, ColorSource, ResolvedColor};
pub use config::{CounterPolicy, WalkConfig};
pub use error::{ConfigError, ModelError, Result, WalkWarning};
pub use events::{RecordingObserver, WalkEvent, WalkObserver};
pub use model::DocModel;
pub use tables::{DisplayShape, DisplayShapes, LabelRecord, LabelTable, PartRecord, PartTable};
pub use uid::{Uid, UidAllocator};
pub use walker::{WalkOutput, WalkReport, WalkStatus, Walker};

pub use stepview_kernel;
pub use stepview_math;
