//! Observability hook for walks.
//!
//! The walker reports what it does as [`WalkEvent`]s. Every event is logged
//! through `tracing` (labels and parts at `debug`, component placements at
//! `trace`, warnings at `warn`) and then handed to a [`WalkObserver`], which
//! may stop the walk.

use std::ops::ControlFlow;

use stepview_kernel::Rgb;
use stepview_math::Transform;

use crate::color::ColorSource;
use crate::error::WalkWarning;
use crate::uid::Uid;

/// Something the walker did.
#[derive(Debug, Clone, PartialEq)]
pub enum WalkEvent {
    /// The document's free shapes were listed.
    Roots {
        /// Number of free shapes.
        count: usize,
    },
    /// A label is being visited.
    Label {
        /// Uid of this visit.
        uid: Uid,
        /// Label name.
        name: String,
        /// Uid of the enclosing assembly.
        parent: Option<Uid>,
        /// Assembly nesting depth, 0 for roots.
        depth: usize,
    },
    /// A component reference is being followed into its target.
    Component {
        /// Uid of the component label.
        uid: Uid,
        /// Component name.
        name: String,
        /// Entry of the referred label.
        target: String,
        /// Local placement of the component.
        location: Transform,
    },
    /// An assembly was recorded; its components are queued.
    Assembly {
        /// Uid of the assembly.
        uid: Uid,
        /// Number of components that will be visited.
        components: usize,
    },
    /// A part record was produced.
    Part {
        /// Uid of the part.
        uid: Uid,
        /// Resolved color.
        color: Rgb,
        /// Where the color came from.
        source: ColorSource,
        /// Composed placement.
        location: Transform,
    },
    /// A sub-shape of a part was registered for display.
    SubShape {
        /// Entry of the sub-shape label.
        entry: String,
        /// Resolved color.
        color: Rgb,
        /// Where the color came from.
        source: ColorSource,
    },
    /// A label that is neither an assembly nor a simple shape was passed over.
    Skipped {
        /// Uid of the visit.
        uid: Uid,
    },
    /// A recoverable problem was found.
    Warning(WalkWarning),
}

impl WalkEvent {
    pub(crate) fn trace(&self) {
        match self {
            WalkEvent::Roots { count } => {
                tracing::debug!(count, "free shapes at root");
            }
            WalkEvent::Label {
                uid,
                name,
                parent,
                depth,
            } => {
                let parent = parent.as_ref().map(Uid::to_string);
                tracing::debug!(%uid, name = %name, ?parent, depth, "visiting label");
            }
            WalkEvent::Component {
                uid,
                name,
                target,
                location,
            } => {
                let rotation = location.rotation();
                let translation = location.translation_part();
                tracing::trace!(
                    %uid,
                    name = %name,
                    prototype = %target,
                    rotation = ?rotation.coords.as_slice(),
                    translation = ?translation.as_slice(),
                    "component refers to prototype"
                );
            }
            WalkEvent::Assembly { uid, components } => {
                tracing::debug!(%uid, components, "assembly");
            }
            WalkEvent::Part {
                uid,
                color,
                source,
                location,
            } => {
                let translation = location.translation_part();
                tracing::debug!(
                    %uid,
                    %color,
                    %source,
                    translation = ?translation.as_slice(),
                    "part"
                );
            }
            WalkEvent::SubShape {
                entry,
                color,
                source,
            } => {
                tracing::trace!(entry = %entry, %color, %source, "sub-shape");
            }
            WalkEvent::Skipped { uid } => {
                tracing::debug!(%uid, "label is neither assembly nor shape, skipped");
            }
            WalkEvent::Warning(warning) => {
                tracing::warn!("{}", warning);
            }
        }
    }
}

/// Receives walk events; returning `Break` stops the walk.
pub trait WalkObserver {
    /// Called once per event, in walk order.
    fn on_event(&mut self, event: &WalkEvent) -> ControlFlow<()>;
}

impl<F> WalkObserver for F
where
    F: FnMut(&WalkEvent) -> ControlFlow<()>,
{
    fn on_event(&mut self, event: &WalkEvent) -> ControlFlow<()> {
        self(event)
    }
}

/// Keeps a copy of every event.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    /// Events in walk order.
    pub events: Vec<WalkEvent>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded warnings, in order.
    pub fn warnings(&self) -> impl Iterator<Item = &WalkWarning> {
        self.events.iter().filter_map(|event| match event {
            WalkEvent::Warning(warning) => Some(warning),
            _ => None,
        })
    }
}

impl WalkObserver for RecordingObserver {
    fn on_event(&mut self, event: &WalkEvent) -> ControlFlow<()> {
        self.events.push(event.clone());
        ControlFlow::Continue(())
    }
}
