//! Depth-first walk of a label document into flat tables.
//!
//! Traversal runs on an explicit work stack instead of native recursion, so
//! a deeply nested document cannot exhaust the call stack. Each pending
//! frame carries everything a visit needs: the label, the component that led
//! to it, the composed placement of all enclosing instances, the parent uid
//! and the depth.

use std::ops::ControlFlow;

use stepview_kernel::CafDocument;
use stepview_math::Transform;

use crate::color::normalize_color;
use crate::config::WalkConfig;
use crate::error::WalkWarning;
use crate::events::{WalkEvent, WalkObserver};
use crate::tables::{DisplayShapes, LabelRecord, LabelTable, PartRecord, PartTable};
use crate::uid::{Uid, UidAllocator};

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkStatus {
    /// Every root was walked.
    #[default]
    Complete,
    /// An observer stopped the walk; the tables hold what was visited.
    Cancelled,
}

/// Summary of a walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkReport {
    /// How the walk ended.
    pub status: WalkStatus,
    /// Number of free shapes walked from.
    pub roots: usize,
    /// Number of labels visited (components excluded).
    pub visited: usize,
    /// Recoverable problems, in walk order.
    pub warnings: Vec<WalkWarning>,
}

/// Everything a walk produces.
#[derive(Debug, Clone)]
pub struct WalkOutput<S> {
    /// Leaf shapes by uid.
    pub parts: PartTable<S>,
    /// Tree index by uid.
    pub labels: LabelTable,
    /// Positioned shapes and sub-shapes for display.
    pub display_shapes: DisplayShapes<S>,
    /// Summary.
    pub report: WalkReport,
}

impl<S> Default for WalkOutput<S> {
    fn default() -> Self {
        Self {
            parts: PartTable::default(),
            labels: LabelTable::default(),
            display_shapes: DisplayShapes::default(),
            report: WalkReport::default(),
        }
    }
}

/// A pending visit.
struct Frame<L> {
    label: L,
    /// Component reference that led here; `None` for roots.
    via: Option<L>,
    /// Product of the placements of every component on the path, root first.
    location: Transform,
    parent: Option<Uid>,
    depth: usize,
}

/// Walks documents into part and label tables.
#[derive(Debug, Clone, Copy)]
pub struct Walker<'c> {
    config: &'c WalkConfig,
}

impl<'c> Walker<'c> {
    /// Create a walker using `config`.
    pub fn new(config: &'c WalkConfig) -> Self {
        Self { config }
    }

    /// Walk every free shape of `doc`.
    ///
    /// Uids come from `uids`; pass a fresh allocator for serials starting at
    /// 0. Colors found in the document are normalized onto instance colors
    /// as a side effect (see [`normalize_color`]).
    pub fn walk<D: CafDocument>(
        &self,
        doc: &mut D,
        uids: &mut UidAllocator,
    ) -> WalkOutput<D::Shape> {
        self.walk_with(doc, uids, &mut |_: &WalkEvent| ControlFlow::Continue(()))
    }

    /// Like [`walk`](Self::walk), reporting every event to `observer`.
    pub fn walk_with<D: CafDocument>(
        &self,
        doc: &mut D,
        uids: &mut UidAllocator,
        observer: &mut dyn WalkObserver,
    ) -> WalkOutput<D::Shape> {
        let mut out = WalkOutput::default();
        let roots = doc.free_shapes();
        out.report.roots = roots.len();

        let flow = self.walk_roots(doc, uids, observer, roots, &mut out);
        if flow.is_break() {
            out.report.status = WalkStatus::Cancelled;
        }
        out
    }

    fn walk_roots<D: CafDocument>(
        &self,
        doc: &mut D,
        uids: &mut UidAllocator,
        observer: &mut dyn WalkObserver,
        roots: Vec<D::Label>,
        out: &mut WalkOutput<D::Shape>,
    ) -> ControlFlow<()> {
        emit(observer, WalkEvent::Roots { count: roots.len() })?;
        for root in roots {
            // each root starts a fresh lineage
            let frame = Frame {
                label: root,
                via: None,
                location: Transform::identity(),
                parent: None,
                depth: 0,
            };
            self.walk_root(doc, uids, observer, frame, out)?;
        }
        ControlFlow::Continue(())
    }

    fn walk_root<D: CafDocument>(
        &self,
        doc: &mut D,
        uids: &mut UidAllocator,
        observer: &mut dyn WalkObserver,
        root: Frame<D::Label>,
        out: &mut WalkOutput<D::Shape>,
    ) -> ControlFlow<()> {
        let mut stack = vec![root];

        while let Some(frame) = stack.pop() {
            if let Some(component) = &frame.via {
                let uid = uids.allocate(&doc.entry(component));
                let event = WalkEvent::Component {
                    uid,
                    name: doc.label_name(component),
                    target: doc.entry(&frame.label),
                    location: doc.location(component),
                };
                emit(observer, event)?;
            }

            let entry = doc.entry(&frame.label);
            let uid = uids.allocate(&entry);
            let name = doc.label_name(&frame.label);
            out.report.visited += 1;
            emit(
                observer,
                WalkEvent::Label {
                    uid: uid.clone(),
                    name: name.clone(),
                    parent: frame.parent.clone(),
                    depth: frame.depth,
                },
            )?;

            if doc.is_assembly(&frame.label) {
                let record = LabelRecord {
                    entry,
                    name,
                    parent_uid: frame.parent.clone(),
                    is_assembly: true,
                };
                let previous = out.labels.insert(uid.clone(), record);
                debug_assert!(previous.is_none(), "uid {uid} allocated twice");

                let children = self.expand(doc, &frame, &uid, observer, out)?;
                emit(
                    observer,
                    WalkEvent::Assembly {
                        uid,
                        components: children.len(),
                    },
                )?;
                // reversed so the first component is visited first
                stack.extend(children.into_iter().rev());
            } else if doc.is_simple_shape(&frame.label) {
                let record = LabelRecord {
                    entry,
                    name: name.clone(),
                    parent_uid: frame.parent.clone(),
                    is_assembly: false,
                };
                let previous = out.labels.insert(uid.clone(), record);
                debug_assert!(previous.is_none(), "uid {uid} allocated twice");

                self.visit_part(doc, &frame, uid, name, observer, out)?;
            } else {
                emit(observer, WalkEvent::Skipped { uid })?;
            }
        }

        ControlFlow::Continue(())
    }

    /// Frames for the components of an assembly, in document order.
    fn expand<D: CafDocument>(
        &self,
        doc: &D,
        frame: &Frame<D::Label>,
        assembly: &Uid,
        observer: &mut dyn WalkObserver,
        out: &mut WalkOutput<D::Shape>,
    ) -> ControlFlow<(), Vec<Frame<D::Label>>> {
        let mut children = Vec::new();

        for component in doc.components(&frame.label) {
            if !doc.is_reference(&component) {
                let warning = WalkWarning::NotAReference {
                    assembly: assembly.clone(),
                    entry: doc.entry(&component),
                };
                warn(observer, out, warning)?;
                continue;
            }

            let Some(target) = doc.referred_shape(&component) else {
                let warning = WalkWarning::UnresolvableReference {
                    assembly: assembly.clone(),
                    entry: doc.entry(&component),
                    name: doc.label_name(&component),
                };
                warn(observer, out, warning)?;
                continue;
            };

            let depth = frame.depth + 1;
            if let Some(limit) = self.config.max_depth {
                if depth > limit {
                    let warning = WalkWarning::DepthLimit {
                        entry: doc.entry(&component),
                        depth,
                        limit,
                    };
                    warn(observer, out, warning)?;
                    continue;
                }
            }

            let location = frame.location.then(&doc.location(&component));
            children.push(Frame {
                label: target,
                via: Some(component),
                location,
                parent: Some(assembly.clone()),
                depth,
            });
        }

        ControlFlow::Continue(children)
    }

    /// Record the part of a simple-shape label and register its sub-shapes.
    fn visit_part<D: CafDocument>(
        &self,
        doc: &mut D,
        frame: &Frame<D::Label>,
        uid: Uid,
        name: String,
        observer: &mut dyn WalkObserver,
        out: &mut WalkOutput<D::Shape>,
    ) -> ControlFlow<()> {
        let Some(raw) = doc.shape(&frame.label) else {
            let warning = WalkWarning::MissingShape {
                entry: doc.entry(&frame.label),
            };
            return warn(observer, out, warning);
        };

        let resolved = normalize_color(doc, &raw, &frame.label, self.config);
        let positioned = doc.transform_shape(&raw, &frame.location);
        out.display_shapes
            .register(positioned.clone(), name.clone(), resolved.color);
        out.parts.insert(
            uid.clone(),
            PartRecord {
                shape: positioned,
                name,
                color: resolved.color,
                color_source: resolved.source,
                location: frame.location.clone(),
            },
        );
        emit(
            observer,
            WalkEvent::Part {
                uid,
                color: resolved.color,
                source: resolved.source,
                location: frame.location.clone(),
            },
        )?;

        for sub in doc.sub_shapes(&frame.label) {
            let Some(sub_raw) = doc.shape(&sub) else {
                let warning = WalkWarning::MissingShape {
                    entry: doc.entry(&sub),
                };
                warn(observer, out, warning)?;
                continue;
            };
            let sub_color = normalize_color(doc, &sub_raw, &sub, self.config);
            let sub_positioned = doc.transform_shape(&sub_raw, &frame.location);
            out.display_shapes
                .register(sub_positioned, doc.label_name(&sub), sub_color.color);
            emit(
                observer,
                WalkEvent::SubShape {
                    entry: doc.entry(&sub),
                    color: sub_color.color,
                    source: sub_color.source,
                },
            )?;
        }

        ControlFlow::Continue(())
    }
}

fn emit(observer: &mut dyn WalkObserver, event: WalkEvent) -> ControlFlow<()> {
    event.trace();
    observer.on_event(&event)
}

fn warn<S>(
    observer: &mut dyn WalkObserver,
    out: &mut WalkOutput<S>,
    warning: WalkWarning,
) -> ControlFlow<()> {
    out.report.warnings.push(warning.clone());
    emit(observer, WalkEvent::Warning(warning))
}
