//! A document session: one document plus the tables of its last walk.

use std::ops::ControlFlow;
use std::path::Path;

use stepview_kernel::{CafDocument, DocumentLoader};

use crate::config::{CounterPolicy, WalkConfig};
use crate::error::{ConfigError, ModelError, Result};
use crate::events::{WalkEvent, WalkObserver};
use crate::tables::{DisplayShapes, LabelTable, PartTable};
use crate::uid::UidAllocator;
use crate::walker::{WalkOutput, WalkReport, Walker};

type Shape<L> = <<L as DocumentLoader>::Document as CafDocument>::Shape;

/// Owns a document and the part/label tables built from it.
///
/// A new model holds an empty document with a single root assembly named
/// "Top", already walked.
pub struct DocModel<L: DocumentLoader> {
    loader: L,
    config: WalkConfig,
    doc: L::Document,
    uids: UidAllocator,
    output: WalkOutput<Shape<L>>,
}

impl<L: DocumentLoader> DocModel<L> {
    /// Create a model with the default config.
    pub fn new(loader: L) -> Self {
        Self::build(loader, WalkConfig::default())
    }

    /// Create a model with `config`, which must pass
    /// [`WalkConfig::validate`].
    pub fn with_config(loader: L, config: WalkConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(loader, config))
    }

    fn build(loader: L, config: WalkConfig) -> Self {
        let mut doc = loader.new_document();
        let top = doc.new_shape();
        doc.set_label_name(&top, "Top");

        let mut model = Self {
            loader,
            config,
            doc,
            uids: UidAllocator::new(),
            output: WalkOutput::default(),
        };
        model.parse_doc();
        model
    }

    // =========================================================================
    // Loading and walking
    // =========================================================================

    /// Load a document from `path` and rebuild the tables.
    ///
    /// An empty path means the user picked nothing: the model is left as is
    /// and [`ModelError::LoadCancelled`] is returned. If loading fails the
    /// tables are cleared, the previous document is kept, and the error is
    /// returned.
    pub fn load_step(&mut self, path: impl AsRef<Path>) -> Result<&WalkReport> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            tracing::info!("load cancelled");
            return Err(ModelError::LoadCancelled);
        }

        match self.loader.load(path) {
            Ok(doc) => {
                tracing::info!(path = %path.display(), "document loaded");
                self.doc = doc;
                if self.config.counter_policy == CounterPolicy::ResetOnLoad {
                    self.uids.reset();
                }
                Ok(self.parse_doc())
            }
            Err(source) => {
                tracing::error!(path = %path.display(), error = %source, "load failed");
                self.output = WalkOutput::default();
                Err(ModelError::Load {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// Walk the current document and replace the tables.
    pub fn parse_doc(&mut self) -> &WalkReport {
        self.parse_doc_with(&mut |_: &WalkEvent| ControlFlow::Continue(()))
    }

    /// Like [`parse_doc`](Self::parse_doc), reporting every event to
    /// `observer`.
    pub fn parse_doc_with(&mut self, observer: &mut dyn WalkObserver) -> &WalkReport {
        if self.config.counter_policy == CounterPolicy::ResetOnWalk {
            self.uids.reset();
        }
        let walker = Walker::new(&self.config);
        self.output = walker.walk_with(&mut self.doc, &mut self.uids, observer);

        let report = &self.output.report;
        tracing::info!(
            parts = self.output.parts.len(),
            labels = self.output.labels.len(),
            warnings = report.warnings.len(),
            status = ?report.status,
            "document walked"
        );
        report
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The current document.
    pub fn document(&self) -> &L::Document {
        &self.doc
    }

    /// The current document, mutably. Call [`parse_doc`](Self::parse_doc)
    /// afterwards to refresh the tables.
    pub fn document_mut(&mut self) -> &mut L::Document {
        &mut self.doc
    }

    /// Rename a label. The tables keep the old name until the next walk.
    pub fn set_label_name(&mut self, label: &<L::Document as CafDocument>::Label, name: &str) {
        self.doc.set_label_name(label, name);
    }

    /// Parts of the last walk.
    pub fn part_table(&self) -> &PartTable<Shape<L>> {
        &self.output.parts
    }

    /// Labels of the last walk.
    pub fn label_table(&self) -> &LabelTable {
        &self.output.labels
    }

    /// Display shapes of the last walk.
    pub fn display_shapes(&self) -> &DisplayShapes<Shape<L>> {
        &self.output.display_shapes
    }

    /// Report of the last walk.
    pub fn report(&self) -> &WalkReport {
        &self.output.report
    }

    /// The walk config.
    pub fn config(&self) -> &WalkConfig {
        &self.config
    }
}
