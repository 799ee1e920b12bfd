//! Error and warning types.

use std::path::PathBuf;

use stepview_kernel::LoadError;
use thiserror::Error;

use crate::uid::Uid;

/// Errors from a [`DocModel`](crate::DocModel) session.
#[derive(Error, Debug)]
pub enum ModelError {
    /// No file was given; the model is unchanged.
    #[error("Load cancelled: no file given")]
    LoadCancelled,

    /// The file could not be loaded; the tables are now empty.
    #[error("Failed to load {}: {source}", path.display())]
    Load {
        /// The file that failed to load.
        path: PathBuf,
        /// Why it failed.
        #[source]
        source: LoadError,
    },
}

/// Errors from reading a [`WalkConfig`](crate::WalkConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading the config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for a walk config.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The values parsed but make no sense together.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Problems found while walking a document.
///
/// None of these stop the walk: the offending component or shape is skipped
/// and the walk goes on with its siblings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalkWarning {
    /// An assembly component is not a reference label.
    #[error("Component {entry} of assembly {assembly} is not a reference")]
    NotAReference {
        /// Uid of the assembly.
        assembly: Uid,
        /// Entry of the component.
        entry: String,
    },

    /// A component refers to a label that cannot be found.
    #[error("Component {entry} ({name}) of assembly {assembly} refers to nothing")]
    UnresolvableReference {
        /// Uid of the assembly.
        assembly: Uid,
        /// Entry of the component.
        entry: String,
        /// Name of the component.
        name: String,
    },

    /// A simple shape or sub-shape label has no shape attached.
    #[error("Label {entry} has no shape")]
    MissingShape {
        /// Entry of the label.
        entry: String,
    },

    /// A component is nested deeper than the configured limit.
    #[error("Component {entry} at depth {depth} exceeds the depth limit of {limit}")]
    DepthLimit {
        /// Entry of the component.
        entry: String,
        /// Depth its target would be visited at.
        depth: usize,
        /// The configured limit.
        limit: usize,
    },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
