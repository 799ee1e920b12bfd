//! Error types for kernel documents.

use thiserror::Error;

/// Errors from building or editing a document.
#[derive(Error, Debug)]
pub enum KernelError {
    /// The label handle does not belong to this document.
    #[error("Unknown label")]
    UnknownLabel,

    /// Components can only be added to assembly labels.
    #[error("Label {0} is not an assembly")]
    NotAnAssembly(String),

    /// Sub-shapes can only be added to simple-shape labels.
    #[error("Label {0} is not a simple shape")]
    NotAPart(String),

    /// The component would make an assembly contain itself.
    #[error("Component of {assembly} referring to {target} would create a cycle")]
    CyclicReference {
        /// Entry of the assembly receiving the component.
        assembly: String,
        /// Entry of the referred label.
        target: String,
    },
}

/// Errors from loading a document.
#[derive(Error, Debug)]
pub enum LoadError {
    /// I/O error reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid document snapshot.
    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot parsed but is inconsistent.
    #[error("Invalid document: {0}")]
    Invalid(String),

    /// Building the document failed.
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
