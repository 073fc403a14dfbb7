//! Error types for the diff and patch engines.

use converge_types::TypeError;

/// Errors produced while computing a diff.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// The two inputs do not share a type.
    #[error("type mismatch: left is {left}, right is {right}")]
    TypeMismatch { left: String, right: String },

    /// Validation, conformance, or unsupported-kind failure from the value
    /// model.
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

/// Errors produced while applying a change set.
///
/// Every path-shaped failure carries the rendered path prefix that was
/// reached, so a failure reads as ".spec(1).containers[2] became malformed".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// The target's type does not match the change set's base type.
    #[error("target type does not match change set base type")]
    BaseTypeMismatch,

    /// A path element is incompatible with the container it addresses.
    #[error("malformed path at '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    /// A sequence append gap or a field/tuple index out of range.
    #[error("out of bounds at '{path}': index {index}, length {len}")]
    OutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    /// Delete requested on a container without delete semantics.
    #[error("delete not supported at '{path}': {kind} has no delete semantics")]
    DeleteUnsupported { path: String, kind: String },

    /// An internal failure (including a caught panic) inside the patch flow.
    #[error("internal patch failure: {0}")]
    Internal(String),
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
