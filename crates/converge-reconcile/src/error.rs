//! Error types for the reconciler.

use converge_diff::{DiffError, PatchError};
use converge_store::StoreError;
use converge_types::TypeError;

/// Errors produced by a reconcile cycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconcileError {
    /// The projection names a field the body type does not have.
    #[error("kind '{kind}' has no field '{field}'")]
    UnknownField { kind: String, field: String },

    /// Implant was handed a null projection.
    #[error("cannot implant a null projection")]
    EmptyProjection,

    /// The live object carries no client checkpoint annotation.
    #[error("object {namespace}/{name} has no client checkpoint")]
    MissingCheckpoint { name: String, namespace: String },

    /// A store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Computing a drift or intent diff failed.
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    /// Applying a drift or intent change set failed.
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    /// Checkpoint or projection (de)serialization failed.
    #[error("encoding error: {0}")]
    Encoding(#[from] TypeError),

    /// Checkpoint JSON could not be parsed.
    #[error("checkpoint decode error: {0}")]
    CheckpointDecode(String),
}

/// Convenience alias for reconciler results.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
