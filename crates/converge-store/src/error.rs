//! Error types for the store seam.

use converge_types::TypeError;

/// Errors produced by store operations and the object codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The named object does not exist.
    #[error("object {namespace}/{name} not found")]
    NotFound { name: String, namespace: String },

    /// Create of an object that already exists.
    #[error("object {namespace}/{name} already exists")]
    AlreadyExists { name: String, namespace: String },

    /// Optimistic-concurrency rejection of a stale write.
    #[error("stale write to {namespace}/{name}: resource version mismatch")]
    Conflict { name: String, namespace: String },

    /// The kind is not registered in the schema.
    #[error("unknown kind '{0}'")]
    UnknownKind(String),

    /// A kind was registered twice.
    #[error("kind '{0}' is already registered")]
    KindExists(String),

    /// A body the schema or store cannot accept.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A controller reference would overwrite a different controller.
    #[error("object {name} is already controlled by {owner}")]
    OwnerConflict { name: String, owner: String },

    /// A patch body the store cannot interpret.
    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Validation or codec failure from the value model.
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// The caller-scoped cancellation handle fired.
    #[error("operation cancelled")]
    Cancelled,

    /// Anything else from the store backend.
    #[error("store failure: {0}")]
    Failure(String),
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
