//! Error types for the value model.

/// Errors produced by type validation, conformance checks, and the JSON codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// A kind the engine declines to process (e.g. a float map key).
    #[error("unsupported kind '{0}'")]
    UnsupportedKind(String),

    /// A value does not have the shape its declared type requires.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },

    /// A structurally invalid type descriptor.
    #[error("invalid type: {0}")]
    Invalid(String),

    /// JSON decoding failed.
    #[error("decode error at {location}: {reason}")]
    Decode { location: String, reason: String },

    /// JSON encoding failed.
    #[error("encode error: {0}")]
    Encode(String),
}

/// Convenience alias for results in this crate.
pub type TypeResult<T> = Result<T, TypeError>;
