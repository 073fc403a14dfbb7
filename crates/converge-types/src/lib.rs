//! Foundation types for the converge engine.
//!
//! This crate provides the runtime value model, the structural type
//! descriptors, and the path addressing used throughout the converge
//! workspace. Every other converge crate depends on `converge-types`.
//!
//! # Key Types
//!
//! - [`Value`] / [`Scalar`] / [`Key`] — Tagged-union runtime representation
//! - [`ValueType`] / [`ScalarKind`] / [`RecordType`] — Structural type descriptors
//! - [`TypedValue`] — A value paired with its validated type
//! - [`Path`] / [`PathElement`] — Addresses into composite values
//! - [`deep_copy`] — Recursive structural duplication
//! - [`value_to_json`] / [`value_from_json`] — Type-directed JSON codec

pub mod copy;
pub mod error;
pub mod json;
pub mod path;
pub mod types;
pub mod value;

pub use copy::deep_copy;
pub use error::{TypeError, TypeResult};
pub use json::{value_from_json, value_to_json};
pub use path::{Path, PathElement};
pub use types::{FieldType, RecordType, ScalarKind, ValueType};
pub use value::{Key, Scalar, TypedValue, Value};
