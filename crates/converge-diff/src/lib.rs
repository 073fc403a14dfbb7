//! Diff and patch engine for the converge workspace.
//!
//! Computes a minimal ordered change set between two same-typed values and
//! re-applies change sets to a target value by navigating (and, where the
//! configuration allows, materializing) each change's path.
//!
//! # Key Types
//!
//! - [`Change`] / [`ChangeSet`] — Path-addressed edits and their ordered collection
//! - [`diff`] — Lock-step structural comparison
//! - [`Cursor`] / [`CursorConfig`] — Stateful path traversal with create-on-miss policies
//! - [`DiffError`] / [`PatchError`] — Typed failures; patch errors carry the rendered path

pub mod change;
pub mod cursor;
pub mod diff;
pub mod error;
pub mod patch;

pub use change::{Change, ChangeSet};
pub use cursor::{Cursor, CursorConfig};
pub use diff::diff;
pub use error::{DiffError, DiffResult, PatchError, PatchResult};
