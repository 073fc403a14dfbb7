//! Path-addressed changes and their ordered collection.

use std::fmt;

use converge_types::{Path, Value, ValueType};

/// A single change to a value.
///
/// Modifications and deletions carry the old endpoint for diagnostic
/// equality; only the path and the new value affect patching.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// The value at `path` changed from `old` to `new`.
    Modify { path: Path, old: Value, new: Value },
    /// A value was added at `path`.
    Add { path: Path, new: Value },
    /// The value at `path` was removed.
    Delete { path: Path, old: Value },
}

impl Change {
    /// The path this change addresses.
    pub fn path(&self) -> &Path {
        match self {
            Self::Modify { path, .. } | Self::Add { path, .. } | Self::Delete { path, .. } => path,
        }
    }

    /// Returns `true` for deletions.
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }

    /// The new value, when this change carries one.
    pub fn new_value(&self) -> Option<&Value> {
        match self {
            Self::Modify { new, .. } | Self::Add { new, .. } => Some(new),
            Self::Delete { .. } => None,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete { path, .. } => write!(f, "{path} -> [deleted]"),
            Self::Modify { path, new, .. } | Self::Add { path, new } => {
                write!(f, "{path} -> {new:?}")
            }
        }
    }
}

/// An ordered list of changes against a base type.
///
/// Order is significant: sequence deletions assume no prior addition has
/// shifted indices, and the patch engine applies changes front to back.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeSet {
    base: ValueType,
    changes: Vec<Change>,
}

impl ChangeSet {
    /// An empty change set against the given base type.
    pub fn new(base: ValueType) -> Self {
        Self {
            base,
            changes: Vec::new(),
        }
    }

    /// The type both diff inputs shared.
    pub fn base(&self) -> &ValueType {
        &self.base
    }

    /// The changes in application order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Record a modification.
    pub(crate) fn push_modify(&mut self, path: Path, old: Value, new: Value) {
        self.changes.push(Change::Modify { path, old, new });
    }

    /// Record an addition.
    pub(crate) fn push_add(&mut self, path: Path, new: Value) {
        self.changes.push(Change::Add { path, new });
    }

    /// Record a deletion.
    pub(crate) fn push_delete(&mut self, path: Path, old: Value) {
        self.changes.push(Change::Delete { path, old });
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "base: {} changes:", self.base.kind_name())?;
        for change in &self.changes {
            writeln!(f, "  {change}")?;
        }
        Ok(())
    }
}
