//! Stateful path traversal with create-on-miss policies.
//!
//! A [`Cursor`] is anchored at a root value and walks a [`Path`] one
//! element at a time, materializing missing slots where its configuration
//! allows. When the path is exhausted, [`Cursor::set`] or
//! [`Cursor::delete`] is the only meaningful operation.
//!
//! In this representation every container entry is an addressable `&mut`
//! slot, so a write lands directly where the walk stops; no enclosing
//! container is rebuilt. Only indirections can be "null" here — sequences
//! and mappings are always present, possibly empty — so the
//! `create_missing_containers` policy governs dereferencing alone.

use std::collections::btree_map::Entry;

use converge_types::{Path, PathElement, Value, ValueType};

use crate::error::{PatchError, PatchResult};

/// Policies for materializing missing slots during traversal.
#[derive(Clone, Copy, Debug, Default)]
pub struct CursorConfig {
    /// Allocate an empty instance when dereferencing a null indirection.
    pub create_missing_containers: bool,
    /// Instantiate a zero value of the declared element type when the path
    /// targets a missing mapping entry or a one-past-end sequence position.
    pub create_missing_values: bool,
}

/// A traversal anchored at a root value, addressing one slot.
pub struct Cursor<'a> {
    ty: &'a ValueType,
    root: &'a mut Value,
    path: &'a Path,
    config: CursorConfig,
}

impl<'a> Cursor<'a> {
    /// Anchor a cursor at a root value of the given type.
    pub fn new(ty: &'a ValueType, root: &'a mut Value, path: &'a Path, config: CursorConfig) -> Self {
        Self {
            ty,
            root,
            path,
            config,
        }
    }

    /// Overwrite the addressed slot with a new value.
    ///
    /// Missing slots — intermediate or final — are materialized per the
    /// configuration: an absent mapping entry or a one-past-end sequence
    /// position needs `create_missing_values`, a null indirection needs
    /// `create_missing_containers`.
    pub fn set(self, new: Value) -> PatchResult<()> {
        let elements = self.path.elements();
        if elements.is_empty() {
            if !new.conforms(self.ty) {
                return Err(PatchError::MalformedPath {
                    path: String::new(),
                    reason: format!(
                        "cannot assign {} to {}",
                        new.kind_name(),
                        self.ty.kind_name()
                    ),
                });
            }
            *self.root = new;
            return Ok(());
        }

        let config = self.config;
        let (parent, parent_ty, last, rendered) = self.seek_parent()?;
        assign(parent, parent_ty, last, &rendered, config, new)
    }

    /// Remove the addressed slot.
    ///
    /// Only meaningful under a mapping (remove the entry), a sequence
    /// (truncate one element from the tail), or an indirection (set null).
    pub fn delete(self) -> PatchResult<()> {
        let elements = self.path.elements();
        if elements.is_empty() {
            return Err(PatchError::DeleteUnsupported {
                path: String::new(),
                kind: self.root.kind_name().to_string(),
            });
        }

        let (parent, _parent_ty, last, rendered) = self.seek_parent()?;
        match (parent, last) {
            (Value::Map(entries), PathElement::Key(key)) => {
                // Removing an absent key is a no-op.
                entries.remove(key);
                Ok(())
            }
            (Value::Seq(elems), PathElement::Index(index)) => {
                // Tail semantics: the last element is removed regardless of
                // which index the path named.
                if elems.pop().is_none() {
                    return Err(PatchError::OutOfBounds {
                        path: format!("{rendered}{last}"),
                        index: *index,
                        len: 0,
                    });
                }
                Ok(())
            }
            (Value::Opt(inner), PathElement::Deref) => {
                *inner = None;
                Ok(())
            }
            (parent @ (Value::Map(_) | Value::Seq(_) | Value::Opt(_)), _) => {
                Err(PatchError::MalformedPath {
                    path: format!("{rendered}{last}"),
                    reason: format!(
                        "path element does not address an entry of {}",
                        parent.kind_name()
                    ),
                })
            }
            (parent, _) => Err(PatchError::DeleteUnsupported {
                path: format!("{rendered}{last}"),
                kind: parent.kind_name().to_string(),
            }),
        }
    }

    /// Walk every path element but the last, returning the parent slot,
    /// its type, the final element, and the rendered prefix consumed.
    fn seek_parent(self) -> PatchResult<(&'a mut Value, &'a ValueType, &'a PathElement, String)> {
        let elements = self.path.elements();
        let mut current = self.root;
        let mut current_ty = self.ty;
        let mut rendered = String::new();

        for element in &elements[..elements.len() - 1] {
            let (value, ty) = advance(current, current_ty, element, &rendered, self.config)?;
            current = value;
            current_ty = ty;
            rendered.push_str(&element.to_string());
        }

        let last = &elements[elements.len() - 1];
        Ok((current, current_ty, last, rendered))
    }
}

/// Consume one path element: compute the next slot, materializing missing
/// mapping entries, sequence tails, and null indirections per the config.
fn advance<'a>(
    value: &'a mut Value,
    ty: &'a ValueType,
    element: &PathElement,
    rendered: &str,
    config: CursorConfig,
) -> PatchResult<(&'a mut Value, &'a ValueType)> {
    let at = || format!("{rendered}{element}");

    match element {
        PathElement::Field { index, .. } => {
            let ValueType::Record(rt) = ty else {
                return Err(malformed(at(), format!("cannot select a field of {}", ty.kind_name())));
            };
            let Some(field) = rt.field(*index) else {
                return Err(PatchError::OutOfBounds {
                    path: at(),
                    index: *index,
                    len: rt.len(),
                });
            };
            let Value::Record(fields) = value else {
                return Err(shape_drift(at()));
            };
            match fields.get_mut(*index) {
                Some(slot) => Ok((slot, &field.ty)),
                None => Err(shape_drift(at())),
            }
        }
        PathElement::Index(index) => match ty {
            ValueType::Tuple(elems) => {
                let Some(elem_ty) = elems.get(*index) else {
                    return Err(PatchError::OutOfBounds {
                        path: at(),
                        index: *index,
                        len: elems.len(),
                    });
                };
                let Value::Tuple(slots) = value else {
                    return Err(shape_drift(at()));
                };
                match slots.get_mut(*index) {
                    Some(slot) => Ok((slot, elem_ty)),
                    None => Err(shape_drift(at())),
                }
            }
            ValueType::Seq(elem_ty) => {
                let Value::Seq(slots) = value else {
                    return Err(shape_drift(at()));
                };
                if *index == slots.len() && config.create_missing_values {
                    slots.push(elem_ty.zero());
                }
                let len = slots.len();
                match slots.get_mut(*index) {
                    Some(slot) => Ok((slot, elem_ty)),
                    None => Err(PatchError::OutOfBounds {
                        path: at(),
                        index: *index,
                        len,
                    }),
                }
            }
            other => Err(malformed(
                at(),
                format!("cannot index into {}", other.kind_name()),
            )),
        },
        PathElement::Key(key) => {
            let ValueType::Map {
                key: key_kind,
                value: val_ty,
            } = ty
            else {
                return Err(malformed(at(), format!("cannot key into {}", ty.kind_name())));
            };
            if key.kind() != *key_kind {
                return Err(malformed(
                    at(),
                    format!("key kind {} does not match map key kind {key_kind}", key.kind()),
                ));
            }
            let Value::Map(entries) = value else {
                return Err(shape_drift(at()));
            };
            match entries.entry(key.clone()) {
                Entry::Occupied(slot) => Ok((slot.into_mut(), val_ty)),
                Entry::Vacant(slot) if config.create_missing_values => {
                    Ok((slot.insert(val_ty.zero()), val_ty))
                }
                Entry::Vacant(_) => Err(malformed(at(), "no entry for key".to_string())),
            }
        }
        PathElement::Deref => {
            let ValueType::Opt(inner_ty) = ty else {
                return Err(malformed(
                    at(),
                    format!("cannot dereference {}", ty.kind_name()),
                ));
            };
            let Value::Opt(inner) = value else {
                return Err(shape_drift(at()));
            };
            if inner.is_none() {
                if !config.create_missing_containers {
                    return Err(malformed(
                        at(),
                        "dereference through a null indirection".to_string(),
                    ));
                }
                *inner = Some(Box::new(inner_ty.zero()));
            }
            match inner {
                Some(boxed) => Ok((boxed.as_mut(), inner_ty)),
                None => Err(shape_drift(at())),
            }
        }
    }
}

/// Write `new` into the child slot of `parent` named by `element`.
///
/// Materializing a missing final slot is gated by the same config
/// policies `advance` applies to every earlier element.
fn assign(
    parent: &mut Value,
    parent_ty: &ValueType,
    element: &PathElement,
    rendered: &str,
    config: CursorConfig,
    new: Value,
) -> PatchResult<()> {
    let at = || format!("{rendered}{element}");
    let assign_err = |expected: &ValueType, actual: &Value| {
        malformed(
            at(),
            format!(
                "cannot assign {} to {}",
                actual.kind_name(),
                expected.kind_name()
            ),
        )
    };

    match element {
        PathElement::Field { index, .. } => {
            let ValueType::Record(rt) = parent_ty else {
                return Err(malformed(at(), format!("cannot select a field of {}", parent_ty.kind_name())));
            };
            let Some(field) = rt.field(*index) else {
                return Err(PatchError::OutOfBounds {
                    path: at(),
                    index: *index,
                    len: rt.len(),
                });
            };
            if !new.conforms(&field.ty) {
                return Err(assign_err(&field.ty, &new));
            }
            let Value::Record(fields) = parent else {
                return Err(shape_drift(at()));
            };
            match fields.get_mut(*index) {
                Some(slot) => {
                    *slot = new;
                    Ok(())
                }
                None => Err(shape_drift(at())),
            }
        }
        PathElement::Index(index) => match parent_ty {
            ValueType::Tuple(elems) => {
                let Some(elem_ty) = elems.get(*index) else {
                    return Err(PatchError::OutOfBounds {
                        path: at(),
                        index: *index,
                        len: elems.len(),
                    });
                };
                if !new.conforms(elem_ty) {
                    return Err(assign_err(elem_ty, &new));
                }
                let Value::Tuple(slots) = parent else {
                    return Err(shape_drift(at()));
                };
                match slots.get_mut(*index) {
                    Some(slot) => {
                        *slot = new;
                        Ok(())
                    }
                    None => Err(shape_drift(at())),
                }
            }
            ValueType::Seq(elem_ty) => {
                if !new.conforms(elem_ty) {
                    return Err(assign_err(elem_ty, &new));
                }
                let Value::Seq(slots) = parent else {
                    return Err(shape_drift(at()));
                };
                let len = slots.len();
                if *index < len {
                    slots[*index] = new;
                    Ok(())
                } else if *index == len && config.create_missing_values {
                    // Append is only legal at exactly one past the end.
                    slots.push(new);
                    Ok(())
                } else {
                    Err(PatchError::OutOfBounds {
                        path: at(),
                        index: *index,
                        len,
                    })
                }
            }
            other => Err(malformed(
                at(),
                format!("cannot index into {}", other.kind_name()),
            )),
        },
        PathElement::Key(key) => {
            let ValueType::Map {
                key: key_kind,
                value: val_ty,
            } = parent_ty
            else {
                return Err(malformed(at(), format!("cannot key into {}", parent_ty.kind_name())));
            };
            if key.kind() != *key_kind {
                return Err(malformed(
                    at(),
                    format!("key kind {} does not match map key kind {key_kind}", key.kind()),
                ));
            }
            if !new.conforms(val_ty) {
                return Err(assign_err(val_ty, &new));
            }
            let Value::Map(entries) = parent else {
                return Err(shape_drift(at()));
            };
            if !config.create_missing_values && !entries.contains_key(key) {
                return Err(malformed(at(), "no entry for key".to_string()));
            }
            entries.insert(key.clone(), new);
            Ok(())
        }
        PathElement::Deref => {
            let ValueType::Opt(inner_ty) = parent_ty else {
                return Err(malformed(
                    at(),
                    format!("cannot dereference {}", parent_ty.kind_name()),
                ));
            };
            if !new.conforms(inner_ty) {
                return Err(assign_err(inner_ty, &new));
            }
            let Value::Opt(inner) = parent else {
                return Err(shape_drift(at()));
            };
            if inner.is_none() && !config.create_missing_containers {
                return Err(malformed(
                    at(),
                    "dereference through a null indirection".to_string(),
                ));
            }
            *inner = Some(Box::new(new));
            Ok(())
        }
    }
}

fn malformed(path: String, reason: String) -> PatchError {
    PatchError::MalformedPath { path, reason }
}

/// A value stopped matching its declared type mid-walk. This indicates the
/// pairing invariant was violated before the cursor ran.
fn shape_drift(path: String) -> PatchError {
    PatchError::Internal(format!("value does not match its declared type at '{path}'"))
}
