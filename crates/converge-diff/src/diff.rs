//! Lock-step structural comparison.
//!
//! Walks two same-typed values in parallel and emits a path-addressed
//! change per divergence. Record fields are visited in declaration order,
//! tuples and sequences by ascending index, and mappings in ascending key
//! order (the map representation's iteration order).
//!
//! Known limitations, kept deliberately: renaming a mapping key reports a
//! deletion plus an addition, and sequence comparison is positional, so a
//! reorder produces spurious modifications.

use converge_types::{Path, PathElement, TypeError, TypedValue, Value, ValueType};

use crate::change::ChangeSet;
use crate::error::{DiffError, DiffResult};

/// Compute the change set between two values of the same type.
///
/// Returns [`DiffError::TypeMismatch`] when the inputs' types differ.
/// `diff(a, a)` yields an empty change set.
pub fn diff(a: &TypedValue, b: &TypedValue) -> DiffResult<ChangeSet> {
    if a.ty() != b.ty() {
        return Err(DiffError::TypeMismatch {
            left: a.ty().kind_name().to_string(),
            right: b.ty().kind_name().to_string(),
        });
    }

    let mut cs = ChangeSet::new(a.ty().clone());
    walk(a.ty(), a.value(), b.value(), &Path::root(), &mut cs)?;
    Ok(cs)
}

fn walk(
    ty: &ValueType,
    v1: &Value,
    v2: &Value,
    path: &Path,
    cs: &mut ChangeSet,
) -> DiffResult<()> {
    match ty {
        ValueType::Scalar(_) => {
            let (Value::Scalar(s1), Value::Scalar(s2)) = (v1, v2) else {
                return Err(shape_err(ty, v1));
            };
            if s1 != s2 {
                cs.push_modify(path.clone(), v1.clone(), v2.clone());
            }
            Ok(())
        }
        ValueType::Record(rt) => {
            let (Value::Record(f1), Value::Record(f2)) = (v1, v2) else {
                return Err(shape_err(ty, v1));
            };
            if f1.len() != rt.len() || f2.len() != rt.len() {
                return Err(shape_err(ty, v1));
            }
            for (i, field) in rt.fields().iter().enumerate() {
                let child = path.child(PathElement::field(i, field.name.clone()));
                walk(&field.ty, &f1[i], &f2[i], &child, cs)?;
            }
            Ok(())
        }
        ValueType::Tuple(elems) => {
            let (Value::Tuple(t1), Value::Tuple(t2)) = (v1, v2) else {
                return Err(shape_err(ty, v1));
            };
            if t1.len() != elems.len() || t2.len() != elems.len() {
                return Err(shape_err(ty, v1));
            }
            for (i, elem_ty) in elems.iter().enumerate() {
                let child = path.child(PathElement::index(i));
                walk(elem_ty, &t1[i], &t2[i], &child, cs)?;
            }
            Ok(())
        }
        ValueType::Seq(elem_ty) => {
            let (Value::Seq(s1), Value::Seq(s2)) = (v1, v2) else {
                return Err(shape_err(ty, v1));
            };
            let min_len = s1.len().min(s2.len());
            for i in 0..min_len {
                let child = path.child(PathElement::index(i));
                walk(elem_ty, &s1[i], &s2[i], &child, cs)?;
            }
            // Trailing elements: deletions when the left side is longer,
            // additions when the right side is. Ascending order either way;
            // patch truncates deletions from the tail.
            if s1.len() > s2.len() {
                for (i, old) in s1.iter().enumerate().skip(min_len) {
                    cs.push_delete(path.child(PathElement::index(i)), old.clone());
                }
            } else {
                for (i, new) in s2.iter().enumerate().skip(min_len) {
                    cs.push_add(path.child(PathElement::index(i)), new.clone());
                }
            }
            Ok(())
        }
        ValueType::Map { value: val_ty, .. } => {
            let (Value::Map(m1), Value::Map(m2)) = (v1, v2) else {
                return Err(shape_err(ty, v1));
            };
            for (key, val1) in m1 {
                let child = path.child(PathElement::key(key.clone()));
                match m2.get(key) {
                    Some(val2) => walk(val_ty, val1, val2, &child, cs)?,
                    None => cs.push_delete(child, val1.clone()),
                }
            }
            for (key, val2) in m2 {
                if !m1.contains_key(key) {
                    let child = path.child(PathElement::key(key.clone()));
                    cs.push_add(child, val2.clone());
                }
            }
            Ok(())
        }
        ValueType::Opt(inner_ty) => {
            let (Value::Opt(o1), Value::Opt(o2)) = (v1, v2) else {
                return Err(shape_err(ty, v1));
            };
            let child = path.child(PathElement::deref());
            match (o1, o2) {
                (None, None) => Ok(()),
                (None, Some(new)) => {
                    cs.push_add(child, (**new).clone());
                    Ok(())
                }
                (Some(old), None) => {
                    cs.push_delete(child, (**old).clone());
                    Ok(())
                }
                (Some(i1), Some(i2)) => walk(inner_ty, i1, i2, &child, cs),
            }
        }
    }
}

fn shape_err(expected: &ValueType, actual: &Value) -> DiffError {
    DiffError::Type(TypeError::Mismatch {
        expected: expected.kind_name().to_string(),
        actual: actual.kind_name().to_string(),
    })
}
