//! Recursive structural duplication.
//!
//! Duplicates a value variant by variant: records field-wise, tuples and
//! sequences element-wise preserving length, mappings key-and-value, and
//! indirections allocating a fresh cell when non-null. The copy shares no
//! storage with the source, so mutating one never affects the other.

use std::collections::BTreeMap;

use crate::value::{Scalar, Value};

/// Make an independent copy of a value.
pub fn deep_copy(value: &Value) -> Value {
    match value {
        Value::Scalar(s) => Value::Scalar(copy_scalar(s)),
        Value::Record(fields) => Value::Record(fields.iter().map(deep_copy).collect()),
        Value::Tuple(elems) => Value::Tuple(elems.iter().map(deep_copy).collect()),
        Value::Seq(elems) => {
            let mut copied = Vec::with_capacity(elems.capacity());
            copied.extend(elems.iter().map(deep_copy));
            Value::Seq(copied)
        }
        Value::Map(entries) => {
            let mut copied = BTreeMap::new();
            for (key, val) in entries {
                copied.insert(key.clone(), deep_copy(val));
            }
            Value::Map(copied)
        }
        Value::Opt(inner) => match inner {
            Some(v) => Value::Opt(Some(Box::new(deep_copy(v)))),
            None => Value::Opt(None),
        },
    }
}

fn copy_scalar(scalar: &Scalar) -> Scalar {
    match scalar {
        Scalar::Int(i) => Scalar::Int(*i),
        Scalar::UInt(u) => Scalar::UInt(*u),
        Scalar::Float(f) => Scalar::Float(*f),
        Scalar::Complex { re, im } => Scalar::Complex { re: *re, im: *im },
        Scalar::Bool(b) => Scalar::Bool(*b),
        Scalar::Str(s) => Scalar::Str(s.clone()),
    }
}
