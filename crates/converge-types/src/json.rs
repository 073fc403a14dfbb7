//! Type-directed JSON codec.
//!
//! JSON alone cannot restore the value model: numbers do not distinguish
//! int from uint, and objects do not distinguish records from mappings.
//! Decoding therefore walks a [`ValueType`] and the JSON document in
//! lock-step; encoding needs the type as well, for record field names.
//!
//! Encodings: scalars as JSON primitives, complex as `[re, im]`, records
//! as objects keyed by field name, tuples and sequences as arrays,
//! mappings as objects with canonical key strings, indirections as `null`
//! or the inner encoding. Non-finite floats have no JSON number form and
//! are rejected at encode time.

use serde_json::{Map, Number};

use crate::error::{TypeError, TypeResult};
use crate::types::{ScalarKind, ValueType};
use crate::value::{Key, Scalar, Value};

/// Encode a value into its JSON representation.
pub fn value_to_json(ty: &ValueType, value: &Value) -> TypeResult<serde_json::Value> {
    match (ty, value) {
        (ValueType::Scalar(kind), Value::Scalar(s)) if s.kind() == *kind => scalar_to_json(s),
        (ValueType::Record(rt), Value::Record(fields)) if fields.len() == rt.len() => {
            let mut out = Map::with_capacity(fields.len());
            for (field_ty, field_value) in rt.fields().iter().zip(fields) {
                out.insert(
                    field_ty.name.clone(),
                    value_to_json(&field_ty.ty, field_value)?,
                );
            }
            Ok(serde_json::Value::Object(out))
        }
        (ValueType::Tuple(elems), Value::Tuple(vs)) if vs.len() == elems.len() => {
            let encoded: TypeResult<Vec<_>> = elems
                .iter()
                .zip(vs)
                .map(|(t, v)| value_to_json(t, v))
                .collect();
            Ok(serde_json::Value::Array(encoded?))
        }
        (ValueType::Seq(elem), Value::Seq(vs)) => {
            let encoded: TypeResult<Vec<_>> = vs.iter().map(|v| value_to_json(elem, v)).collect();
            Ok(serde_json::Value::Array(encoded?))
        }
        (ValueType::Map { value: val_ty, .. }, Value::Map(entries)) => {
            let mut out = Map::with_capacity(entries.len());
            for (key, val) in entries {
                out.insert(key.canonical_string(), value_to_json(val_ty, val)?);
            }
            Ok(serde_json::Value::Object(out))
        }
        (ValueType::Opt(inner), Value::Opt(v)) => match v {
            Some(v) => value_to_json(inner, v),
            None => Ok(serde_json::Value::Null),
        },
        _ => Err(TypeError::Encode(format!(
            "cannot encode {} as {}",
            value.kind_name(),
            ty.kind_name()
        ))),
    }
}

fn scalar_to_json(scalar: &Scalar) -> TypeResult<serde_json::Value> {
    match scalar {
        Scalar::Int(i) => Ok(serde_json::Value::Number((*i).into())),
        Scalar::UInt(u) => Ok(serde_json::Value::Number((*u).into())),
        Scalar::Float(f) => float_to_json(*f),
        Scalar::Complex { re, im } => Ok(serde_json::Value::Array(vec![
            float_to_json(*re)?,
            float_to_json(*im)?,
        ])),
        Scalar::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Scalar::Str(s) => Ok(serde_json::Value::String(s.clone())),
    }
}

// NaN and the infinities have no JSON number form; refusing them keeps
// every encoded value decodable.
fn float_to_json(f: f64) -> TypeResult<serde_json::Value> {
    Number::from_f64(f)
        .map(serde_json::Value::Number)
        .ok_or_else(|| TypeError::Encode(format!("non-finite float {f} has no JSON form")))
}

/// Decode a JSON document into a value of the given type.
///
/// Record fields absent from the document decode to their zero value;
/// unknown object keys are ignored. Everything else is strict.
pub fn value_from_json(ty: &ValueType, json: &serde_json::Value) -> TypeResult<Value> {
    decode(ty, json, "$")
}

fn decode(ty: &ValueType, json: &serde_json::Value, loc: &str) -> TypeResult<Value> {
    let err = |reason: String| TypeError::Decode {
        location: loc.to_string(),
        reason,
    };

    match ty {
        ValueType::Scalar(kind) => decode_scalar(*kind, json, loc),
        ValueType::Record(rt) => {
            let obj = json
                .as_object()
                .ok_or_else(|| err(format!("expected object, got {}", json_kind(json))))?;
            let mut fields = Vec::with_capacity(rt.len());
            for field in rt.fields() {
                match obj.get(&field.name) {
                    Some(v) => fields.push(decode(&field.ty, v, &format!("{loc}.{}", field.name))?),
                    None => fields.push(field.ty.zero()),
                }
            }
            Ok(Value::Record(fields))
        }
        ValueType::Tuple(elems) => {
            let arr = json
                .as_array()
                .ok_or_else(|| err(format!("expected array, got {}", json_kind(json))))?;
            if arr.len() != elems.len() {
                return Err(err(format!(
                    "expected {} tuple elements, got {}",
                    elems.len(),
                    arr.len()
                )));
            }
            let decoded: TypeResult<Vec<_>> = elems
                .iter()
                .zip(arr)
                .enumerate()
                .map(|(i, (t, v))| decode(t, v, &format!("{loc}[{i}]")))
                .collect();
            Ok(Value::Tuple(decoded?))
        }
        ValueType::Seq(elem) => {
            let arr = json
                .as_array()
                .ok_or_else(|| err(format!("expected array, got {}", json_kind(json))))?;
            let decoded: TypeResult<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| decode(elem, v, &format!("{loc}[{i}]")))
                .collect();
            Ok(Value::Seq(decoded?))
        }
        ValueType::Map { key, value } => {
            let obj = json
                .as_object()
                .ok_or_else(|| err(format!("expected object, got {}", json_kind(json))))?;
            let mut entries = std::collections::BTreeMap::new();
            for (raw_key, v) in obj {
                let parsed = Key::parse(*key, raw_key)?;
                entries.insert(parsed, decode(value, v, &format!("{loc}{{{raw_key}}}"))?);
            }
            Ok(Value::Map(entries))
        }
        ValueType::Opt(inner) => {
            if json.is_null() {
                Ok(Value::Opt(None))
            } else {
                Ok(Value::Opt(Some(Box::new(decode(
                    inner,
                    json,
                    &format!("{loc}*"),
                )?))))
            }
        }
    }
}

fn decode_scalar(kind: ScalarKind, json: &serde_json::Value, loc: &str) -> TypeResult<Value> {
    let err = |reason: String| TypeError::Decode {
        location: loc.to_string(),
        reason,
    };

    match kind {
        ScalarKind::Int => json
            .as_i64()
            .map(Value::int)
            .ok_or_else(|| err(format!("expected int, got {}", json_kind(json)))),
        ScalarKind::UInt => json
            .as_u64()
            .map(Value::uint)
            .ok_or_else(|| err(format!("expected uint, got {}", json_kind(json)))),
        ScalarKind::Float => json
            .as_f64()
            .map(Value::float)
            .ok_or_else(|| err(format!("expected float, got {}", json_kind(json)))),
        ScalarKind::Complex => {
            let arr = json
                .as_array()
                .ok_or_else(|| err(format!("expected [re, im], got {}", json_kind(json))))?;
            if arr.len() != 2 {
                return Err(err(format!("expected [re, im], got {} elements", arr.len())));
            }
            let re = arr[0]
                .as_f64()
                .ok_or_else(|| err("complex re part is not a number".to_string()))?;
            let im = arr[1]
                .as_f64()
                .ok_or_else(|| err("complex im part is not a number".to_string()))?;
            Ok(Value::complex(re, im))
        }
        ScalarKind::Bool => json
            .as_bool()
            .map(Value::boolean)
            .ok_or_else(|| err(format!("expected bool, got {}", json_kind(json)))),
        ScalarKind::Str => json
            .as_str()
            .map(Value::string)
            .ok_or_else(|| err(format!("expected string, got {}", json_kind(json)))),
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
