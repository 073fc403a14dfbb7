//! Runtime value representation.
//!
//! [`Value`] is a tagged union covering the universe of supported shapes:
//! scalars, ordered records, fixed-length tuples, sequences, keyed
//! mappings, and optional indirections. The companion descriptors live in
//! [`crate::types`]; a [`TypedValue`] pairs the two after a one-time
//! conformance check.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{TypeError, TypeResult};
use crate::types::{ScalarKind, ValueType};

/// A primitive scalar value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex { re: f64, im: f64 },
    Bool(bool),
    Str(String),
}

impl Scalar {
    /// The kind this scalar belongs to.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Int(_) => ScalarKind::Int,
            Self::UInt(_) => ScalarKind::UInt,
            Self::Float(_) => ScalarKind::Float,
            Self::Complex { .. } => ScalarKind::Complex,
            Self::Bool(_) => ScalarKind::Bool,
            Self::Str(_) => ScalarKind::Str,
        }
    }
}

/// A mapping key: the comparable scalar variants only.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    UInt(u64),
    Bool(bool),
    Str(String),
}

impl Key {
    /// The scalar kind of this key.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Int(_) => ScalarKind::Int,
            Self::UInt(_) => ScalarKind::UInt,
            Self::Bool(_) => ScalarKind::Bool,
            Self::Str(_) => ScalarKind::Str,
        }
    }

    /// Convert a scalar into a key, rejecting non-comparable kinds.
    pub fn from_scalar(scalar: Scalar) -> TypeResult<Self> {
        match scalar {
            Scalar::Int(i) => Ok(Self::Int(i)),
            Scalar::UInt(u) => Ok(Self::UInt(u)),
            Scalar::Bool(b) => Ok(Self::Bool(b)),
            Scalar::Str(s) => Ok(Self::Str(s)),
            other => Err(TypeError::UnsupportedKind(format!(
                "{} map key",
                other.kind()
            ))),
        }
    }

    /// View this key as a scalar.
    pub fn to_scalar(&self) -> Scalar {
        match self {
            Self::Int(i) => Scalar::Int(*i),
            Self::UInt(u) => Scalar::UInt(*u),
            Self::Bool(b) => Scalar::Bool(*b),
            Self::Str(s) => Scalar::Str(s.clone()),
        }
    }

    /// Canonical string form, used for JSON object keys.
    pub fn canonical_string(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::UInt(u) => u.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Str(s) => s.clone(),
        }
    }

    /// Parse a canonical string form back into a key of the given kind.
    pub fn parse(kind: ScalarKind, raw: &str) -> TypeResult<Self> {
        let decode_err = |reason: String| TypeError::Decode {
            location: format!("map key '{raw}'"),
            reason,
        };
        match kind {
            ScalarKind::Int => raw
                .parse::<i64>()
                .map(Self::Int)
                .map_err(|e| decode_err(e.to_string())),
            ScalarKind::UInt => raw
                .parse::<u64>()
                .map(Self::UInt)
                .map_err(|e| decode_err(e.to_string())),
            ScalarKind::Bool => raw
                .parse::<bool>()
                .map(Self::Bool)
                .map_err(|e| decode_err(e.to_string())),
            ScalarKind::Str => Ok(Self::Str(raw.to_string())),
            other => Err(TypeError::UnsupportedKind(format!("{other} map key"))),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}

/// A structured runtime value.
///
/// Record fields are stored positionally in declaration order; their names
/// live in the companion [`RecordType`](crate::RecordType). Mapping entries
/// are kept in a `BTreeMap`, which fixes the engine's mapping iteration
/// order to ascending key order.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Record(Vec<Value>),
    Tuple(Vec<Value>),
    Seq(Vec<Value>),
    Map(BTreeMap<Key, Value>),
    Opt(Option<Box<Value>>),
}

impl Value {
    /// Shorthand for a signed integer scalar.
    pub fn int(v: i64) -> Self {
        Self::Scalar(Scalar::Int(v))
    }

    /// Shorthand for an unsigned integer scalar.
    pub fn uint(v: u64) -> Self {
        Self::Scalar(Scalar::UInt(v))
    }

    /// Shorthand for a float scalar.
    pub fn float(v: f64) -> Self {
        Self::Scalar(Scalar::Float(v))
    }

    /// Shorthand for a complex scalar.
    pub fn complex(re: f64, im: f64) -> Self {
        Self::Scalar(Scalar::Complex { re, im })
    }

    /// Shorthand for a boolean scalar.
    pub fn boolean(v: bool) -> Self {
        Self::Scalar(Scalar::Bool(v))
    }

    /// Shorthand for a string scalar.
    pub fn string(v: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Str(v.into()))
    }

    /// Shorthand for a present indirection.
    pub fn some(v: Value) -> Self {
        Self::Opt(Some(Box::new(v)))
    }

    /// Shorthand for a null indirection.
    pub fn none() -> Self {
        Self::Opt(None)
    }

    /// Short name of this value's kind, for error rendering.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(s) => match s.kind() {
                ScalarKind::Int => "int",
                ScalarKind::UInt => "uint",
                ScalarKind::Float => "float",
                ScalarKind::Complex => "complex",
                ScalarKind::Bool => "bool",
                ScalarKind::Str => "string",
            },
            Self::Record(_) => "record",
            Self::Tuple(_) => "tuple",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "map",
            Self::Opt(_) => "optional",
        }
    }

    /// Check that this value has the shape the given type requires.
    pub fn conforms(&self, ty: &ValueType) -> bool {
        match (ty, self) {
            (ValueType::Scalar(kind), Value::Scalar(s)) => s.kind() == *kind,
            (ValueType::Record(rt), Value::Record(fields)) => {
                fields.len() == rt.len()
                    && rt
                        .fields()
                        .iter()
                        .zip(fields)
                        .all(|(f, v)| v.conforms(&f.ty))
            }
            (ValueType::Tuple(elems), Value::Tuple(vs)) => {
                vs.len() == elems.len() && elems.iter().zip(vs).all(|(t, v)| v.conforms(t))
            }
            (ValueType::Seq(elem), Value::Seq(vs)) => vs.iter().all(|v| v.conforms(elem)),
            (ValueType::Map { key, value }, Value::Map(entries)) => entries
                .iter()
                .all(|(k, v)| k.kind() == *key && v.conforms(value)),
            (ValueType::Opt(inner), Value::Opt(v)) => {
                v.as_ref().map_or(true, |v| v.conforms(inner))
            }
            _ => false,
        }
    }
}

/// A value paired with its validated type.
///
/// Construction checks both the type descriptor and the value's
/// conformance once; the engines then trust the pairing.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedValue {
    ty: ValueType,
    value: Value,
}

impl TypedValue {
    /// Pair a value with its type, validating the type and the shape.
    pub fn new(ty: ValueType, value: Value) -> TypeResult<Self> {
        ty.validate()?;
        if !value.conforms(&ty) {
            return Err(TypeError::Mismatch {
                expected: ty.kind_name().to_string(),
                actual: value.kind_name().to_string(),
            });
        }
        Ok(Self { ty, value })
    }

    /// The type descriptor.
    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    /// The value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Split into the type and a mutable view of the value.
    ///
    /// Mutation through this view must preserve conformance; the patch
    /// engine's bounds and kind checks enforce that.
    pub fn parts_mut(&mut self) -> (&ValueType, &mut Value) {
        (&self.ty, &mut self.value)
    }

    /// Consume the pair and return the value.
    pub fn into_value(self) -> Value {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    #[test]
    fn scalar_kinds() {
        assert_eq!(Value::int(1).kind_name(), "int");
        assert_eq!(Value::complex(1.0, -1.0).kind_name(), "complex");
        assert_eq!(Value::string("x").kind_name(), "string");
    }

    #[test]
    fn key_from_scalar_rejects_float() {
        let err = Key::from_scalar(Scalar::Float(1.5)).unwrap_err();
        assert!(matches!(err, TypeError::UnsupportedKind(_)));
    }

    #[test]
    fn key_canonical_roundtrip() {
        for (kind, key) in [
            (ScalarKind::Int, Key::Int(-42)),
            (ScalarKind::UInt, Key::UInt(7)),
            (ScalarKind::Bool, Key::Bool(true)),
            (ScalarKind::Str, Key::Str("name".into())),
        ] {
            let raw = key.canonical_string();
            assert_eq!(Key::parse(kind, &raw).unwrap(), key);
        }
    }

    #[test]
    fn conformance_accepts_matching_record() {
        let ty = ValueType::record(vec![
            FieldType::new("count", ValueType::int()),
            FieldType::new("name", ValueType::string()),
        ]);
        let value = Value::Record(vec![Value::int(3), Value::string("web")]);
        assert!(value.conforms(&ty));
    }

    #[test]
    fn conformance_rejects_field_count_mismatch() {
        let ty = ValueType::record(vec![FieldType::new("count", ValueType::int())]);
        let value = Value::Record(vec![Value::int(3), Value::string("extra")]);
        assert!(!value.conforms(&ty));
    }

    #[test]
    fn conformance_rejects_wrong_scalar_kind() {
        assert!(!Value::uint(1).conforms(&ValueType::int()));
    }

    #[test]
    fn conformance_checks_map_entries() {
        let ty = ValueType::map(ScalarKind::Str, ValueType::int());
        let mut entries = BTreeMap::new();
        entries.insert(Key::Str("a".into()), Value::int(1));
        assert!(Value::Map(entries.clone()).conforms(&ty));

        entries.insert(Key::Int(1), Value::int(2));
        assert!(!Value::Map(entries).conforms(&ty));
    }

    #[test]
    fn conformance_null_opt_matches_any_inner() {
        assert!(Value::none().conforms(&ValueType::opt(ValueType::string())));
        assert!(Value::some(Value::int(1)).conforms(&ValueType::opt(ValueType::int())));
        assert!(!Value::some(Value::int(1)).conforms(&ValueType::opt(ValueType::string())));
    }

    #[test]
    fn typed_value_rejects_mismatch() {
        let err = TypedValue::new(ValueType::int(), Value::string("no")).unwrap_err();
        assert!(matches!(err, TypeError::Mismatch { .. }));
    }

    #[test]
    fn typed_value_rejects_invalid_type() {
        let ty = ValueType::map(ScalarKind::Float, ValueType::int());
        let err = TypedValue::new(ty, Value::Map(BTreeMap::new())).unwrap_err();
        assert!(matches!(err, TypeError::UnsupportedKind(_)));
    }
}
