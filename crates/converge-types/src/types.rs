//! Structural type descriptors.
//!
//! A [`ValueType`] describes the shape of a [`Value`](crate::Value) without
//! holding any data. Two values are same-shape iff their types compare equal.
//! The descriptors also drive zero-value materialization and the
//! type-directed JSON codec.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{TypeError, TypeResult};
use crate::value::{Scalar, Value};

/// The primitive families a scalar can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Signed integer (stored as `i64`).
    Int,
    /// Unsigned integer (stored as `u64`).
    UInt,
    /// Floating point (stored as `f64`).
    Float,
    /// Complex number (a pair of `f64`).
    Complex,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Str,
}

impl ScalarKind {
    /// Whether this kind can serve as a mapping key.
    ///
    /// Floats and complex numbers have no total order (NaN), so they are
    /// rejected in key position.
    pub fn is_comparable(&self) -> bool {
        !matches!(self, Self::Float | Self::Complex)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Float => "float",
            Self::Complex => "complex",
            Self::Bool => "bool",
            Self::Str => "string",
        };
        write!(f, "{name}")
    }
}

/// A named field of a record type, at a stable declaration index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldType {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: ValueType,
}

impl FieldType {
    /// Create a new field descriptor.
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An ordered record type: named fields with stable declaration indices.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct RecordType {
    fields: Vec<FieldType>,
}

impl RecordType {
    /// Create a record type from its fields, in declaration order.
    pub fn new(fields: Vec<FieldType>) -> Self {
        Self { fields }
    }

    /// The fields in declaration order.
    pub fn fields(&self) -> &[FieldType] {
        &self.fields
    }

    /// Field descriptor at a declaration index.
    pub fn field(&self, index: usize) -> Option<&FieldType> {
        self.fields.get(index)
    }

    /// Look up a field by name, returning its declaration index.
    pub fn field_named(&self, name: &str) -> Option<(usize, &FieldType)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Structural description of a value's shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueType {
    /// A primitive scalar.
    Scalar(ScalarKind),
    /// An ordered record with named fields.
    Record(RecordType),
    /// A fixed-length tuple.
    Tuple(Vec<ValueType>),
    /// A variable-length sequence.
    Seq(Box<ValueType>),
    /// A keyed mapping. Keys must be of a comparable scalar kind.
    Map {
        key: ScalarKind,
        value: Box<ValueType>,
    },
    /// An optional indirection (nullable single-child container).
    Opt(Box<ValueType>),
}

impl ValueType {
    /// Shorthand for `Scalar(ScalarKind::Int)`.
    pub fn int() -> Self {
        Self::Scalar(ScalarKind::Int)
    }

    /// Shorthand for `Scalar(ScalarKind::UInt)`.
    pub fn uint() -> Self {
        Self::Scalar(ScalarKind::UInt)
    }

    /// Shorthand for `Scalar(ScalarKind::Float)`.
    pub fn float() -> Self {
        Self::Scalar(ScalarKind::Float)
    }

    /// Shorthand for `Scalar(ScalarKind::Complex)`.
    pub fn complex() -> Self {
        Self::Scalar(ScalarKind::Complex)
    }

    /// Shorthand for `Scalar(ScalarKind::Bool)`.
    pub fn boolean() -> Self {
        Self::Scalar(ScalarKind::Bool)
    }

    /// Shorthand for `Scalar(ScalarKind::Str)`.
    pub fn string() -> Self {
        Self::Scalar(ScalarKind::Str)
    }

    /// A record type from its fields.
    pub fn record(fields: Vec<FieldType>) -> Self {
        Self::Record(RecordType::new(fields))
    }

    /// A tuple type from its element types.
    pub fn tuple(elems: Vec<ValueType>) -> Self {
        Self::Tuple(elems)
    }

    /// A sequence type over an element type.
    pub fn seq(elem: ValueType) -> Self {
        Self::Seq(Box::new(elem))
    }

    /// A mapping type over a key kind and value type.
    pub fn map(key: ScalarKind, value: ValueType) -> Self {
        Self::Map {
            key,
            value: Box::new(value),
        }
    }

    /// An optional indirection over an inner type.
    pub fn opt(inner: ValueType) -> Self {
        Self::Opt(Box::new(inner))
    }

    /// Short name of this type's kind, for error rendering.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(ScalarKind::Int) => "int",
            Self::Scalar(ScalarKind::UInt) => "uint",
            Self::Scalar(ScalarKind::Float) => "float",
            Self::Scalar(ScalarKind::Complex) => "complex",
            Self::Scalar(ScalarKind::Bool) => "bool",
            Self::Scalar(ScalarKind::Str) => "string",
            Self::Record(_) => "record",
            Self::Tuple(_) => "tuple",
            Self::Seq(_) => "sequence",
            Self::Map { .. } => "map",
            Self::Opt(_) => "optional",
        }
    }

    /// Validate this type descriptor.
    ///
    /// Rejects mapping types whose key kind is not comparable and records
    /// with duplicate field names. Recurses into child types.
    pub fn validate(&self) -> TypeResult<()> {
        match self {
            Self::Scalar(_) => Ok(()),
            Self::Record(rt) => {
                for (i, field) in rt.fields().iter().enumerate() {
                    if rt.fields()[..i].iter().any(|f| f.name == field.name) {
                        return Err(TypeError::Invalid(format!(
                            "duplicate record field '{}'",
                            field.name
                        )));
                    }
                    field.ty.validate()?;
                }
                Ok(())
            }
            Self::Tuple(elems) => {
                for elem in elems {
                    elem.validate()?;
                }
                Ok(())
            }
            Self::Seq(elem) => elem.validate(),
            Self::Map { key, value } => {
                if !key.is_comparable() {
                    return Err(TypeError::UnsupportedKind(format!("{key} map key")));
                }
                value.validate()
            }
            Self::Opt(inner) => inner.validate(),
        }
    }

    /// Build the zero value of this type.
    ///
    /// Scalars get their numeric/empty zero, records materialize every
    /// field, tuples materialize every element, sequences and mappings
    /// start empty, and indirections start null.
    pub fn zero(&self) -> Value {
        match self {
            Self::Scalar(ScalarKind::Int) => Value::Scalar(Scalar::Int(0)),
            Self::Scalar(ScalarKind::UInt) => Value::Scalar(Scalar::UInt(0)),
            Self::Scalar(ScalarKind::Float) => Value::Scalar(Scalar::Float(0.0)),
            Self::Scalar(ScalarKind::Complex) => {
                Value::Scalar(Scalar::Complex { re: 0.0, im: 0.0 })
            }
            Self::Scalar(ScalarKind::Bool) => Value::Scalar(Scalar::Bool(false)),
            Self::Scalar(ScalarKind::Str) => Value::Scalar(Scalar::Str(String::new())),
            Self::Record(rt) => {
                Value::Record(rt.fields().iter().map(|f| f.ty.zero()).collect())
            }
            Self::Tuple(elems) => Value::Tuple(elems.iter().map(|t| t.zero()).collect()),
            Self::Seq(_) => Value::Seq(Vec::new()),
            Self::Map { .. } => Value::Map(BTreeMap::new()),
            Self::Opt(_) => Value::Opt(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparable_kinds() {
        assert!(ScalarKind::Int.is_comparable());
        assert!(ScalarKind::UInt.is_comparable());
        assert!(ScalarKind::Bool.is_comparable());
        assert!(ScalarKind::Str.is_comparable());
        assert!(!ScalarKind::Float.is_comparable());
        assert!(!ScalarKind::Complex.is_comparable());
    }

    #[test]
    fn float_map_key_rejected() {
        let ty = ValueType::map(ScalarKind::Float, ValueType::int());
        let err = ty.validate().unwrap_err();
        assert!(matches!(err, TypeError::UnsupportedKind(_)));
    }

    #[test]
    fn nested_invalid_key_rejected() {
        let ty = ValueType::record(vec![FieldType::new(
            "weights",
            ValueType::map(ScalarKind::Complex, ValueType::float()),
        )]);
        assert!(ty.validate().is_err());
    }

    #[test]
    fn duplicate_field_rejected() {
        let ty = ValueType::record(vec![
            FieldType::new("a", ValueType::int()),
            FieldType::new("a", ValueType::string()),
        ]);
        let err = ty.validate().unwrap_err();
        assert!(matches!(err, TypeError::Invalid(_)));
    }

    #[test]
    fn valid_composite_type() {
        let ty = ValueType::record(vec![
            FieldType::new("replicas", ValueType::int()),
            FieldType::new("labels", ValueType::map(ScalarKind::Str, ValueType::string())),
            FieldType::new("ports", ValueType::seq(ValueType::uint())),
        ]);
        assert!(ty.validate().is_ok());
    }

    #[test]
    fn zero_of_scalars() {
        assert_eq!(ValueType::int().zero(), Value::Scalar(Scalar::Int(0)));
        assert_eq!(
            ValueType::string().zero(),
            Value::Scalar(Scalar::Str(String::new()))
        );
        assert_eq!(ValueType::boolean().zero(), Value::Scalar(Scalar::Bool(false)));
    }

    #[test]
    fn zero_of_record_materializes_fields() {
        let ty = ValueType::record(vec![
            FieldType::new("a", ValueType::int()),
            FieldType::new("b", ValueType::opt(ValueType::string())),
        ]);
        let zero = ty.zero();
        assert_eq!(
            zero,
            Value::Record(vec![Value::Scalar(Scalar::Int(0)), Value::Opt(None)])
        );
    }

    #[test]
    fn zero_of_containers_is_empty() {
        assert_eq!(ValueType::seq(ValueType::int()).zero(), Value::Seq(vec![]));
        assert_eq!(
            ValueType::map(ScalarKind::Str, ValueType::int()).zero(),
            Value::Map(BTreeMap::new())
        );
        assert_eq!(ValueType::opt(ValueType::int()).zero(), Value::Opt(None));
    }

    #[test]
    fn field_lookup_by_name() {
        let rt = RecordType::new(vec![
            FieldType::new("first", ValueType::int()),
            FieldType::new("second", ValueType::string()),
        ]);
        let (idx, field) = rt.field_named("second").unwrap();
        assert_eq!(idx, 1);
        assert_eq!(field.ty, ValueType::string());
        assert!(rt.field_named("missing").is_none());
    }
}
