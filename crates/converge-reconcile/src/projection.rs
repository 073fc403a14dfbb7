//! Projections: narrowing a whole object to its comparable sub-value.
//!
//! A projection is configured by a field name. Extraction yields the
//! named body field wrapped in an indirection, so the diff engine can
//! operate on it symmetrically; implanting writes a sub-value back into
//! a whole object of the same kind. The projection is the only place
//! that knows which field participates in reconciliation.

use converge_store::{KindSpec, Object};
use converge_types::{TypeError, TypedValue, Value, ValueType};

use crate::error::{ReconcileError, ReconcileResult};

/// Selects one named body field as the unit of comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldProjection {
    field: String,
}

impl FieldProjection {
    /// A projection over the given field name.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// A projection over a `"spec"` field.
    pub fn spec() -> Self {
        Self::new("spec")
    }

    /// A projection over a `"data"` field.
    pub fn data() -> Self {
        Self::new("data")
    }

    /// The configured field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Extract the projected sub-value, wrapped in an indirection.
    pub fn extract(&self, object: &Object, spec: &KindSpec) -> ReconcileResult<TypedValue> {
        let (index, field) = spec.body.field_named(&self.field).ok_or_else(|| {
            ReconcileError::UnknownField {
                kind: spec.kind.clone(),
                field: self.field.clone(),
            }
        })?;

        let Value::Record(fields) = &object.body else {
            return Err(body_shape_error(&object.body));
        };
        let Some(sub) = fields.get(index) else {
            return Err(body_shape_error(&object.body));
        };

        let ty = ValueType::opt(field.ty.clone());
        Ok(TypedValue::new(ty, Value::some(sub.clone()))?)
    }

    /// Write a projected sub-value back into the whole object.
    pub fn implant(
        &self,
        sub: TypedValue,
        object: &mut Object,
        spec: &KindSpec,
    ) -> ReconcileResult<()> {
        let (index, _) = spec.body.field_named(&self.field).ok_or_else(|| {
            ReconcileError::UnknownField {
                kind: spec.kind.clone(),
                field: self.field.clone(),
            }
        })?;

        let Value::Opt(Some(inner)) = sub.into_value() else {
            return Err(ReconcileError::EmptyProjection);
        };

        let Value::Record(fields) = &mut object.body else {
            return Err(ReconcileError::EmptyProjection);
        };
        let Some(slot) = fields.get_mut(index) else {
            return Err(ReconcileError::EmptyProjection);
        };
        *slot = *inner;
        Ok(())
    }
}

fn body_shape_error(body: &Value) -> ReconcileError {
    ReconcileError::Encoding(TypeError::Mismatch {
        expected: "record".to_string(),
        actual: body.kind_name().to_string(),
    })
}

/// A whole object paired with the projection that narrows it.
#[derive(Clone, Debug)]
pub struct Projected {
    pub object: Object,
    pub projection: FieldProjection,
}

impl Projected {
    /// Pair an object with its projection.
    pub fn new(object: Object, projection: FieldProjection) -> Self {
        Self { object, projection }
    }

    /// Extract this object's projected sub-value.
    pub fn extract(&self, spec: &KindSpec) -> ReconcileResult<TypedValue> {
        self.projection.extract(&self.object, spec)
    }

    /// Implant a sub-value back into this object.
    pub fn implant(&mut self, sub: TypedValue, spec: &KindSpec) -> ReconcileResult<()> {
        self.projection.implant(sub, &mut self.object, spec)
    }
}
