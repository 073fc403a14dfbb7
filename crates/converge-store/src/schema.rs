//! Kind registry: maps object kinds to their body type and wire identity.

use std::collections::HashMap;

use converge_types::{RecordType, ValueType};

use crate::error::{StoreError, StoreResult};

/// Reserved top-level JSON keys a body record may not shadow.
const RESERVED_FIELDS: [&str; 2] = ["kind", "metadata"];

/// Registration for one object kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindSpec {
    /// Kind name, e.g. `"Workload"`.
    pub kind: String,
    /// Wire resource segment used for targeted PATCH routing,
    /// e.g. `"workloads"`.
    pub resource: String,
    /// The record type of the object's body.
    pub body: RecordType,
}

impl KindSpec {
    /// Create a kind registration.
    pub fn new(kind: impl Into<String>, resource: impl Into<String>, body: RecordType) -> Self {
        Self {
            kind: kind.into(),
            resource: resource.into(),
            body,
        }
    }

    /// The body type as a [`ValueType`].
    pub fn body_type(&self) -> ValueType {
        ValueType::Record(self.body.clone())
    }
}

/// Registry of the object kinds the store understands.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    kinds: HashMap<String, KindSpec>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind. The body type is validated; duplicate
    /// registrations and reserved field names are rejected.
    pub fn register(&mut self, spec: KindSpec) -> StoreResult<()> {
        spec.body_type().validate()?;
        for field in spec.body.fields() {
            if RESERVED_FIELDS.contains(&field.name.as_str()) {
                return Err(StoreError::InvalidBody(format!(
                    "field '{}' shadows a reserved object key",
                    field.name
                )));
            }
        }
        if self.kinds.contains_key(&spec.kind) {
            return Err(StoreError::KindExists(spec.kind));
        }
        self.kinds.insert(spec.kind.clone(), spec);
        Ok(())
    }

    /// Look up a kind registration.
    pub fn get(&self, kind: &str) -> StoreResult<&KindSpec> {
        self.kinds
            .get(kind)
            .ok_or_else(|| StoreError::UnknownKind(kind.to_string()))
    }

    /// The wire resource segment for a kind.
    pub fn resource_for(&self, kind: &str) -> StoreResult<&str> {
        Ok(self.get(kind)?.resource.as_str())
    }

    /// Returns `true` if the kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }
}
