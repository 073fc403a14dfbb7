//! Live objects: metadata plus a typed body.
//!
//! The JSON encoding is flat: the body record's fields sit at the top
//! level next to `"kind"` and `"metadata"`. Checkpoints snapshot exactly
//! this encoding, so it is the one the store round-trips.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Map;

use converge_types::{value_from_json, value_to_json, Value};

use crate::error::{StoreError, StoreResult};
use crate::schema::{KindSpec, Schema};

/// A reference to the object that controls this one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRef {
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub controller: bool,
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Object metadata: identity, versioning, annotations, ownership.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerRef>,
}

impl ObjectMeta {
    /// Metadata with just a name and namespace.
    pub fn named(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }
}

/// A live object: kind tag, metadata, and a body conforming to the record
/// type the schema registers for the kind.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    pub kind: String,
    pub meta: ObjectMeta,
    pub body: Value,
}

impl Object {
    /// Create an object from its parts.
    pub fn new(kind: impl Into<String>, meta: ObjectMeta, body: Value) -> Self {
        Self {
            kind: kind.into(),
            meta,
            body,
        }
    }

    /// Encode into the flat JSON representation.
    pub fn to_json(&self, spec: &KindSpec) -> StoreResult<serde_json::Value> {
        let encoded_body = value_to_json(&spec.body_type(), &self.body)?;
        let serde_json::Value::Object(body_fields) = encoded_body else {
            return Err(StoreError::Serialization(
                "object body did not encode as an object".to_string(),
            ));
        };

        let mut out = Map::with_capacity(body_fields.len() + 2);
        out.insert(
            "kind".to_string(),
            serde_json::Value::String(self.kind.clone()),
        );
        out.insert(
            "metadata".to_string(),
            serde_json::to_value(&self.meta)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
        );
        out.extend(body_fields);
        Ok(serde_json::Value::Object(out))
    }

    /// Decode from the flat JSON representation.
    pub fn from_json(spec: &KindSpec, json: &serde_json::Value) -> StoreResult<Self> {
        let obj = json.as_object().ok_or_else(|| {
            StoreError::Serialization("expected a JSON object".to_string())
        })?;

        let kind = obj
            .get("kind")
            .and_then(|v| v.as_str())
            .unwrap_or(&spec.kind);
        if kind != spec.kind {
            return Err(StoreError::Serialization(format!(
                "kind '{}' does not match expected '{}'",
                kind, spec.kind
            )));
        }

        let meta = match obj.get("metadata") {
            Some(raw) => serde_json::from_value(raw.clone())
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            None => ObjectMeta::default(),
        };

        let body = value_from_json(&spec.body_type(), json)?;
        Ok(Self {
            kind: spec.kind.clone(),
            meta,
            body,
        })
    }
}

/// Attach a controller reference for `owner` to `target`.
///
/// The owner's kind must be registered in the schema. An existing
/// controller reference to a different owner is a conflict.
pub fn set_controller_ref(owner: &Object, target: &mut Object, schema: &Schema) -> StoreResult<()> {
    schema.get(&owner.kind)?;

    if let Some(existing) = &target.meta.owner {
        if existing.controller
            && (existing.kind != owner.kind || existing.name != owner.meta.name)
        {
            return Err(StoreError::OwnerConflict {
                name: target.meta.name.clone(),
                owner: existing.to_string(),
            });
        }
    }

    target.meta.owner = Some(OwnerRef {
        kind: owner.kind.clone(),
        name: owner.meta.name.clone(),
        uid: owner.meta.uid.clone(),
        controller: true,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge_types::{FieldType, RecordType, ValueType};
    use serde_json::json;

    fn workload_spec() -> KindSpec {
        KindSpec::new(
            "Workload",
            "workloads",
            RecordType::new(vec![FieldType::new(
                "spec",
                ValueType::record(vec![
                    FieldType::new("replicas", ValueType::int()),
                    FieldType::new("image", ValueType::string()),
                ]),
            )]),
        )
    }

    fn workload(replicas: i64, image: &str) -> Object {
        Object::new(
            "Workload",
            ObjectMeta::named("web", "prod"),
            Value::Record(vec![Value::Record(vec![
                Value::int(replicas),
                Value::string(image),
            ])]),
        )
    }

    #[test]
    fn json_is_flat() {
        let spec = workload_spec();
        let mut obj = workload(3, "web:v1");
        obj.meta
            .annotations
            .insert("team".to_string(), "infra".to_string());

        let encoded = obj.to_json(&spec).unwrap();
        assert_eq!(
            encoded,
            json!({
                "kind": "Workload",
                "metadata": {
                    "name": "web",
                    "namespace": "prod",
                    "annotations": {"team": "infra"},
                },
                "spec": {"replicas": 3, "image": "web:v1"},
            })
        );
    }

    #[test]
    fn json_roundtrip() {
        let spec = workload_spec();
        let mut obj = workload(3, "web:v1");
        obj.meta.uid = Some("uid-1".to_string());
        obj.meta.resource_version = Some(4);

        let encoded = obj.to_json(&spec).unwrap();
        let decoded = Object::from_json(&spec, &encoded).unwrap();
        assert_eq!(decoded, obj);
    }

    #[test]
    fn kind_mismatch_rejected() {
        let spec = workload_spec();
        let err = Object::from_json(&spec, &json!({"kind": "Other"})).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn missing_metadata_defaults() {
        let spec = workload_spec();
        let decoded =
            Object::from_json(&spec, &json!({"spec": {"replicas": 1, "image": "x"}})).unwrap();
        assert_eq!(decoded.meta, ObjectMeta::default());
    }

    #[test]
    fn controller_ref_set_and_conflict() {
        let mut schema = Schema::new();
        schema.register(workload_spec()).unwrap();
        schema
            .register(KindSpec::new("App", "apps", RecordType::default()))
            .unwrap();

        let mut owner = Object::new("App", ObjectMeta::named("shop", "prod"), Value::Record(vec![]));
        owner.meta.uid = Some("uid-app".to_string());

        let mut target = workload(1, "web:v1");
        set_controller_ref(&owner, &mut target, &schema).unwrap();
        let set = target.meta.owner.clone().unwrap();
        assert_eq!(set.kind, "App");
        assert_eq!(set.name, "shop");
        assert!(set.controller);

        // Same owner again is fine.
        set_controller_ref(&owner, &mut target, &schema).unwrap();

        // A different controller is a conflict.
        let other = Object::new("App", ObjectMeta::named("blog", "prod"), Value::Record(vec![]));
        let err = set_controller_ref(&other, &mut target, &schema).unwrap_err();
        assert!(matches!(err, StoreError::OwnerConflict { .. }));
    }

    #[test]
    fn unregistered_owner_kind_rejected() {
        let schema = Schema::new();
        let owner = Object::new("Ghost", ObjectMeta::named("g", "prod"), Value::Record(vec![]));
        let mut target = workload(1, "web:v1");
        let err = set_controller_ref(&owner, &mut target, &schema).unwrap_err();
        assert!(matches!(err, StoreError::UnknownKind(_)));
    }
}
