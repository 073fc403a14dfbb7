//! In-memory, HashMap-based store client.
//!
//! Intended for tests and embedding. Objects are held behind a `RwLock`
//! and cloned on read/write. Writes carry the optimistic-concurrency
//! semantics the reconciler expects from a real store: creates assign a
//! uid and resource version 1, updates require a matching resource
//! version and bump it, and targeted patches bump it as well.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::{StoreError, StoreResult};
use crate::object::Object;
use crate::schema::Schema;
use crate::traits::{PatchType, StoreClient};

const ANNOTATION_PREFIX: &str = "/metadata/annotations/";

/// One RFC-6902 operation, as far as this store interprets them.
#[derive(Debug, Deserialize)]
struct PatchOp {
    op: String,
    path: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

/// In-memory store client.
pub struct InMemoryStore {
    schema: Schema,
    cancel: CancellationToken,
    objects: RwLock<HashMap<(String, String), Object>>,
    uid_counter: AtomicU64,
}

impl InMemoryStore {
    /// Create a store over the given schema with a fresh cancellation
    /// token.
    pub fn new(schema: Schema) -> Self {
        Self::with_cancellation(schema, CancellationToken::new())
    }

    /// Create a store observing a caller-scoped cancellation token.
    pub fn with_cancellation(schema: Schema, cancel: CancellationToken) -> Self {
        Self {
            schema,
            cancel,
            objects: RwLock::new(HashMap::new()),
            uid_counter: AtomicU64::new(0),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    fn check_cancelled(&self) -> StoreResult<()> {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(())
    }

    fn next_uid(&self) -> String {
        let n = self.uid_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("uid-{n}")
    }

    fn key(object: &Object) -> (String, String) {
        (object.meta.namespace.clone(), object.meta.name.clone())
    }

    fn apply_annotation_ops(object: &mut Object, ops: &[PatchOp]) -> StoreResult<()> {
        for op in ops {
            let Some(escaped_key) = op.path.strip_prefix(ANNOTATION_PREFIX) else {
                return Err(StoreError::InvalidPatch(format!(
                    "unsupported patch path '{}'",
                    op.path
                )));
            };
            let key = unescape_pointer_token(escaped_key);

            match op.op.as_str() {
                "add" | "replace" => {
                    let value = op.value.as_ref().and_then(|v| v.as_str()).ok_or_else(|| {
                        StoreError::InvalidPatch(format!(
                            "'{}' on '{}' requires a string value",
                            op.op, op.path
                        ))
                    })?;
                    object
                        .meta
                        .annotations
                        .insert(key, value.to_string());
                }
                "remove" => {
                    object.meta.annotations.remove(&key);
                }
                other => {
                    return Err(StoreError::InvalidPatch(format!(
                        "unsupported patch op '{other}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Reverse RFC-6901 token escaping (`~1` is `/`, `~0` is `~`).
fn unescape_pointer_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn get(&self, name: &str, namespace: &str) -> StoreResult<Option<Object>> {
        self.check_cancelled()?;
        let objects = self.objects.read().expect("lock poisoned");
        Ok(objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create(&self, object: &Object) -> StoreResult<Object> {
        self.check_cancelled()?;
        let spec = self.schema.get(&object.kind)?;
        if !object.body.conforms(&spec.body_type()) {
            return Err(StoreError::InvalidBody(format!(
                "body does not conform to kind '{}'",
                object.kind
            )));
        }

        let mut objects = self.objects.write().expect("lock poisoned");
        let key = Self::key(object);
        if objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                name: object.meta.name.clone(),
                namespace: object.meta.namespace.clone(),
            });
        }

        let mut stored = object.clone();
        stored.meta.uid = Some(self.next_uid());
        stored.meta.resource_version = Some(1);
        objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(&self, object: &Object) -> StoreResult<Object> {
        self.check_cancelled()?;
        let mut objects = self.objects.write().expect("lock poisoned");
        let key = Self::key(object);
        let Some(existing) = objects.get(&key) else {
            return Err(StoreError::NotFound {
                name: object.meta.name.clone(),
                namespace: object.meta.namespace.clone(),
            });
        };

        if object.meta.resource_version != existing.meta.resource_version {
            return Err(StoreError::Conflict {
                name: object.meta.name.clone(),
                namespace: object.meta.namespace.clone(),
            });
        }

        let mut stored = object.clone();
        stored.meta.uid = existing.meta.uid.clone();
        stored.meta.resource_version =
            Some(existing.meta.resource_version.unwrap_or_default() + 1);
        objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn patch(
        &self,
        name: &str,
        namespace: &str,
        patch_type: PatchType,
        body: &[u8],
    ) -> StoreResult<Object> {
        self.check_cancelled()?;
        let PatchType::JsonPatch = patch_type;

        let ops: Vec<PatchOp> =
            serde_json::from_slice(body).map_err(|e| StoreError::InvalidPatch(e.to_string()))?;

        let mut objects = self.objects.write().expect("lock poisoned");
        let key = (namespace.to_string(), name.to_string());
        let Some(existing) = objects.get_mut(&key) else {
            return Err(StoreError::NotFound {
                name: name.to_string(),
                namespace: namespace.to_string(),
            });
        };

        Self::apply_annotation_ops(existing, &ops)?;
        existing.meta.resource_version =
            Some(existing.meta.resource_version.unwrap_or_default() + 1);
        Ok(existing.clone())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectMeta;
    use converge_types::{FieldType, RecordType, Value, ValueType};

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema
            .register(crate::schema::KindSpec::new(
                "Workload",
                "workloads",
                RecordType::new(vec![FieldType::new(
                    "spec",
                    ValueType::record(vec![FieldType::new("replicas", ValueType::int())]),
                )]),
            ))
            .unwrap();
        schema
    }

    fn workload(name: &str, replicas: i64) -> Object {
        Object::new(
            "Workload",
            ObjectMeta::named(name, "prod"),
            Value::Record(vec![Value::Record(vec![Value::int(replicas)])]),
        )
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_assigns_identity() {
        let store = InMemoryStore::new(schema());
        let stored = store.create(&workload("web", 3)).await.unwrap();
        assert_eq!(stored.meta.uid.as_deref(), Some("uid-1"));
        assert_eq!(stored.meta.resource_version, Some(1));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryStore::new(schema());
        assert!(store.get("ghost", "prod").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_duplicate_rejected() {
        let store = InMemoryStore::new(schema());
        store.create(&workload("web", 3)).await.unwrap();
        let err = store.create(&workload("web", 5)).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn create_rejects_unknown_kind() {
        let store = InMemoryStore::new(schema());
        let mut obj = workload("web", 3);
        obj.kind = "Ghost".to_string();
        let err = store.create(&obj).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownKind(_)));
    }

    #[tokio::test]
    async fn update_bumps_resource_version() {
        let store = InMemoryStore::new(schema());
        let mut stored = store.create(&workload("web", 3)).await.unwrap();
        stored.body = Value::Record(vec![Value::Record(vec![Value::int(5)])]);

        let updated = store.update(&stored).await.unwrap();
        assert_eq!(updated.meta.resource_version, Some(2));

        let fetched = store.get("web", "prod").await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn stale_update_rejected() {
        let store = InMemoryStore::new(schema());
        let stored = store.create(&workload("web", 3)).await.unwrap();

        // First writer wins.
        store.update(&stored).await.unwrap();

        // Second writer still holds resource version 1.
        let err = store.update(&stored).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn update_missing_rejected() {
        let store = InMemoryStore::new(schema());
        let err = store.update(&workload("ghost", 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    // -----------------------------------------------------------------------
    // Targeted patches
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn patch_adds_annotation() {
        let store = InMemoryStore::new(schema());
        store.create(&workload("web", 3)).await.unwrap();

        let body = serde_json::to_vec(&serde_json::json!([
            {"op": "add", "path": "/metadata/annotations/server_checkpoint", "value": "{}"}
        ]))
        .unwrap();
        let patched = store
            .patch("web", "prod", PatchType::JsonPatch, &body)
            .await
            .unwrap();
        assert_eq!(
            patched.meta.annotations.get("server_checkpoint"),
            Some(&"{}".to_string())
        );
        assert_eq!(patched.meta.resource_version, Some(2));
    }

    #[tokio::test]
    async fn patch_removes_annotation() {
        let store = InMemoryStore::new(schema());
        let mut obj = workload("web", 3);
        obj.meta
            .annotations
            .insert("stale".to_string(), "x".to_string());
        store.create(&obj).await.unwrap();

        let body = serde_json::to_vec(&serde_json::json!([
            {"op": "remove", "path": "/metadata/annotations/stale"}
        ]))
        .unwrap();
        let patched = store
            .patch("web", "prod", PatchType::JsonPatch, &body)
            .await
            .unwrap();
        assert!(patched.meta.annotations.is_empty());
    }

    #[tokio::test]
    async fn patch_unescapes_pointer_tokens() {
        let store = InMemoryStore::new(schema());
        store.create(&workload("web", 3)).await.unwrap();

        let body = serde_json::to_vec(&serde_json::json!([
            {"op": "add", "path": "/metadata/annotations/example.com~1managed", "value": "yes"}
        ]))
        .unwrap();
        let patched = store
            .patch("web", "prod", PatchType::JsonPatch, &body)
            .await
            .unwrap();
        assert_eq!(
            patched.meta.annotations.get("example.com/managed"),
            Some(&"yes".to_string())
        );
    }

    #[tokio::test]
    async fn patch_outside_annotations_rejected() {
        let store = InMemoryStore::new(schema());
        store.create(&workload("web", 3)).await.unwrap();

        let body = serde_json::to_vec(&serde_json::json!([
            {"op": "add", "path": "/spec/replicas", "value": "9"}
        ]))
        .unwrap();
        let err = store
            .patch("web", "prod", PatchType::JsonPatch, &body)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPatch(_)));
    }

    #[tokio::test]
    async fn patch_missing_object_rejected() {
        let store = InMemoryStore::new(schema());
        let body = serde_json::to_vec(&serde_json::json!([])).unwrap();
        let err = store
            .patch("ghost", "prod", PatchType::JsonPatch, &body)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn cancelled_token_stops_every_call() {
        let cancel = CancellationToken::new();
        let store = InMemoryStore::with_cancellation(schema(), cancel.clone());
        store.create(&workload("web", 3)).await.unwrap();

        cancel.cancel();
        assert!(matches!(
            store.get("web", "prod").await.unwrap_err(),
            StoreError::Cancelled
        ));
        assert!(matches!(
            store.create(&workload("other", 1)).await.unwrap_err(),
            StoreError::Cancelled
        ));
        assert!(matches!(
            store.update(&workload("web", 3)).await.unwrap_err(),
            StoreError::Cancelled
        ));
        assert!(matches!(
            store
                .patch("web", "prod", PatchType::JsonPatch, b"[]")
                .await
                .unwrap_err(),
            StoreError::Cancelled
        ));
    }
}
