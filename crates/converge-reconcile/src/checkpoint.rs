//! Checkpoint annotation encoding and parsing.
//!
//! Both checkpoints are JSON snapshots of the whole object with the two
//! checkpoint annotation keys stripped prior to encoding; stripping first
//! is what breaks the otherwise-recursive definition. Encoding works on a
//! scratch clone, never on the live annotation map.

use converge_store::{KindSpec, Object};

use crate::error::{ReconcileError, ReconcileResult};

/// Annotation key holding the last-written desired state.
pub const CLIENT_CHECKPOINT: &str = "client_checkpoint";

/// Annotation key holding the last-observed actual state.
pub const SERVER_CHECKPOINT: &str = "server_checkpoint";

/// Serialize an object with both checkpoint annotations stripped.
pub fn encode_checkpoint(object: &Object, spec: &KindSpec) -> ReconcileResult<String> {
    let mut scratch = object.clone();
    scratch.meta.annotations.remove(CLIENT_CHECKPOINT);
    scratch.meta.annotations.remove(SERVER_CHECKPOINT);

    let json = scratch.to_json(spec)?;
    serde_json::to_string(&json).map_err(|e| ReconcileError::CheckpointDecode(e.to_string()))
}

/// Stamp a fresh client checkpoint onto `dst`, encoding `src`.
///
/// Any server checkpoint annotation already on `dst` is left untouched.
pub fn stamp_client_checkpoint(
    dst: &mut Object,
    src: &Object,
    spec: &KindSpec,
) -> ReconcileResult<()> {
    let encoded = encode_checkpoint(src, spec)?;
    dst.meta
        .annotations
        .insert(CLIENT_CHECKPOINT.to_string(), encoded);
    Ok(())
}

/// Parse the checkpoints stored on a live object.
///
/// The client checkpoint is required; its absence fails the cycle. The
/// server checkpoint is optional: when it cannot be read the caller
/// skips drift-revert for one cycle.
pub fn parse_checkpoints(
    actual: &Object,
    spec: &KindSpec,
) -> ReconcileResult<(Object, Option<Object>)> {
    let annotations = &actual.meta.annotations;

    let raw_client = annotations.get(CLIENT_CHECKPOINT).ok_or_else(|| {
        ReconcileError::MissingCheckpoint {
            name: actual.meta.name.clone(),
            namespace: actual.meta.namespace.clone(),
        }
    })?;
    let client = decode_checkpoint(raw_client, spec)?;

    let server = match annotations.get(SERVER_CHECKPOINT) {
        Some(raw) => Some(decode_checkpoint(raw, spec)?),
        None => None,
    };

    Ok((client, server))
}

/// Build the RFC-6902 body installing a fresh server checkpoint.
///
/// The body is a single targeted `add`, safe under concurrent mutation
/// elsewhere on the object.
pub fn server_checkpoint_patch(object: &Object, spec: &KindSpec) -> ReconcileResult<Vec<u8>> {
    let encoded = encode_checkpoint(object, spec)?;
    let body = serde_json::json!([{
        "op": "add",
        "path": format!("/metadata/annotations/{SERVER_CHECKPOINT}"),
        "value": encoded,
    }]);
    serde_json::to_vec(&body).map_err(|e| ReconcileError::CheckpointDecode(e.to_string()))
}

fn decode_checkpoint(raw: &str, spec: &KindSpec) -> ReconcileResult<Object> {
    let json: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ReconcileError::CheckpointDecode(e.to_string()))?;
    Ok(Object::from_json(spec, &json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge_store::ObjectMeta;
    use converge_types::{FieldType, RecordType, Value, ValueType};

    fn workload_spec() -> KindSpec {
        KindSpec::new(
            "Workload",
            "workloads",
            RecordType::new(vec![FieldType::new(
                "spec",
                ValueType::record(vec![FieldType::new("replicas", ValueType::int())]),
            )]),
        )
    }

    fn workload(replicas: i64) -> Object {
        Object::new(
            "Workload",
            ObjectMeta::named("web", "prod"),
            Value::Record(vec![Value::Record(vec![Value::int(replicas)])]),
        )
    }

    #[test]
    fn encode_strips_both_checkpoint_keys() {
        let spec = workload_spec();
        let mut obj = workload(3);
        obj.meta
            .annotations
            .insert(CLIENT_CHECKPOINT.to_string(), "old-client".to_string());
        obj.meta
            .annotations
            .insert(SERVER_CHECKPOINT.to_string(), "old-server".to_string());
        obj.meta
            .annotations
            .insert("team".to_string(), "infra".to_string());

        let encoded = encode_checkpoint(&obj, &spec).unwrap();
        assert!(!encoded.contains(CLIENT_CHECKPOINT));
        assert!(!encoded.contains(SERVER_CHECKPOINT));
        assert!(encoded.contains("team"));

        // The live object is untouched.
        assert!(obj.meta.annotations.contains_key(CLIENT_CHECKPOINT));
        assert!(obj.meta.annotations.contains_key(SERVER_CHECKPOINT));
    }

    #[test]
    fn stamp_preserves_existing_server_checkpoint() {
        let spec = workload_spec();
        let mut dst = workload(5);
        dst.meta
            .annotations
            .insert(SERVER_CHECKPOINT.to_string(), "observed".to_string());

        let src = workload(3);
        stamp_client_checkpoint(&mut dst, &src, &spec).unwrap();

        assert_eq!(
            dst.meta.annotations.get(SERVER_CHECKPOINT),
            Some(&"observed".to_string())
        );
        let stored = dst.meta.annotations.get(CLIENT_CHECKPOINT).unwrap();
        let decoded: serde_json::Value = serde_json::from_str(stored).unwrap();
        assert_eq!(decoded["spec"]["replicas"], 3);
    }

    #[test]
    fn parse_roundtrips_both_checkpoints() {
        let spec = workload_spec();
        let mut live = workload(5);
        stamp_client_checkpoint(&mut live, &workload(3), &spec).unwrap();
        live.meta.annotations.insert(
            SERVER_CHECKPOINT.to_string(),
            encode_checkpoint(&workload(4), &spec).unwrap(),
        );

        let (client, server) = parse_checkpoints(&live, &spec).unwrap();
        assert_eq!(client.body, workload(3).body);
        assert_eq!(server.unwrap().body, workload(4).body);
    }

    #[test]
    fn parse_missing_server_checkpoint_is_none() {
        let spec = workload_spec();
        let mut live = workload(5);
        stamp_client_checkpoint(&mut live, &workload(3), &spec).unwrap();

        let (_, server) = parse_checkpoints(&live, &spec).unwrap();
        assert!(server.is_none());
    }

    #[test]
    fn parse_missing_client_checkpoint_fails() {
        let spec = workload_spec();
        let err = parse_checkpoints(&workload(5), &spec).unwrap_err();
        assert!(matches!(err, ReconcileError::MissingCheckpoint { .. }));
    }

    #[test]
    fn parse_garbage_checkpoint_fails() {
        let spec = workload_spec();
        let mut live = workload(5);
        live.meta
            .annotations
            .insert(CLIENT_CHECKPOINT.to_string(), "not json".to_string());
        let err = parse_checkpoints(&live, &spec).unwrap_err();
        assert!(matches!(err, ReconcileError::CheckpointDecode(_)));
    }

    #[test]
    fn patch_body_is_a_single_targeted_add() {
        let spec = workload_spec();
        let body = server_checkpoint_patch(&workload(3), &spec).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();

        let ops = parsed.as_array().unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0]["op"], "add");
        assert_eq!(
            ops[0]["path"],
            format!("/metadata/annotations/{SERVER_CHECKPOINT}")
        );
        // The value is the stringified JSON of the stripped object.
        let inner: serde_json::Value =
            serde_json::from_str(ops[0]["value"].as_str().unwrap()).unwrap();
        assert_eq!(inner["spec"]["replicas"], 3);
    }
}
