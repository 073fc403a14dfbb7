//! The three-way merge protocol.
//!
//! One reconcile cycle is one logical transaction against one object.
//! Store operations occur in exactly the order `get -> (create | update)
//! -> patch(server_checkpoint)`; the store's optimistic concurrency is
//! expected to reject stale writes from concurrent cycles.

use tracing::{debug, info, warn};

use converge_diff::diff;
use converge_store::{set_controller_ref, KindSpec, Object, PatchType, StoreClient};

use crate::checkpoint::{parse_checkpoints, server_checkpoint_patch, stamp_client_checkpoint};
use crate::error::ReconcileResult;
use crate::projection::Projected;

/// Which store write a reconcile cycle performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// The object was absent and has been created.
    Created,
    /// The object existed and the merge produced a change.
    Updated,
    /// The merge netted out to no change; only the server checkpoint
    /// was refreshed.
    Unchanged,
}

/// The result of a reconcile cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    /// The write that happened.
    pub action: Action,
    /// The live object as of the end of the cycle, including the freshly
    /// installed server checkpoint.
    pub object: Object,
}

/// Run one reconcile cycle.
///
/// `desired` wraps the state the caller wants; `actual` wraps an empty
/// same-kind object used as the fetch destination. The owner is attached
/// to the desired object before anything touches the store.
///
/// A failure installing the server checkpoint is logged and returned,
/// but the object has already been created or updated successfully; the
/// next cycle notices the missing checkpoint and skips drift-revert once.
pub async fn reconcile<C: StoreClient>(
    cm: &C,
    owner: &Object,
    mut desired: Projected,
    mut actual: Projected,
) -> ReconcileResult<Outcome> {
    let spec = cm.schema().get(&desired.object.kind)?;
    set_controller_ref(owner, &mut desired.object, cm.schema())?;

    let name = desired.object.meta.name.clone();
    let namespace = desired.object.meta.namespace.clone();

    let action = match cm.get(&name, &namespace).await? {
        None => {
            // Object missing: stamp the desired object with a checkpoint
            // of itself and create it.
            let snapshot = desired.object.clone();
            stamp_client_checkpoint(&mut desired.object, &snapshot, spec)?;

            info!(kind = %desired.object.kind, %namespace, %name, "creating object");
            actual.object = cm.create(&desired.object).await?;
            Action::Created
        }
        Some(live) => {
            actual.object = live;
            let changed = merge(&mut actual, &desired, spec)?;
            if changed {
                stamp_client_checkpoint(&mut actual.object, &desired.object, spec)?;

                info!(kind = %actual.object.kind, %namespace, %name, "updating object");
                actual.object = cm.update(&actual.object).await?;
                Action::Updated
            } else {
                Action::Unchanged
            }
        }
    };

    // Record what the object looks like after our write, so the next
    // cycle can tell external drift from its own state.
    let body = server_checkpoint_patch(&actual.object, spec)?;
    match cm.patch(&name, &namespace, PatchType::JsonPatch, &body).await {
        Ok(patched) => actual.object = patched,
        Err(err) => {
            warn!(%namespace, %name, error = %err, "failed to install server checkpoint");
            return Err(err.into());
        }
    }

    Ok(Outcome {
        action,
        object: actual.object,
    })
}

/// Merge drift-revert and caller intent into the live object.
///
/// Returns `true` when the whole object actually changed; the individual
/// patches may cancel each other out.
fn merge(actual: &mut Projected, desired: &Projected, spec: &KindSpec) -> ReconcileResult<bool> {
    let before = actual.object.clone();

    let mut actual_sub = actual.extract(spec)?;
    let desired_sub = desired.extract(spec)?;

    let (client_ckpt, server_ckpt) = parse_checkpoints(&actual.object, spec)?;
    let client_ckpt_sub = actual.projection.extract(&client_ckpt, spec)?;

    let mut patched = false;

    // Drift: what changed externally since we last observed the object.
    // Reverting it realigns the object to the last observed baseline.
    // Without a server checkpoint there is no baseline, and any observed
    // difference is indistinguishable from legitimate external state, so
    // the revert is skipped for this cycle.
    if let Some(server_ckpt) = server_ckpt {
        let server_ckpt_sub = actual.projection.extract(&server_ckpt, spec)?;
        let drift = diff(&actual_sub, &server_ckpt_sub)?;
        if !drift.is_empty() {
            debug!(changes = drift.len(), "reverting external drift");
            drift.apply(&mut actual_sub)?;
            patched = true;
        }
    }

    // Intent: what the caller wants changed relative to the last write.
    let intent = diff(&client_ckpt_sub, &desired_sub)?;
    if !intent.is_empty() {
        debug!(changes = intent.len(), "applying desired changes");
        intent.apply(&mut actual_sub)?;
        patched = true;
    }

    if patched {
        actual.implant(actual_sub, spec)?;
    }

    // Deep equality instead of the patched flag: the two change sets can
    // cancel each other out.
    Ok(actual.object != before)
}
