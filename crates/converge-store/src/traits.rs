//! The async seam to the external object store.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::StoreResult;
use crate::object::Object;
use crate::schema::Schema;

/// Wire format tag for targeted patches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchType {
    /// RFC-6902 JSON patch.
    JsonPatch,
}

/// Typed client for the external object store.
///
/// This trait is the only seam through which the reconciler touches the
/// outside world. Implementations must observe the caller-scoped
/// cancellation token in every call.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetch an object by name and namespace.
    ///
    /// Returns `Ok(None)` when the object does not exist, distinguishing
    /// absence from store failures.
    async fn get(&self, name: &str, namespace: &str) -> StoreResult<Option<Object>>;

    /// Create an object. Returns the stored object with its assigned
    /// identity and resource version.
    async fn create(&self, object: &Object) -> StoreResult<Object>;

    /// Replace an existing object. The object's resource version must
    /// match the stored one; stale writes are rejected.
    async fn update(&self, object: &Object) -> StoreResult<Object>;

    /// Apply a targeted patch to an existing object.
    async fn patch(
        &self,
        name: &str,
        namespace: &str,
        patch_type: PatchType,
        body: &[u8],
    ) -> StoreResult<Object>;

    /// The schema registry for this store.
    fn schema(&self) -> &Schema;

    /// The caller-scoped cancellation handle.
    fn cancellation(&self) -> &CancellationToken;
}
