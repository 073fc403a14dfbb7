//! Object store seam for the converge workspace.
//!
//! Defines the live-object model (metadata plus a typed body), the schema
//! registry that maps object kinds to their wire identity, and the async
//! client trait through which the reconciler touches the outside world.
//! An in-memory implementation backs tests and embedding.
//!
//! # Key Types
//!
//! - [`Object`] / [`ObjectMeta`] / [`OwnerRef`] — Live objects and their metadata
//! - [`Schema`] / [`KindSpec`] — Kind registry: body type + wire resource name
//! - [`StoreClient`] / [`PatchType`] — The async seam to the external store
//! - [`InMemoryStore`] — HashMap-backed implementation with optimistic concurrency

pub mod error;
pub mod memory;
pub mod object;
pub mod schema;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use object::{set_controller_ref, Object, ObjectMeta, OwnerRef};
pub use schema::{KindSpec, Schema};
pub use traits::{PatchType, StoreClient};
