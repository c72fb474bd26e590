//! Store subsystem for rowdb
//!
//! The store composes the schema codec and the per-resource record logs:
//! it stamps ids and versions on writes, converts between typed resources
//! and flat records, and mediates every operation through the policy table
//! in the reserved `_permissions` resource.

mod errors;
mod id;
mod store;

pub use errors::{StoreError, StoreResult};
pub use id::generate_id;
pub use store::{Store, PERMISSIONS_RESOURCE, USERS_RESOURCE};
