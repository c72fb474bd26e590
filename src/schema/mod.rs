//! Schema subsystem for rowdb
//!
//! The schema table drives everything: it is the validation contract at the
//! ingress boundary and the physical column order of every resource log.
//!
//! # Design Principles
//!
//! - Validation happens only on the ingress path (`parse_resource`)
//! - Reading back data the system itself wrote is lenient; a schema change
//!   must not brick historical rows
//! - Reserved columns `_id` and `_v` sit at positions 0 and 1 of every
//!   resource, enforced at load time

mod codec;
mod errors;
mod loader;
mod types;

pub use codec::{format_field, parse_field, parse_resource, to_record, to_resource};
pub use errors::{SchemaError, SchemaResult};
pub use loader::{load_schemas, open_logs, sort_schema_for, SCHEMAS_LOG};
pub use types::{FieldSchema, FieldType, Record, Resource, Value, ID_FIELD, VERSION_FIELD};
