//! rowdb - a schema-driven record server over append-only CSV logs
//!
//! A single schema table drives both the validation rules applied at the
//! boundary and the physical column layout of each resource log; access to
//! every operation is mediated by a policy table stored as ordinary records.

pub mod auth;
pub mod cli;
pub mod http_server;
pub mod observability;
pub mod schema;
pub mod storage;
pub mod store;
