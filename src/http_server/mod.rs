//! HTTP adapter for rowdb
//!
//! Boundary glue only: extracts basic credentials, parses JSON payloads
//! against the resource schema, calls the store, and maps store errors to
//! status codes. The store itself never talks to the network.

mod config;
mod middleware;
mod routes;
mod server;

pub use config::HttpConfig;
pub use middleware::{basic_auth, AuthUser};
pub use routes::{api_routes, AppState};
pub use server::HttpServer;
