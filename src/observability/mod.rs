//! Observability subsystem for rowdb
//!
//! Structured JSON logging only; no metrics, no tracing backends.

mod logger;

pub use logger::{Logger, Severity};
