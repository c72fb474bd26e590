//! Store boundary error kinds
//!
//! Everything the store surfaces collapses into five kinds; the HTTP
//! adapter maps them onto status codes. Lower-level log and I/O errors are
//! wrapped as `Internal` here and never leak their concrete types.

use thiserror::Error;

use crate::schema::SchemaError;
use crate::storage::LogError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors exported at the store boundary
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown resource name or id
    #[error("not found")]
    NotFound,

    /// Credentials absent or wrong where a matched policy rule requires them
    #[error("unauthenticated")]
    Unauthenticated,

    /// No policy rule allows the action
    #[error("unauthorized")]
    Unauthorized,

    /// Input rejected by the schema codec; names the offending field
    #[error(transparent)]
    Validation(#[from] SchemaError),

    /// Everything else: I/O, codec failures on data the system wrote itself
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Wraps a record log error, preserving not-found.
    pub(crate) fn from_log(err: LogError) -> Self {
        match err {
            LogError::NotFound => StoreError::NotFound,
            other => StoreError::Internal(other.to_string()),
        }
    }

    /// Wraps a codec failure on the egress path. Stored rows already passed
    /// ingress validation, so this is never a client error.
    pub(crate) fn from_codec(err: SchemaError) -> Self {
        StoreError::Internal(err.to_string())
    }
}
