//! Schema error types
//!
//! Validation errors carry the offending field name; they surface at the
//! ingress boundary as client errors. Loader errors are startup-fatal.

use thiserror::Error;

use crate::storage::LogError;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema validation, codec, and bootstrap errors
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Input value for a number field is not a number
    #[error("failed to parse field \"{field}\" as a number")]
    NotANumber { field: String },

    /// Number outside the schema's [min, max] range
    #[error("failed to parse field \"{field}\" as a valid number")]
    NumberOutOfRange { field: String },

    /// Input value for a text field is not a string
    #[error("failed to parse field \"{field}\" as a string")]
    NotText { field: String },

    /// Text does not match the schema pattern
    #[error("failed to parse field \"{field}\" as a valid string")]
    PatternMismatch { field: String },

    /// The schema pattern itself does not compile
    #[error("invalid regex for field \"{field}\": {source}")]
    BadPattern {
        field: String,
        source: regex::Error,
    },

    /// Input value for a list field is not a sequence of strings
    #[error("failed to parse field \"{field}\" as a list")]
    NotAList { field: String },

    /// A stored value has the wrong kind for its column
    #[error("internal error: expected {expected} for field \"{field}\", got {actual}")]
    UnexpectedKind {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Record read from disk has fewer columns than the schema
    #[error("record length {record_len} is less than schema length {schema_len}")]
    RecordTooShort {
        record_len: usize,
        schema_len: usize,
    },

    /// Schema table row with the wrong column count
    #[error("schema row \"{row_id}\" has {count} columns, expected 8")]
    BadSchemaRow { row_id: String, count: usize },

    /// Schema table row naming an unknown field type
    #[error("unknown field type \"{type_name}\" for field \"{field}\"")]
    UnknownFieldType { field: String, type_name: String },

    /// Resource schema violating the reserved positional contract
    #[error(
        "resource \"{resource}\" must declare \"_id\" (text) and \"_v\" (number) as its first two fields"
    )]
    ReservedColumns { resource: String },

    /// Failure reading the schema bootstrap log
    #[error("schema bootstrap failed: {0}")]
    Bootstrap(#[from] LogError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_name_the_field() {
        let err = SchemaError::NumberOutOfRange {
            field: "year".into(),
        };
        assert!(err.to_string().contains("year"));

        let err = SchemaError::PatternMismatch {
            field: "title".into(),
        };
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_short_record_reports_lengths() {
        let err = SchemaError::RecordTooShort {
            record_len: 2,
            schema_len: 5,
        };
        let display = err.to_string();
        assert!(display.contains('2'));
        assert!(display.contains('5'));
    }
}
