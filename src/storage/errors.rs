//! Record log error types

use thiserror::Error;

/// Result type for record log operations
pub type LogResult<T> = Result<T, LogError>;

/// Errors raised by the append-only record log
#[derive(Debug, Error)]
pub enum LogError {
    /// No live row for the requested id
    #[error("record not found")]
    NotFound,

    /// Create of an id that already has a live row
    #[error("record already exists")]
    AlreadyExists,

    /// Record too short or missing its id column
    #[error("invalid record")]
    InvalidRecord,

    /// Operation on a log that has been closed
    #[error("log is closed")]
    Closed,

    /// The index points at a row that does not carry the expected id
    #[error("corrupted index for record \"{id}\"")]
    CorruptIndex { id: String },

    /// Sort requested on a field the log's sort schema does not know
    #[error("field '{field}' is not a defined schema field for sorting")]
    UnknownSortField { field: String },

    /// A row's version column is not an integer
    #[error("invalid version column: {0}")]
    BadVersion(#[from] std::num::ParseIntError),

    /// Lock poisoned by a panicking writer
    #[error("log lock poisoned")]
    Poisoned,

    /// CSV encoding or decoding failure
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Underlying file I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        assert_eq!(LogError::NotFound.to_string(), "record not found");
    }

    #[test]
    fn test_unknown_sort_field_names_the_field() {
        let err = LogError::UnknownSortField {
            field: "publication_year".into(),
        };
        assert!(err.to_string().contains("publication_year"));
    }
}
