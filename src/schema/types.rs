//! Schema type definitions
//!
//! Supported field types:
//! - number: 64-bit floating point
//! - text: UTF-8 string
//! - list: ordered sequence of strings

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Reserved id column, always at position 0.
pub const ID_FIELD: &str = "_id";

/// Reserved version column, always at position 1.
pub const VERSION_FIELD: &str = "_v";

/// Supported field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// 64-bit floating point
    Number,
    /// UTF-8 string
    Text,
    /// Ordered sequence of strings
    List,
}

impl FieldType {
    /// Returns the type name as it appears in the schema table.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Number => "number",
            FieldType::Text => "text",
            FieldType::List => "list",
        }
    }

    /// Parses a schema-table type name.
    pub fn parse(s: &str) -> Option<FieldType> {
        match s {
            "number" => Some(FieldType::Number),
            "text" => Some(FieldType::Text),
            "list" => Some(FieldType::List),
            _ => None,
        }
    }
}

/// One field descriptor of a resource schema.
///
/// The order of descriptors for a resource is the column order of its log.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// Resource the field belongs to
    pub resource: String,
    /// Field name
    pub field: String,
    /// Field data type
    pub field_type: FieldType,
    /// Lower bound for number fields; `min == max == 0` disables the check
    pub min: f64,
    /// Upper bound for number fields; `max < min` disables the upper bound
    pub max: f64,
    /// Unanchored validation pattern for text fields; empty means no check
    pub regex: String,
}

impl FieldSchema {
    /// Creates a descriptor with no range or pattern constraints.
    pub fn new(
        resource: impl Into<String>,
        field: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            resource: resource.into(),
            field: field.into(),
            field_type,
            min: 0.0,
            max: 0.0,
            regex: String::new(),
        }
    }

    /// Sets the numeric range constraint.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Sets the text pattern constraint.
    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = regex.into();
        self
    }
}

/// A typed field value.
///
/// Untagged so that JSON objects at the HTTP boundary map directly onto
/// resources: numbers become `Number`, strings `Text`, string arrays `List`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit floating point
    Number(f64),
    /// UTF-8 string
    Text(String),
    /// Ordered sequence of strings
    List(Vec<String>),
}

impl Value {
    /// Returns the type-appropriate zero value.
    pub fn zero(field_type: FieldType) -> Value {
        match field_type {
            FieldType::Number => Value::Number(0.0),
            FieldType::Text => Value::Text(String::new()),
            FieldType::List => Value::List(Vec::new()),
        }
    }

    /// Returns the number if this is a `Number`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the elements if this is a `List`.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the kind name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::List(_) => "list",
        }
    }
}

/// A typed view of a record: field name to typed value.
pub type Resource = HashMap<String, Value>;

/// A flat record: one string per schema column, as written to disk.
pub type Record = Vec<String>;
