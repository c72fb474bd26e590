//! Record codec: typed resources to flat records and back
//!
//! Validation lives only on the ingress path (`parse_resource`).
//! `to_resource` is deliberately lenient because it reads data the system
//! itself wrote; a schema change must not make historical rows unreadable.

use regex::Regex;

use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldSchema, FieldType, Record, Resource, Value, ID_FIELD, VERSION_FIELD};

/// Validates one input value against its field descriptor.
///
/// Range semantics for numbers: `min == max == 0` disables the check, and
/// `max < min` disables the upper bound. Text patterns match unanchored;
/// schema authors anchor with `^...$` when they mean the whole string.
pub fn parse_field(fs: &FieldSchema, v: &Value) -> SchemaResult<Value> {
    match fs.field_type {
        FieldType::Number => {
            let n = v.as_number().ok_or_else(|| SchemaError::NotANumber {
                field: fs.field.clone(),
            })?;
            let in_range = (fs.min == 0.0 && fs.max == 0.0)
                || (n >= fs.min && (fs.max < fs.min || n <= fs.max));
            if !in_range {
                return Err(SchemaError::NumberOutOfRange {
                    field: fs.field.clone(),
                });
            }
            Ok(Value::Number(n))
        }
        FieldType::Text => {
            let t = v.as_text().ok_or_else(|| SchemaError::NotText {
                field: fs.field.clone(),
            })?;
            if !fs.regex.is_empty() {
                let re = Regex::new(&fs.regex).map_err(|source| SchemaError::BadPattern {
                    field: fs.field.clone(),
                    source,
                })?;
                if !re.is_match(t) {
                    return Err(SchemaError::PatternMismatch {
                        field: fs.field.clone(),
                    });
                }
            }
            Ok(Value::Text(t.to_string()))
        }
        FieldType::List => {
            let l = v.as_list().ok_or_else(|| SchemaError::NotAList {
                field: fs.field.clone(),
            })?;
            Ok(Value::List(l.to_vec()))
        }
    }
}

/// Validates a caller-supplied input map against a resource schema.
///
/// Applies `parse_field` to each schema entry in order, skipping `_id` and
/// `_v` (those are stamped by the store, never by the caller). Missing
/// fields are filled with the type-appropriate zero before validation.
pub fn parse_resource(schemas: &[FieldSchema], input: &Resource) -> SchemaResult<Resource> {
    let mut parsed = Resource::new();

    for fs in schemas {
        if fs.field == ID_FIELD || fs.field == VERSION_FIELD {
            continue;
        }

        let zero;
        let v = match input.get(&fs.field) {
            Some(v) => v,
            None => {
                zero = Value::zero(fs.field_type);
                &zero
            }
        };

        parsed.insert(fs.field.clone(), parse_field(fs, v)?);
    }

    Ok(parsed)
}

/// Formats one value for its log column.
///
/// A missing value is substituted with the type-appropriate zero; a value of
/// the wrong kind is an internal error, since everything reaching this point
/// already passed ingress validation.
pub fn format_field(fs: &FieldSchema, v: Option<&Value>) -> SchemaResult<String> {
    match fs.field_type {
        FieldType::Number => match v {
            None => Ok(format_number(0.0)),
            Some(Value::Number(n)) => Ok(format_number(*n)),
            Some(other) => Err(SchemaError::UnexpectedKind {
                field: fs.field.clone(),
                expected: "number",
                actual: other.kind(),
            }),
        },
        FieldType::Text => match v {
            None => Ok(String::new()),
            Some(Value::Text(t)) => Ok(t.clone()),
            Some(other) => Err(SchemaError::UnexpectedKind {
                field: fs.field.clone(),
                expected: "text",
                actual: other.kind(),
            }),
        },
        FieldType::List => match v {
            None => Ok(String::new()),
            Some(Value::List(l)) => Ok(l.join(",")),
            Some(other) => Err(SchemaError::UnexpectedKind {
                field: fs.field.clone(),
                expected: "list",
                actual: other.kind(),
            }),
        },
    }
}

/// Formats a typed resource into a flat record, one column per schema entry.
pub fn to_record(schemas: &[FieldSchema], res: &Resource) -> SchemaResult<Record> {
    schemas
        .iter()
        .map(|fs| format_field(fs, res.get(&fs.field)))
        .collect()
}

/// Inverts `to_record` with lenient parsing: unparsable numbers become 0.0
/// and an empty list column becomes the empty sequence. A record shorter
/// than the schema is an error.
pub fn to_resource(schemas: &[FieldSchema], rec: &[String]) -> SchemaResult<Resource> {
    if rec.len() < schemas.len() {
        return Err(SchemaError::RecordTooShort {
            record_len: rec.len(),
            schema_len: schemas.len(),
        });
    }

    let mut res = Resource::new();

    for (i, fs) in schemas.iter().enumerate() {
        let v = match fs.field_type {
            FieldType::Number => Value::Number(rec[i].parse().unwrap_or(0.0)),
            FieldType::Text => Value::Text(rec[i].clone()),
            FieldType::List => {
                if rec[i].is_empty() {
                    Value::List(Vec::new())
                } else {
                    Value::List(rec[i].split(',').map(String::from).collect())
                }
            }
        };
        res.insert(fs.field.clone(), v);
    }

    Ok(res)
}

/// Shortest decimal representation that round-trips the value.
fn format_number(n: f64) -> String {
    n.to_string()
}
