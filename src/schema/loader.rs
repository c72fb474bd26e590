//! Schema bootstrap from the `_schemas.csv` meta-log
//!
//! The schema table is itself a record log: one row per field, eight
//! columns, loaded once at startup and immutable thereafter. Row layout:
//!
//! ```text
//! | 0   | 1  | 2        | 3     | 4    | 5   | 6   | 7     |
//! | _id | _v | resource | field | type | min | max | regex |
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::storage::{LogError, RecordLog, SortColumn, SortSchema};

use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldSchema, FieldType, ID_FIELD, VERSION_FIELD};

/// File name of the schema meta-log inside the data directory.
pub const SCHEMAS_LOG: &str = "_schemas.csv";

const SCHEMA_ROW_LEN: usize = 8;

/// Loads every resource schema from `<data_dir>/_schemas.csv`.
///
/// The order of rows per resource is the column order of that resource's
/// log. Each resource must declare `_id` (text) and `_v` (number) as its
/// first two fields; the store depends on that positional contract.
pub fn load_schemas(data_dir: &Path) -> SchemaResult<HashMap<String, Vec<FieldSchema>>> {
    let log = RecordLog::open(&data_dir.join(SCHEMAS_LOG), SortSchema::new())?;

    let mut schemas: HashMap<String, Vec<FieldSchema>> = HashMap::new();

    for row in log.list("")? {
        if row.len() != SCHEMA_ROW_LEN {
            return Err(SchemaError::BadSchemaRow {
                row_id: row.first().cloned().unwrap_or_default(),
                count: row.len(),
            });
        }

        let field_type =
            FieldType::parse(&row[4]).ok_or_else(|| SchemaError::UnknownFieldType {
                field: row[3].clone(),
                type_name: row[4].clone(),
            })?;

        let fs = FieldSchema {
            resource: row[2].clone(),
            field: row[3].clone(),
            field_type,
            min: row[5].parse().unwrap_or(0.0),
            max: row[6].parse().unwrap_or(0.0),
            regex: row[7].clone(),
        };

        schemas.entry(fs.resource.clone()).or_default().push(fs);
    }

    for (resource, fields) in &schemas {
        check_reserved_columns(resource, fields)?;
    }

    log.close()?;

    Ok(schemas)
}

/// Derives a log's sort schema (field name to column index and type) from
/// its field descriptors.
pub fn sort_schema_for(schemas: &[FieldSchema]) -> SortSchema {
    schemas
        .iter()
        .enumerate()
        .map(|(index, fs)| {
            (
                fs.field.clone(),
                SortColumn {
                    index,
                    field_type: fs.field_type,
                },
            )
        })
        .collect()
}

/// Opens one record log per resource at `<data_dir>/<resource>.csv`.
pub fn open_logs(
    data_dir: &Path,
    schemas: &HashMap<String, Vec<FieldSchema>>,
) -> Result<HashMap<String, RecordLog>, LogError> {
    let mut logs = HashMap::new();

    for (resource, fields) in schemas {
        let log = RecordLog::open(
            &data_dir.join(format!("{resource}.csv")),
            sort_schema_for(fields),
        )?;
        logs.insert(resource.clone(), log);
    }

    Ok(logs)
}

fn check_reserved_columns(resource: &str, fields: &[FieldSchema]) -> SchemaResult<()> {
    let id_ok = fields
        .first()
        .is_some_and(|fs| fs.field == ID_FIELD && fs.field_type == FieldType::Text);
    let version_ok = fields
        .get(1)
        .is_some_and(|fs| fs.field == VERSION_FIELD && fs.field_type == FieldType::Number);

    if !id_ok || !version_ok {
        return Err(SchemaError::ReservedColumns {
            resource: resource.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_schemas(dir: &TempDir, contents: &str) {
        fs::write(dir.path().join(SCHEMAS_LOG), contents).unwrap();
    }

    const BOOKS_SCHEMAS: &str = "\
s1,1,books,_id,text,0,0,\n\
s2,1,books,_v,number,0,0,\n\
s3,1,books,title,text,0,0,^.+$\n\
s4,1,books,publication_year,number,0,2500,\n\
s5,1,books,tags,list,0,0,\n";

    #[test]
    fn test_load_schemas_in_row_order() {
        let dir = TempDir::new().unwrap();
        write_schemas(&dir, BOOKS_SCHEMAS);

        let schemas = load_schemas(dir.path()).unwrap();
        let books = &schemas["books"];

        assert_eq!(books.len(), 5);
        assert_eq!(books[0].field, "_id");
        assert_eq!(books[1].field, "_v");
        assert_eq!(books[2].field, "title");
        assert_eq!(books[2].regex, "^.+$");
        assert_eq!(books[3].field_type, FieldType::Number);
        assert_eq!(books[3].max, 2500.0);
        assert_eq!(books[4].field_type, FieldType::List);
    }

    #[test]
    fn test_load_schemas_unparsable_bounds_fall_back_to_zero() {
        let dir = TempDir::new().unwrap();
        write_schemas(
            &dir,
            "s1,1,b,_id,text,0,0,\ns2,1,b,_v,number,0,0,\ns3,1,b,n,number,oops,nope,\n",
        );

        let schemas = load_schemas(dir.path()).unwrap();
        let n = &schemas["b"][2];
        assert_eq!(n.min, 0.0);
        assert_eq!(n.max, 0.0);
    }

    #[test]
    fn test_load_schemas_rejects_wrong_column_count() {
        let dir = TempDir::new().unwrap();
        write_schemas(&dir, "s1,1,books,_id,text,0,0\n");

        assert!(matches!(
            load_schemas(dir.path()),
            Err(SchemaError::BadSchemaRow { .. })
        ));
    }

    #[test]
    fn test_load_schemas_rejects_unknown_type() {
        let dir = TempDir::new().unwrap();
        write_schemas(
            &dir,
            "s1,1,b,_id,text,0,0,\ns2,1,b,_v,number,0,0,\ns3,1,b,flag,bool,0,0,\n",
        );

        assert!(matches!(
            load_schemas(dir.path()),
            Err(SchemaError::UnknownFieldType { .. })
        ));
    }

    #[test]
    fn test_load_schemas_enforces_reserved_positions() {
        let dir = TempDir::new().unwrap();
        write_schemas(
            &dir,
            "s1,1,b,title,text,0,0,\ns2,1,b,_id,text,0,0,\ns3,1,b,_v,number,0,0,\n",
        );

        assert!(matches!(
            load_schemas(dir.path()),
            Err(SchemaError::ReservedColumns { .. })
        ));
    }

    #[test]
    fn test_sort_schema_matches_column_order() {
        let dir = TempDir::new().unwrap();
        write_schemas(&dir, BOOKS_SCHEMAS);

        let schemas = load_schemas(dir.path()).unwrap();
        let sort = sort_schema_for(&schemas["books"]);

        assert_eq!(sort["_id"].index, 0);
        assert_eq!(sort["publication_year"].index, 3);
        assert_eq!(sort["publication_year"].field_type, FieldType::Number);
        assert!(!sort.contains_key("publisher"));
    }

    #[test]
    fn test_open_logs_creates_one_log_per_resource() {
        let dir = TempDir::new().unwrap();
        write_schemas(&dir, BOOKS_SCHEMAS);

        let schemas = load_schemas(dir.path()).unwrap();
        let logs = open_logs(dir.path(), &schemas).unwrap();

        assert!(logs.contains_key("books"));
        assert!(dir.path().join("books.csv").exists());
    }
}
