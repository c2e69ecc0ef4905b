// ABOUTME: Error types for the row copier and store connections
// ABOUTME: Classifies SQLite failures into schema, constraint, and connection errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of a duplication run a store plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    Source,
    Destination,
}

impl fmt::Display for StoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreRole::Source => f.write_str("source"),
            StoreRole::Destination => f.write_str("destination"),
        }
    }
}

/// Errors that can occur while copying tables between stores
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("Failed to open {role} database at '{}': {source}", .path.display())]
    Connection {
        role: StoreRole,
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid table name '{0}'")]
    InvalidTableName(String),

    #[error("Table '{table}' does not exist in the {role} database")]
    MissingTable { table: String, role: StoreRole },

    #[error(
        "Schema mismatch for table '{table}': columns missing in destination [{}], columns missing in source [{}]",
        .missing_in_destination.join(", "),
        .missing_in_source.join(", ")
    )]
    SchemaMismatch {
        table: String,
        missing_in_destination: Vec<String>,
        missing_in_source: Vec<String>,
    },

    #[error("Constraint violation while copying table '{table}': {message}")]
    ConstraintViolation { table: String, message: String },

    #[error("Table '{table}' has no rows to copy")]
    EmptySourceTable { table: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl CopyError {
    /// Classify an error raised while writing rows of `table` to the destination
    pub(crate) fn from_write(table: &str, err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                CopyError::ConstraintViolation {
                    table: table.to_string(),
                    message: message.clone().unwrap_or_else(|| failure.to_string()),
                }
            }
            _ => CopyError::Sqlite(err),
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, CopyError::ConstraintViolation { .. })
    }
}

/// Result type for copier operations
pub type Result<T> = std::result::Result<T, CopyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_failures_are_classified() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v REAL CHECK(v >= 0));")
            .unwrap();

        let err = conn
            .execute("INSERT INTO t (id, v) VALUES (1, -1.0)", [])
            .unwrap_err();
        let classified = CopyError::from_write("t", err);

        assert!(classified.is_constraint_violation());
        assert!(classified.to_string().contains("'t'"));
    }

    #[test]
    fn test_other_failures_stay_sqlite_errors() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.execute("INSERT INTO nowhere VALUES (1)", []).unwrap_err();

        assert!(matches!(
            CopyError::from_write("nowhere", err),
            CopyError::Sqlite(_)
        ));
    }

    #[test]
    fn test_schema_mismatch_message_lists_columns() {
        let err = CopyError::SchemaMismatch {
            table: "CImage".to_string(),
            missing_in_destination: vec!["SizeRatio".to_string()],
            missing_in_source: vec!["IsExported".to_string(), "Brightness".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("[SizeRatio]"));
        assert!(msg.contains("[IsExported, Brightness]"));
    }
}
