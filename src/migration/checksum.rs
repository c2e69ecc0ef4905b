// ABOUTME: Data validation utilities using checksums
// ABOUTME: Computes and compares table checksums for data integrity verification

use crate::error::StoreRole;
use crate::migration::schema::require_table_columns;
use crate::utils::{quote_identifier, validate_table_name};
use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

/// Result of a checksum comparison between source and destination tables
#[derive(Debug, Clone, PartialEq)]
pub struct ChecksumResult {
    pub table: String,
    pub source_checksum: String,
    pub destination_checksum: String,
    pub source_row_count: i64,
    pub destination_row_count: i64,
    pub matches: bool,
}

impl ChecksumResult {
    /// Returns true if both checksums and row counts match
    pub fn is_valid(&self) -> bool {
        self.matches && self.source_row_count == self.destination_row_count
    }
}

/// Compute a checksum for a table
///
/// This generates a SHA-256 checksum of all data in the table by:
/// 1. Reading the table's columns, sorted by name
/// 2. Ordering rows by all columns for deterministic results
/// 3. Hashing every value together with its storage class, so `1`, `1.0`,
///    and `'1'` produce different checksums
///
/// An empty table has the checksum `"empty"`.
pub fn compute_table_checksum(
    connection: &Connection,
    table: &str,
    role: StoreRole,
) -> Result<(String, i64)> {
    tracing::debug!("Computing checksum for {} table {}", role, table);

    validate_table_name(table)?;
    let columns = require_table_columns(connection, table, role)?;
    let rows = fetch_rows_ordered(connection, table, &columns)
        .with_context(|| format!("Failed to compute checksum for {} table {}", role, table))?;

    if rows.is_empty() {
        return Ok(("empty".to_string(), 0));
    }

    let mut hasher = Sha256::new();
    for row in &rows {
        for value in row {
            hash_value(&mut hasher, value);
        }
        hasher.update(b"\n");
    }
    let checksum = format!("{:x}", hasher.finalize());
    let row_count = rows.len() as i64;

    tracing::debug!(
        "Checksum for {} table {}: {} ({} rows)",
        role,
        table,
        checksum,
        row_count
    );

    Ok((checksum, row_count))
}

/// Compare a table between source and destination databases
pub fn compare_tables(
    source: &Connection,
    destination: &Connection,
    table: &str,
) -> Result<ChecksumResult> {
    tracing::info!("Comparing table {}", table);

    let (source_checksum, source_row_count) =
        compute_table_checksum(source, table, StoreRole::Source)?;
    let (destination_checksum, destination_row_count) =
        compute_table_checksum(destination, table, StoreRole::Destination)?;

    let matches = source_checksum == destination_checksum;

    Ok(ChecksumResult {
        table: table.to_string(),
        source_checksum,
        destination_checksum,
        source_row_count,
        destination_row_count,
        matches,
    })
}

fn fetch_rows_ordered(
    connection: &Connection,
    table: &str,
    columns: &[String],
) -> Result<Vec<Vec<Value>>> {
    // Sorted by name so column order in the DDL does not affect the checksum
    let mut sorted: Vec<&str> = columns.iter().map(String::as_str).collect();
    sorted.sort_by_key(|c| c.to_ascii_lowercase());

    let column_list = sorted
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    // Declared collations may differ between stores, so order with BINARY
    let order_by = sorted
        .iter()
        .map(|c| format!("{} COLLATE BINARY", quote_identifier(c)))
        .collect::<Vec<_>>()
        .join(", ");
    let select = format!(
        "SELECT {} FROM {} ORDER BY {}",
        column_list,
        quote_identifier(table),
        order_by
    );

    let mut stmt = connection.prepare(&select)?;
    let rows = stmt
        .query_map([], |row| {
            (0..sorted.len())
                .map(|idx| row.get::<_, Value>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update(b"n"),
        Value::Integer(v) => {
            hasher.update(b"i");
            hasher.update(v.to_le_bytes());
        }
        Value::Real(v) => {
            hasher.update(b"r");
            hasher.update(v.to_bits().to_le_bytes());
        }
        Value::Text(v) => {
            hasher.update(b"t");
            hasher.update((v.len() as u64).to_le_bytes());
            hasher.update(v.as_bytes());
        }
        Value::Blob(v) => {
            hasher.update(b"b");
            hasher.update((v.len() as u64).to_le_bytes());
            hasher.update(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{copy_table, initialize_schema};

    fn catalog_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_compute_empty_table_checksum() {
        let conn = catalog_store();

        let (checksum, row_count) =
            compute_table_checksum(&conn, "CImage", StoreRole::Source).unwrap();

        assert_eq!(checksum, "empty");
        assert_eq!(row_count, 0);
    }

    #[test]
    fn test_checksum_ignores_insertion_order() {
        let first = catalog_store();
        let second = catalog_store();
        first
            .execute_batch(
                "INSERT INTO CImage (Id, Contrast) VALUES (1, 0.5);
                 INSERT INTO CImage (Id, Contrast) VALUES (2, 0.7);",
            )
            .unwrap();
        second
            .execute_batch(
                "INSERT INTO CImage (Id, Contrast) VALUES (2, 0.7);
                 INSERT INTO CImage (Id, Contrast) VALUES (1, 0.5);",
            )
            .unwrap();

        let a = compute_table_checksum(&first, "CImage", StoreRole::Source).unwrap();
        let b = compute_table_checksum(&second, "CImage", StoreRole::Destination).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.0.len(), 64);
    }

    #[test]
    fn test_checksum_distinguishes_storage_classes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE a (v);
             CREATE TABLE b (v);
             CREATE TABLE c (v);
             INSERT INTO a VALUES (1);
             INSERT INTO b VALUES (1.0);
             INSERT INTO c VALUES ('1');",
        )
        .unwrap();

        let a = compute_table_checksum(&conn, "a", StoreRole::Source).unwrap().0;
        let b = compute_table_checksum(&conn, "b", StoreRole::Source).unwrap().0;
        let c = compute_table_checksum(&conn, "c", StoreRole::Source).unwrap().0;

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_compare_tables_after_copy() {
        let source = catalog_store();
        let mut destination = catalog_store();
        source
            .execute_batch(
                "INSERT INTO Commodity (Id, Name, Position, Cost) VALUES (1, 'Apple', 0, 1.5);
                 INSERT INTO Commodity (Id, Name, Position, Cost) VALUES (2, 'Pear', 1, 2.0);",
            )
            .unwrap();

        copy_table(&source, &mut destination, "Commodity").unwrap();
        let result = compare_tables(&source, &destination, "Commodity").unwrap();

        assert!(result.is_valid());
        assert_eq!(result.source_row_count, 2);
        assert_eq!(result.destination_row_count, 2);
    }

    #[test]
    fn test_compare_tables_detects_modified_row() {
        let source = catalog_store();
        let mut destination = catalog_store();
        source
            .execute("INSERT INTO CImage (Id, Brightness) VALUES (1, 0.9)", [])
            .unwrap();
        copy_table(&source, &mut destination, "CImage").unwrap();

        destination
            .execute("UPDATE CImage SET Brightness = 1.1 WHERE Id = 1", [])
            .unwrap();
        let result = compare_tables(&source, &destination, "CImage").unwrap();

        assert!(!result.matches);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_compare_tables_ignores_declared_collation() {
        let source = Connection::open_in_memory().unwrap();
        let mut destination = Connection::open_in_memory().unwrap();
        source
            .execute_batch(
                "CREATE TABLE Labels (Name TEXT COLLATE NOCASE);
                 INSERT INTO Labels VALUES ('a');
                 INSERT INTO Labels VALUES ('B');",
            )
            .unwrap();
        destination
            .execute_batch("CREATE TABLE Labels (Name TEXT);")
            .unwrap();

        assert_eq!(copy_table(&source, &mut destination, "Labels").unwrap(), 2);
        let result = compare_tables(&source, &destination, "Labels").unwrap();

        assert!(result.is_valid());
        assert_eq!(result.source_checksum, result.destination_checksum);
    }

    #[test]
    fn test_compare_tables_missing_destination_table() {
        let source = catalog_store();
        let destination = Connection::open_in_memory().unwrap();

        let err = compare_tables(&source, &destination, "CImage").unwrap_err();
        assert!(err.to_string().contains("destination"));
    }
}
