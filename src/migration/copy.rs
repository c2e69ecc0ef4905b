// ABOUTME: Generic row copier that moves every row of a table between stores
// ABOUTME: Validates column sets, then bulk-inserts all rows in one transaction per table

use crate::error::{CopyError, Result, StoreRole};
use crate::migration::schema::require_table_columns;
use crate::utils::{quote_identifier, sanitize_identifier, validate_table_name};
use indicatif::ProgressBar;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// One row of a table: column names paired with their raw stored values
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    columns: Vec<(String, Value)>,
}

impl TableRow {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Value stored under `column` (SQLite column names are case-insensitive)
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, value)| value)
    }

    #[cfg(test)]
    fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

/// Options that change how a single table copy behaves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Treat a source table with zero rows as an error instead of a no-op
    pub fail_on_empty_table: bool,
}

/// Copy every row of `table` from `source` to `destination`
///
/// Returns the number of rows copied. See [`copy_table_with_progress`].
pub fn copy_table(source: &Connection, destination: &mut Connection, table: &str) -> Result<usize> {
    copy_table_with_progress(
        source,
        destination,
        table,
        &CopyOptions::default(),
        &ProgressBar::hidden(),
    )
}

/// Copy every row of `table` from `source` to `destination`, reporting progress
///
/// The copy proceeds in these steps:
/// 1. Validates the table name (it is embedded in generated SQL)
/// 2. Reads the column set of `table` from both stores and requires them to match
/// 3. Reads all source rows, in whatever order SQLite yields them
/// 4. Inserts every row into the destination inside a single transaction
///
/// All values are carried over untouched: no casting or defaulting happens here.
/// A failing row rolls back the whole table, so the destination never holds a
/// partially copied table.
///
/// A source table with zero rows returns `Ok(0)` without touching the
/// destination, unless `options.fail_on_empty_table` is set.
///
/// # Errors
///
/// - [`CopyError::InvalidTableName`] if `table` is not a plain identifier
/// - [`CopyError::MissingTable`] if either store lacks the table
/// - [`CopyError::SchemaMismatch`] if the column sets differ
/// - [`CopyError::ConstraintViolation`] if any row breaks a destination constraint
/// - [`CopyError::EmptySourceTable`] for an empty source under the strict option
///
/// # Examples
///
/// ```
/// # use commodity_db_duplicator::migration::{copy_table, initialize_schema};
/// # fn example() -> commodity_db_duplicator::error::Result<()> {
/// let source = rusqlite::Connection::open_in_memory()?;
/// let mut destination = rusqlite::Connection::open_in_memory()?;
/// initialize_schema(&source)?;
/// initialize_schema(&destination)?;
///
/// source.execute("INSERT INTO CImage (Id, Contrast) VALUES (1, 0.5)", [])?;
/// assert_eq!(copy_table(&source, &mut destination, "CImage")?, 1);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub fn copy_table_with_progress(
    source: &Connection,
    destination: &mut Connection,
    table: &str,
    options: &CopyOptions,
    progress: &ProgressBar,
) -> Result<usize> {
    validate_table_name(table)?;

    let columns = require_table_columns(source, table, StoreRole::Source)?;
    let destination_columns = require_table_columns(destination, table, StoreRole::Destination)?;
    check_column_sets(table, &columns, &destination_columns)?;

    let rows = fetch_rows(source, table, &columns)?;
    tracing::debug!("Fetched {} rows from source table '{}'", rows.len(), table);

    if rows.is_empty() {
        if options.fail_on_empty_table {
            return Err(CopyError::EmptySourceTable {
                table: table.to_string(),
            });
        }
        tracing::warn!("⚠ Source table '{}' is empty, nothing to copy", table);
        return Ok(0);
    }

    let insert = build_insert_statement(table, &columns);
    tracing::debug!("Insert statement: {}", insert);

    progress.set_length(rows.len() as u64);
    progress.set_position(0);

    let tx = destination.transaction()?;
    {
        let mut stmt = tx.prepare(&insert)?;
        for row in &rows {
            stmt.execute(params_from_iter(row.values()))
                .map_err(|e| CopyError::from_write(table, e))?;
            progress.inc(1);
        }
    }
    tx.commit().map_err(|e| CopyError::from_write(table, e))?;

    Ok(rows.len())
}

/// Read every row of `table`, selecting exactly `columns` in that order
pub fn fetch_rows(connection: &Connection, table: &str, columns: &[String]) -> Result<Vec<TableRow>> {
    let select = format!(
        "SELECT {} FROM {}",
        quoted_column_list(columns),
        quote_identifier(table)
    );

    let mut stmt = connection.prepare(&select)?;
    let rows = stmt
        .query_map([], |row| {
            let mut values = Vec::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                values.push((name.clone(), row.get::<_, Value>(idx)?));
            }
            Ok(TableRow::new(values))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Build `INSERT INTO "table" ("a", "b") VALUES (?1, ?2)` for `columns`
pub fn build_insert_statement(table: &str, columns: &[String]) -> String {
    let placeholders: Vec<String> = (1..=columns.len()).map(|idx| format!("?{}", idx)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        quoted_column_list(columns),
        placeholders.join(", ")
    )
}

fn quoted_column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_column_sets(table: &str, source: &[String], destination: &[String]) -> Result<()> {
    let contains = |set: &[String], name: &str| set.iter().any(|c| c.eq_ignore_ascii_case(name));

    let missing_in_destination: Vec<String> = source
        .iter()
        .filter(|c| !contains(destination, c.as_str()))
        .map(|c| sanitize_identifier(c))
        .collect();
    let missing_in_source: Vec<String> = destination
        .iter()
        .filter(|c| !contains(source, c.as_str()))
        .map(|c| sanitize_identifier(c))
        .collect();

    if !missing_in_destination.is_empty() || !missing_in_source.is_empty() {
        return Err(CopyError::SchemaMismatch {
            table: table.to_string(),
            missing_in_destination,
            missing_in_source,
        });
    }

    Ok(())
}
