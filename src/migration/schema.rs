// ABOUTME: Catalog schema definition and introspection utilities
// ABOUTME: Creates the commodity tables and discovers tables and columns in a store

use crate::error::{CopyError, Result, StoreRole};
#[cfg(test)]
use crate::utils::quote_identifier;
use rusqlite::Connection;

/// Tables copied by a default run, in dependency-safe order
///
/// `ImageCommodity` references both `CImage` and `Commodity`, so it must come last.
pub const DEFAULT_TABLES: [&str; 3] = ["CImage", "Commodity", "ImageCommodity"];

/// Script that creates the catalog schema in a fresh destination store
pub const CREATION_SCRIPT: &str = "
CREATE TABLE Commodity (
    Id INTEGER NOT NULL PRIMARY KEY,
    Name TEXT NOT NULL DEFAULT('Commodity ' || CURRENT_TIMESTAMP),
    Position INTEGER UNIQUE CHECK(Position IS NULL OR Position >= 0),
    Cost REAL NOT NULL DEFAULT(0.0) CHECK(Cost >= 0.0),
    WholePrice REAL NOT NULL DEFAULT(0.0) CHECK(WholePrice >= 0.0),
    PartialPrice REAL NOT NULL DEFAULT(0.0) CHECK(PartialPrice >= 0.0),
    CashPrice REAL NOT NULL DEFAULT(0.0) CHECK(CashPrice >= 0.0),
    IsExported BOOLEAN NOT NULL DEFAULT(FALSE)
);
CREATE TABLE CImage (
    Id INTEGER NOT NULL PRIMARY KEY,
    Contrast REAL NOT NULL DEFAULT(1.0) CHECK(Contrast >= 0.0),
    Brightness REAL NOT NULL DEFAULT(1.0) CHECK(Brightness >= 0.0),
    IsExported BOOLEAN NOT NULL DEFAULT(FALSE)
);
CREATE TABLE ImageCommodity (
    Id INTEGER NOT NULL PRIMARY KEY REFERENCES Commodity(Id) ON UPDATE CASCADE,
    ImageId INTEGER NOT NULL REFERENCES CImage(Id) ON UPDATE CASCADE,
    FontFamilyName TEXT NOT NULL DEFAULT('Arial'),
    FontStyle INTEGER NOT NULL DEFAULT(0) CHECK(FontStyle >= 0 AND FontStyle <= 3),
    FontSize REAL NOT NULL DEFAULT(100) CHECK(FontSize > 0.0),
    LocationX REAL NOT NULL DEFAULT(0.0) CHECK(LocationX >= 0.0),
    LocationY REAL NOT NULL DEFAULT(0.0) CHECK(LocationY >= 0.0),
    LabelColor TEXT NOT NULL DEFAULT('White')
);
CREATE INDEX IDX_ImageCommodity_ImageId ON ImageCommodity (ImageId);
";

/// Create the catalog tables and index in `destination`
///
/// Runs [`CREATION_SCRIPT`] once. Fails if any of the objects already exist,
/// which is what happens when a run is repeated against the same file.
pub fn initialize_schema(destination: &Connection) -> Result<()> {
    tracing::debug!("Executing schema creation script");
    destination.execute_batch(CREATION_SCRIPT)?;
    Ok(())
}

/// Ordered column names of `table`, as declared in the store's schema
///
/// Returns an empty list when the table does not exist.
pub fn table_columns(connection: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = connection.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Like [`table_columns`], but a missing table is an error
pub fn require_table_columns(
    connection: &Connection,
    table: &str,
    role: StoreRole,
) -> Result<Vec<String>> {
    let columns = table_columns(connection, table)?;
    if columns.is_empty() {
        return Err(CopyError::MissingTable {
            table: table.to_string(),
            role,
        });
    }
    Ok(columns)
}

#[cfg(test)]
pub(crate) fn count_rows(connection: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
    let count = connection.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
}
