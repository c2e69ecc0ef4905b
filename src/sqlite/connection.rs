// ABOUTME: SQLite connection utilities for source and destination stores
// ABOUTME: Opens database files with the right flags and pragmas for a duplication run

use crate::error::{CopyError, Result, StoreRole};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Open an existing source database
///
/// The source is opened read-only and is never created: a missing file is a
/// connection error rather than a silently created empty database.
pub fn open_source(path: impl AsRef<Path>) -> Result<Connection> {
    open_read_only(path, StoreRole::Source)
}

/// Open an existing database read-only, e.g. a finished destination for verification
pub fn open_read_only(path: impl AsRef<Path>, role: StoreRole) -> Result<Connection> {
    let path = path.as_ref();
    tracing::debug!("Opening {} database at {} (read-only)", role, path.display());

    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    Connection::open_with_flags(literal_path(path), flags).map_err(|source| {
        CopyError::Connection {
            role,
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Open (creating if needed) the destination database
///
/// `enforce_foreign_keys` turns on `PRAGMA foreign_keys`, which SQLite leaves
/// off by default.
pub fn open_destination(path: impl AsRef<Path>, enforce_foreign_keys: bool) -> Result<Connection> {
    let path = path.as_ref();
    tracing::debug!("Opening destination database at {}", path.display());

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    let connection = Connection::open_with_flags(literal_path(path), flags).map_err(|source| {
        CopyError::Connection {
            role: StoreRole::Destination,
            path: path.to_path_buf(),
            source,
        }
    })?;
    configure(&connection, enforce_foreign_keys)?;

    Ok(connection)
}

/// Open a private in-memory database
pub fn open_in_memory(enforce_foreign_keys: bool) -> Result<Connection> {
    let connection = Connection::open_in_memory()?;
    configure(&connection, enforce_foreign_keys)?;
    Ok(connection)
}

fn configure(connection: &Connection, enforce_foreign_keys: bool) -> Result<()> {
    connection.pragma_update(None, "foreign_keys", enforce_foreign_keys)?;
    Ok(())
}

/// Path SQLite will treat as a plain filename
///
/// The bundled SQLite is built with URI filenames on, so a relative path
/// beginning with `file:` would otherwise be parsed as a URI whose query
/// parameters can change how the database is opened.
fn literal_path(path: &Path) -> PathBuf {
    if path.to_string_lossy().starts_with("file:") {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foreign_keys_enabled(connection: &Connection) -> bool {
        connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_open_source_missing_file_is_connection_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("does-not-exist.sqlite");

        let err = open_source(&path).unwrap_err();
        match err {
            CopyError::Connection { role, .. } => assert_eq!(role, StoreRole::Source),
            other => panic!("expected connection error, got {:?}", other),
        }
        assert!(!path.exists(), "source must not be created");
    }

    #[test]
    fn test_open_source_is_read_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("source.sqlite");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);")
            .unwrap();

        let source = open_source(&path).unwrap();
        assert!(source.execute("INSERT INTO t (id) VALUES (1)", []).is_err());
    }

    #[test]
    fn test_open_destination_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("destination.sqlite");

        let destination = open_destination(&path, false).unwrap();
        destination
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);")
            .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_foreign_keys_pragma_follows_flag() {
        assert!(foreign_keys_enabled(&open_in_memory(true).unwrap()));
        assert!(!foreign_keys_enabled(&open_in_memory(false).unwrap()));

        let dir = tempfile::TempDir::new().unwrap();
        let destination = open_destination(dir.path().join("fk.sqlite"), true).unwrap();
        assert!(foreign_keys_enabled(&destination));
    }

    #[test]
    fn test_open_source_does_not_parse_uri_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("source.sqlite");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY);")
            .unwrap();

        let uri = format!("file:{}?mode=rw", path.display());
        let err = open_source(&uri).unwrap_err();

        assert!(matches!(err, CopyError::Connection { .. }));
        assert!(open_source(&path).is_ok());
    }

    #[test]
    fn test_literal_path() {
        assert_eq!(
            literal_path(Path::new("file:db000.sqlite?mode=rw")),
            Path::new("./file:db000.sqlite?mode=rw")
        );
        assert_eq!(literal_path(Path::new("db000.sqlite")), Path::new("db000.sqlite"));
        assert_eq!(
            literal_path(Path::new("/data/file:db.sqlite")),
            Path::new("/data/file:db.sqlite")
        );
    }
}
