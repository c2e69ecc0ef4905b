// ABOUTME: Utility functions for identifier validation and quoting
// ABOUTME: Keeps table names safe to interpolate into generated SQL

use crate::error::{CopyError, Result};

/// Maximum identifier length accepted by [`validate_table_name`]
const MAX_IDENTIFIER_LEN: usize = 128;

/// Validate a table name before it is interpolated into SQL
///
/// Table names cannot be bound as statement parameters, so every statement the
/// copier generates embeds them directly. Only plain identifiers are accepted:
/// - Non-empty, at most 128 characters
/// - Starts with an ASCII letter or underscore
/// - Contains only ASCII letters, digits, and underscores
/// - Does not use SQLite's reserved `sqlite_` prefix
///
/// # Errors
///
/// Returns [`CopyError::InvalidTableName`] if any rule is violated.
///
/// # Examples
///
/// ```
/// # use commodity_db_duplicator::utils::validate_table_name;
/// assert!(validate_table_name("ImageCommodity").is_ok());
/// assert!(validate_table_name("_staging_1").is_ok());
///
/// assert!(validate_table_name("").is_err());
/// assert!(validate_table_name("Commodity; DROP TABLE CImage").is_err());
/// assert!(validate_table_name("sqlite_master").is_err());
/// ```
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_start
        || !valid_rest
        || name.len() > MAX_IDENTIFIER_LEN
        || name.to_ascii_lowercase().starts_with("sqlite_")
    {
        return Err(CopyError::InvalidTableName(sanitize_identifier(name)));
    }

    Ok(())
}

/// Quote an identifier for SQLite, doubling any embedded quotes
///
/// # Examples
///
/// ```
/// # use commodity_db_duplicator::utils::quote_identifier;
/// assert_eq!(quote_identifier("Commodity"), "\"Commodity\"");
/// assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Sanitize an identifier (table name, column name) for display
///
/// Removes control characters and limits length to keep log lines and error
/// messages readable.
///
/// **Note**: This is for display purposes only. For SQL safety, use
/// [`validate_table_name`] and [`quote_identifier`].
///
/// # Examples
///
/// ```
/// # use commodity_db_duplicator::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\x00name"), "tablename");
/// assert_eq!(sanitize_identifier("table\nname"), "tablename");
///
/// let long_name = "a".repeat(200);
/// assert_eq!(sanitize_identifier(&long_name).len(), 100);
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}
