// ABOUTME: Migration utilities module
// ABOUTME: Handles schema creation, table introspection, row copying, and verification

pub mod checksum;
pub mod copy;
pub mod schema;

pub use checksum::{compare_tables, compute_table_checksum, ChecksumResult};
pub use copy::{copy_table, copy_table_with_progress, CopyOptions, TableRow};
pub use schema::{initialize_schema, table_columns, CREATION_SCRIPT, DEFAULT_TABLES};
