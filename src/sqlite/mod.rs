// ABOUTME: SQLite utilities module
// ABOUTME: Exports connection management for source and destination stores

pub mod connection;

pub use connection::{open_destination, open_in_memory, open_read_only, open_source};
