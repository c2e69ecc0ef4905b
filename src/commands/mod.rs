// ABOUTME: Command implementations for each duplication phase
// ABOUTME: Exports duplicate and verify commands

pub mod duplicate;
pub mod verify;

pub use duplicate::{duplicate, duplicate_stores, TableCopyReport};
pub use verify::{verify, verify_stores};
