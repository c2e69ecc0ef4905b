// ABOUTME: Verify command implementation - Validate data integrity
// ABOUTME: Compares table checksums between source and destination databases

use crate::config::DuplicatorConfig;
use crate::error::StoreRole;
use crate::migration::{compare_tables, ChecksumResult};
use crate::sqlite;
use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// Verify data integrity between source and destination databases
///
/// Opens both databases read-only and compares every configured table by
/// checksum and row count.
///
/// # Errors
///
/// This function will return an error if:
/// - Either database cannot be opened
/// - A configured table is missing from either database
/// - Any table's checksum or row count differs
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use commodity_db_duplicator::commands::verify;
/// # use commodity_db_duplicator::config::DuplicatorConfig;
/// # fn example() -> Result<()> {
/// verify(&DuplicatorConfig::default())?;
/// # Ok(())
/// # }
/// ```
pub fn verify(config: &DuplicatorConfig) -> Result<Vec<ChecksumResult>> {
    config.validate()?;
    tracing::info!("Starting data integrity verification...");

    tracing::info!("Opening source database...");
    let source = sqlite::open_source(&config.source).context("Failed to open source database")?;

    tracing::info!("Opening destination database...");
    let destination = sqlite::open_read_only(&config.destination, StoreRole::Destination)
        .context("Failed to open destination database")?;

    verify_stores(&source, &destination, &config.tables)
}

/// Compare `tables` between two open stores and log a summary
pub fn verify_stores(
    source: &Connection,
    destination: &Connection,
    tables: &[String],
) -> Result<Vec<ChecksumResult>> {
    tracing::info!("Verifying {} table(s)", tables.len());

    let mut results = Vec::with_capacity(tables.len());
    let mut mismatches = 0;

    for table in tables {
        let result = compare_tables(source, destination, table)
            .with_context(|| format!("Failed to verify table '{}'", table))?;

        if result.is_valid() {
            tracing::info!(
                "  ✓ {}: Match ({} rows, checksum: {})",
                table,
                result.source_row_count,
                short_checksum(&result.source_checksum)
            );
        } else {
            tracing::error!(
                "  ✗ {}: MISMATCH: source={} ({}), destination={} ({})",
                table,
                short_checksum(&result.source_checksum),
                result.source_row_count,
                short_checksum(&result.destination_checksum),
                result.destination_row_count
            );
            mismatches += 1;
        }
        results.push(result);
    }

    tracing::info!("========================================");
    tracing::info!("Verification Summary");
    tracing::info!("========================================");
    tracing::info!("Total tables: {}", tables.len());
    tracing::info!("✓ Matches: {}", tables.len() - mismatches);
    tracing::info!("✗ Mismatches: {}", mismatches);
    tracing::info!("========================================");

    if mismatches > 0 {
        tracing::error!("⚠ DATA INTEGRITY ISSUES DETECTED!");
        tracing::info!("Possible causes:");
        tracing::info!("  - A copy failed part way and the run was not repeated");
        tracing::info!("  - Data was modified in one of the databases after copying");
        bail!("{} table(s) failed verification", mismatches);
    }

    tracing::info!("✓ ALL TABLES VERIFIED SUCCESSFULLY!");
    Ok(results)
}

fn short_checksum(checksum: &str) -> &str {
    checksum.get(..8).unwrap_or(checksum)
}
