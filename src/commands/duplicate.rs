// ABOUTME: Duplication command that builds a fresh destination and copies every table
// ABOUTME: Opens both stores, creates the schema, then copies tables in configured order

use crate::commands::verify::verify_stores;
use crate::config::DuplicatorConfig;
use crate::migration::{self, CopyOptions};
use crate::sqlite;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;

/// Rows copied into one destination table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCopyReport {
    pub table: String,
    pub rows_copied: usize,
}

/// Duplicate the source database into a freshly created destination
///
/// Performs the run in steps:
/// 1. Opens the source (read-only) and destination (created if missing)
/// 2. Creates the catalog schema in the destination
/// 3. Copies each configured table in order, printing one line per table
/// 4. Optionally verifies every table by checksum
///
/// Stops at the first failing table. Tables copied before the failure stay
/// committed; the failing table itself is rolled back.
///
/// # Errors
///
/// This function will return an error if:
/// - The configuration is invalid
/// - Either database cannot be opened
/// - The destination already contains the catalog tables
/// - Any table copy fails (missing table, schema mismatch, constraint violation)
/// - Verification finds a mismatch
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use commodity_db_duplicator::commands::duplicate;
/// # use commodity_db_duplicator::config::DuplicatorConfig;
/// # fn example() -> Result<()> {
/// let reports = duplicate(&DuplicatorConfig::default())?;
/// for report in reports {
///     println!("{}: {}", report.table, report.rows_copied);
/// }
/// # Ok(())
/// # }
/// ```
pub fn duplicate(config: &DuplicatorConfig) -> Result<Vec<TableCopyReport>> {
    config.validate()?;
    tracing::info!("Starting database duplication...");

    tracing::info!("Step 1/3: Opening databases...");
    let source = sqlite::open_source(&config.source).context("Failed to open source database")?;
    let mut destination = sqlite::open_destination(&config.destination, config.enforce_foreign_keys)
        .context("Failed to open destination database")?;
    tracing::info!("✓ Opened {}", config.source.display());
    tracing::info!("✓ Opened {}", config.destination.display());

    tracing::info!("Step 2/3: Creating schema in destination...");
    migration::initialize_schema(&destination).with_context(|| {
        format!(
            "Failed to create schema in '{}' (does it already contain the tables?)",
            config.destination.display()
        )
    })?;

    tracing::info!("Step 3/3: Copying {} table(s)...", config.tables.len());
    let reports = copy_tables(
        &source,
        &mut destination,
        &config.tables,
        &config.copy_options(),
        true,
    )?;

    if config.verify {
        verify_stores(&source, &destination, &config.tables)?;
    }

    let total: usize = reports.iter().map(|r| r.rows_copied).sum();
    tracing::info!(
        "✅ Duplication complete: {} row(s) across {} table(s)",
        total,
        reports.len()
    );

    Ok(reports)
}

/// Create the schema in `destination` and copy `tables` into it from `source`
///
/// Same as [`duplicate`] but on caller-owned connections, e.g. in-memory stores.
pub fn duplicate_stores(
    source: &Connection,
    destination: &mut Connection,
    tables: &[String],
    options: &CopyOptions,
) -> Result<Vec<TableCopyReport>> {
    migration::initialize_schema(destination).context("Failed to create destination schema")?;
    copy_tables(source, destination, tables, options, false)
}

fn copy_tables(
    source: &Connection,
    destination: &mut Connection,
    tables: &[String],
    options: &CopyOptions,
    show_progress: bool,
) -> Result<Vec<TableCopyReport>> {
    let mut reports = Vec::with_capacity(tables.len());

    for (idx, table) in tables.iter().enumerate() {
        tracing::info!("Copying table {}/{}: '{}'", idx + 1, tables.len(), table);

        let progress = if show_progress {
            table_progress_bar(table)
        } else {
            ProgressBar::hidden()
        };

        let rows_copied = copy_with_progress(source, destination, table, options, &progress)?;

        println!("Copied {} rows to table {}", rows_copied, table);
        tracing::info!("✓ Table '{}' copied ({} rows)", table, rows_copied);

        reports.push(TableCopyReport {
            table: table.clone(),
            rows_copied,
        });
    }

    Ok(reports)
}

/// Copy one table, clearing `progress` whether or not the copy succeeds
fn copy_with_progress(
    source: &Connection,
    destination: &mut Connection,
    table: &str,
    options: &CopyOptions,
    progress: &ProgressBar,
) -> Result<usize> {
    let copied = migration::copy_table_with_progress(source, destination, table, options, progress);
    progress.finish_and_clear();
    copied.with_context(|| format!("Failed to copy table '{}'", table))
}

fn table_progress_bar(table: &str) -> ProgressBar {
    let progress = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        progress.set_style(style.progress_chars("##-"));
    }
    progress.set_message(table.to_string());
    progress
}
