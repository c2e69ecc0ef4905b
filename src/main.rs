// ABOUTME: CLI entry point for commodity-db-duplicator
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Args, Parser, Subcommand};
use commodity_db_duplicator::commands;
use commodity_db_duplicator::config::{self, DuplicatorConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "commodity-db-duplicator")]
#[command(about = "Copy the commodity catalog into a freshly created SQLite database", long_about = None)]
#[command(version)]
struct Cli {
    /// Defaults to `copy` with the built-in paths and table order
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
struct StoreArgs {
    /// Source database file (default: db000.sqlite)
    #[arg(long)]
    source: Option<PathBuf>,
    /// Destination database file (default: db111.sqlite)
    #[arg(long)]
    target: Option<PathBuf>,
    /// Tables to process, in order (comma-separated)
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,
    /// Path to a TOML file with duplicator settings
    #[arg(long = "config")]
    config_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the destination schema and copy every table into it
    Copy {
        #[command(flatten)]
        stores: StoreArgs,
        /// Enforce foreign keys in the destination while copying
        #[arg(long)]
        foreign_keys: bool,
        /// Fail when a source table has no rows
        #[arg(long)]
        fail_on_empty: bool,
        /// Compare table checksums after copying
        #[arg(long)]
        verify: bool,
    },
    /// Compare table checksums between source and destination
    Verify {
        #[command(flatten)]
        stores: StoreArgs,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => {
            commands::duplicate(&DuplicatorConfig::default())?;
            Ok(())
        }
        Some(Commands::Copy {
            stores,
            foreign_keys,
            fail_on_empty,
            verify,
        }) => {
            let mut config = build_config(&stores)?;
            // Flags only switch options on; a config file can still enable them
            config.enforce_foreign_keys |= foreign_keys;
            config.fail_on_empty_table |= fail_on_empty;
            config.verify |= verify;
            commands::duplicate(&config)?;
            Ok(())
        }
        Some(Commands::Verify { stores }) => {
            let config = build_config(&stores)?;
            commands::verify(&config)?;
            Ok(())
        }
    }
}

fn build_config(args: &StoreArgs) -> anyhow::Result<DuplicatorConfig> {
    let mut config = match &args.config_path {
        Some(path) => config::load_config_from_file(path)?,
        None => DuplicatorConfig::default(),
    };
    if let Some(source) = &args.source {
        config.source = source.clone();
    }
    if let Some(target) = &args.target {
        config.destination = target.clone();
    }
    if let Some(tables) = &args.tables {
        config.tables = tables.clone();
    }
    Ok(config)
}
