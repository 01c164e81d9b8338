//! license-import
//!
//! Imports Contracts, Licenses, keys and license users from a legacy
//! asset-management backup extract into a CMDB database.

use anyhow::{Context, Result};
use clap::Parser;
use license_import::cli::import::ImportArgs;
use license_import::cli::status::StatusArgs;
use license_import::cli::{Cli, Command};
use license_import::config::{Config, ConfigLoader, ConfigPaths};
use license_import::db::Database;
use license_import::format::{self, OutputFormat};
use license_import::import::{self, ImportSummary};
use license_import::logging::{self, LogTarget};
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut paths = ConfigPaths::discover();
    if let Some(config_path) = &cli.config {
        paths = paths.with_explicit(config_path);
    }
    let mut loader = ConfigLoader::load_with_paths(paths)?;

    // Override paths from CLI arguments
    if let Some(db_path) = &cli.database {
        loader.config_mut().store.db_path = db_path.into();
    }
    let config = loader.into_config();

    match cli.command {
        Command::Import(args) => run_import(&config, args),
        Command::Status(args) => run_status(&config, args),
    }
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.store.db_path)
        .with_context(|| format!("failed to open {}", config.store.db_path.display()))?;
    Ok(db.with_settings(config.cmdb.clone()))
}

/// Run the import command
fn run_import(config: &Config, args: ImportArgs) -> Result<()> {
    let db = open_database(config)?;
    let input = args.input_config(&config.input);

    info!(
        file = %args.file.display(),
        database = %config.store.db_path.display(),
        mode = args.import_mode(),
        "Starting import"
    );

    let summary: ImportSummary = if args.dry_run {
        let mut summary =
            db.with_rollback(|db| import::import_file(db, &input, &args.file))?;
        summary.dry_run = true;
        summary
    } else {
        import::import_file(&db, &input, &args.file)?
    };

    match args.format {
        OutputFormat::Text => print!("{}", format::format_summary_text(&summary)),
        OutputFormat::Json => println!("{}", format::to_json(&summary)?),
    }

    Ok(())
}

/// Run the status command
fn run_status(config: &Config, args: StatusArgs) -> Result<()> {
    let db = open_database(config)?;
    let stats = db.get_stats()?;

    match args.format {
        OutputFormat::Text => print!("{}", format::format_stats_text(&stats)),
        OutputFormat::Json => println!("{}", format::to_json(&stats)?),
    }

    Ok(())
}
