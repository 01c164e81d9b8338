//! Import subcommand
//!
//! Reads a `Contract;License;Key;Quantity;ExpiryDate;User` backup extract
//! and writes Contracts, Licenses and their associations to the store.

use crate::config::InputConfig;
use crate::format::OutputFormat;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the import subcommand
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Backup file to import (`.gz` files are decompressed)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Run the whole import and roll it back
    ///
    /// Every row is processed against the real store inside a transaction
    /// that is discarded at the end, so the report shows exactly what a
    /// real run would create.
    #[arg(long)]
    pub dry_run: bool,

    /// Field delimiter (overrides config)
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Treat the first line as a header and skip it
    #[arg(long)]
    pub skip_header: bool,

    /// Summary output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl ImportArgs {
    /// Input settings with this command's overrides applied.
    pub fn input_config(&self, base: &InputConfig) -> InputConfig {
        let mut input = base.clone();
        if let Some(delimiter) = self.delimiter {
            input.delimiter = delimiter;
        }
        if self.skip_header {
            input.has_header = true;
        }
        input
    }

    /// Describe the import mode for logging
    pub fn import_mode(&self) -> &'static str {
        if self.dry_run { "dry-run" } else { "write" }
    }
}
