//! Status subcommand

use crate::format::OutputFormat;
use clap::Args;

/// Arguments for the status subcommand
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
