//! CLI argument definitions.

use clap::Parser;

use crate::commands::Commands;

/// Browse and tag Scope of Morgellons slide stores.
#[derive(Parser, Debug)]
#[command(name = "micrarium")]
#[command(author, version = env!("MICRARIUM_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Slide store URL (file:// or https://), overriding the saved config
    #[arg(long, global = true)]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
