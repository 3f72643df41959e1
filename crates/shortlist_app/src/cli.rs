use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Keep a local shortlist of saved job identifiers.
#[derive(Debug, Parser)]
#[command(name = "shortlist", version)]
pub struct Cli {
    /// RON configuration file. Defaults are used when it is missing.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted shortlist.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log debug output to the terminal.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print saved identifiers in the order they were saved.
    List,
    /// Save an identifier.
    Add { job_id: String },
    /// Unsave an identifier.
    Remove { job_id: String },
    /// Save or unsave an identifier; syncs it when server mode is on.
    Toggle { job_id: String },
    /// Exit with status 0 when the identifier is saved, 1 otherwise.
    Contains { job_id: String },
    /// Remove every saved identifier.
    Clear,
    /// Merge the server shortlist into the local one.
    Reconcile,
    /// Show storage location, count and server mode.
    Status,
}
