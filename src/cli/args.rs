//! CLI argument definitions using clap
//!
//! Commands:
//! - aeroquery indexes --info <path> [--namespace <ns>]
//! - aeroquery explain --info <path> --namespace <ns> --qualifiers <path>
//! - aeroquery query --info <path> --records <path> --namespace <ns> --qualifiers <path>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// aeroquery - index-aware queries over a distributed key/value store
#[derive(Parser, Debug)]
#[command(name = "aeroquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a saved `sindex-list` response and print the indexes as JSON
    Indexes {
        /// File holding the raw info response
        #[arg(long)]
        info: PathBuf,

        /// Only list indexes of this namespace
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Compile qualifiers and print the plan without running it
    Explain {
        #[command(flatten)]
        target: QueryTarget,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run qualifiers against records loaded from a JSON file
    Query {
        #[command(flatten)]
        target: QueryTarget,

        /// JSON array of records: {"namespace", "set", "key", "bins"}
        #[arg(long)]
        records: PathBuf,
    },
}

/// What to query and against which index list
#[derive(Args, Debug)]
pub struct QueryTarget {
    /// File holding the raw `sindex-list` response
    #[arg(long)]
    pub info: PathBuf,

    #[arg(long)]
    pub namespace: String,

    #[arg(long)]
    pub set: Option<String>,

    /// JSON array of qualifiers
    #[arg(long)]
    pub qualifiers: Option<PathBuf>,

    /// JSON index filter supplied by the caller; disables pushdown
    #[arg(long)]
    pub filter: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
