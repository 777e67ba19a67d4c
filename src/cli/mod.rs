//! CLI module for aeroquery
//!
//! Provides command-line interface for:
//! - indexes: Parse and print a saved index list
//! - explain: Show how qualifiers would be executed
//! - query: Run qualifiers against records from a file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, QueryTarget};
pub use commands::{explain, indexes, query, run, run_command};
pub use errors::{CliError, CliResult};
