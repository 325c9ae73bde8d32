//! CLI module for campusdb
//!
//! Provides command-line interface for:
//! - serve: open the catalog and serve HTTP
//! - query: one-shot query from stdin
//! - add / remove / list: catalog maintenance

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{add, list, load_records, query, remove, run, run_command, serve, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
