//! CLI argument definitions using clap
//!
//! Commands:
//! - campusdb serve --config <path>
//! - campusdb query --config <path>
//! - campusdb add --id <id> --kind <courses|rooms> --file <path> --config <path>
//! - campusdb remove --id <id> --config <path>
//! - campusdb list --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// campusdb - A strict, deterministic query engine for campus datasets
#[derive(Parser, Debug)]
#[command(name = "campusdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./campusdb.json")]
        config: PathBuf,
    },

    /// Read one query document from stdin, print the result and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./campusdb.json")]
        config: PathBuf,
    },

    /// Register a dataset from a file or a directory of course documents
    Add {
        /// Path to configuration file
        #[arg(long, default_value = "./campusdb.json")]
        config: PathBuf,

        /// Dataset id
        #[arg(long)]
        id: String,

        /// Dataset kind: courses or rooms
        #[arg(long)]
        kind: String,

        /// JSON array of rows, or a directory of per-course documents
        #[arg(long)]
        file: PathBuf,
    },

    /// Remove a dataset
    Remove {
        /// Path to configuration file
        #[arg(long, default_value = "./campusdb.json")]
        config: PathBuf,

        /// Dataset id
        #[arg(long)]
        id: String,
    },

    /// List registered datasets
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./campusdb.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "campusdb", "add", "--id", "courses", "--kind", "courses", "--file", "data/courses",
        ])
        .unwrap();
        match cli.command {
            Command::Add { id, kind, file, config } => {
                assert_eq!(id, "courses");
                assert_eq!(kind, "courses");
                assert_eq!(file, PathBuf::from("data/courses"));
                assert_eq!(config, PathBuf::from("./campusdb.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_add_requires_id() {
        assert!(Cli::try_parse_from(["campusdb", "add", "--kind", "rooms", "--file", "x"]).is_err());
    }
}
