//! CLI command implementations
//!
//! Every command loads the configuration first, then opens the catalog
//! under `data_dir`. Boot failures are fatal.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::catalog::Catalog;
use crate::dataset::{records_from_json, sections_from_course_dir, DatasetKind, Record};
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::{log_event, log_event_with_fields, Event, Logger, Severity};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    #[serde(default)]
    pub http: HttpServerConfig,

    /// Minimum log severity (default "INFO")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Config {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.http.port == 0 {
            return Err(CliError::config_error("http.port must be > 0"));
        }

        self.log_severity()?;

        Ok(())
    }

    pub fn log_severity(&self) -> CliResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of TRACE, INFO, WARN, ERROR, FATAL.",
                self.log_level
            ))
        })
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config } => serve(&config),
        Command::Query { config } => query(&config),
        Command::Add {
            config,
            id,
            kind,
            file,
        } => add(&config, &id, &kind, &file),
        Command::Remove { config, id } => remove(&config, &id),
        Command::List { config } => list(&config),
    }
}

/// Loads the config, applies its log level and opens the catalog.
///
/// `quiet` raises the log floor to ERROR so stdout carries only the response.
fn boot(config_path: &Path, quiet: bool) -> CliResult<(Config, Catalog)> {
    let config = Config::load(config_path)?;
    let severity = if quiet {
        Severity::Error
    } else {
        config.log_severity()?
    };
    Logger::set_min_severity(severity);

    log_event(Event::BootStart);
    log_event_with_fields(Event::ConfigLoaded, &[("data_dir", config.data_dir.as_str())]);

    let catalog = Catalog::open(config.data_path())
        .map_err(|e| CliError::boot_failed(format!("Failed to open catalog: {}", e)))?;

    log_event(Event::BootComplete);
    Ok((config, catalog))
}

/// Start the HTTP server and serve until it fails
pub fn serve(config_path: &Path) -> CliResult<()> {
    let (config, catalog) = boot(config_path, false)?;
    let server = HttpServer::new(config.http.clone(), Arc::new(catalog));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Execute a single query read from stdin and exit
pub fn query(config_path: &Path) -> CliResult<()> {
    let (_config, catalog) = boot(config_path, true)?;
    let raw = read_request()?;
    answer(&catalog, &raw)
}

fn answer(catalog: &Catalog, raw: &Value) -> CliResult<()> {
    match catalog.query(raw) {
        Ok(output) => write_response(output.rows_json()),
        Err(e) => write_error(e.code().code(), e.message()),
    }
}

/// Register a dataset from a rows file or a directory of course documents
pub fn add(config_path: &Path, id: &str, kind: &str, file: &Path) -> CliResult<()> {
    let kind = DatasetKind::parse(kind).ok_or_else(|| {
        CliError::invalid_input(format!("Invalid kind '{}': expected courses or rooms", kind))
    })?;
    let records = load_records(kind, file)?;

    let (_config, catalog) = boot(config_path, true)?;
    let ids = catalog.add_dataset(id, kind, records)?;
    write_response(json!(ids))
}

/// Reads the records for `add`.
///
/// A directory is read as per-course documents and only makes sense for
/// section datasets.
pub fn load_records(kind: DatasetKind, file: &Path) -> CliResult<Vec<Record>> {
    if file.is_dir() {
        if kind != DatasetKind::Sections {
            return Err(CliError::invalid_input(format!(
                "{} is a directory; only courses datasets can be read from course documents",
                file.display()
            )));
        }
        let sections = sections_from_course_dir(file).map_err(|e| {
            CliError::io_error(format!("Failed to read {}: {}", file.display(), e))
        })?;
        return Ok(sections.into_iter().map(Record::from).collect());
    }

    let content = fs::read_to_string(file)
        .map_err(|e| CliError::io_error(format!("Failed to read {}: {}", file.display(), e)))?;
    let rows: Value = serde_json::from_str(&content)?;
    Ok(records_from_json(kind, rows)?)
}

pub fn remove(config_path: &Path, id: &str) -> CliResult<()> {
    let (_config, catalog) = boot(config_path, true)?;
    let removed = catalog.remove_dataset(id)?;
    write_response(json!(removed))
}

pub fn list(config_path: &Path) -> CliResult<()> {
    let (_config, catalog) = boot(config_path, true)?;
    write_response(serde_json::to_value(catalog.list_datasets())?)
}
