//! Command-line interface and orchestration for repo-stats
//!
//! This module implements the CLI commands and wires the forge provider, the metrics engine,
//! and the report generators together.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **report**: Fetch (or load from cache) the issues and releases of one repository, build
//!   every chart over the full history, slice them to the requested period, and write the
//!   console, JSON, and CSV reports
//! - **init**: Generate a default configuration file
//! - **validate**: Check a configuration file for syntax and out-of-range values
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. All output goes through a [`Host`] so the commands can be
//! exercised in tests without touching the real terminal.
//!
//! Configuration is a TOML file (`repo-stats.toml`) holding the API endpoint, the cache TTL,
//! the maintainer allow-list, and the quantile targets of the charts.

mod config;
mod host;
mod init;
mod report;
mod run;
mod validate;

pub use config::{CONFIG_FILE_NAME, Config, DEFAULT_CONFIG_TOML};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use report::{ColorMode, LogLevel, ReportArgs, process_report};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
