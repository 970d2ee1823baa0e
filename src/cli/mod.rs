//! CLI module for contactd
//!
//! Provides command-line interface for:
//! - init: Create the database file and schema
//! - start: Boot the service and serve HTTP until signalled

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, run, run_command, start};
pub use errors::{CliError, CliErrorCode, CliResult};
