//! CLI argument definitions using clap
//!
//! Commands:
//! - contactd init --config <path>
//! - contactd start --config <path> [--port <port>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// contactd - contact form submission service
#[derive(Parser, Debug)]
#[command(name = "contactd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database and its schema, then exit
    Init {
        /// Path to configuration file (optional; defaults apply when absent)
        #[arg(long, default_value = "./contactd.json")]
        config: PathBuf,
    },

    /// Start the HTTP service
    Start {
        /// Path to configuration file (optional; defaults apply when absent)
        #[arg(long, default_value = "./contactd.json")]
        config: PathBuf,

        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
