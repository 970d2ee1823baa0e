//! CLI command implementations
//!
//! Startup sequence for `start`:
//! 1. Configuration load (file, then environment, then validation)
//! 2. Store open (directory, WAL mode, schema)
//! 3. Mail transport selection
//! 4. HTTP serving until Ctrl-C / SIGTERM
//! 5. Store close

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::config::AppConfig;
use crate::http_server::{shutdown_signal, AppServices, HttpServer};
use crate::notify::MailNotifier;
use crate::observability::{log_event, log_event_with_fields, Event, MetricsRegistry};
use crate::storage::ContactStore;

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Start { config, port } => start(&config, port),
    }
}

/// Create the database file and schema without serving.
///
/// Safe to run against an existing database: the schema is only created
/// where missing and no rows are touched.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let existing = store_count(&store)?;
    store.close()?;

    println!(
        "{}",
        json!({
            "initialized": true,
            "database": config.database.path.display().to_string(),
            "contacts": existing,
        })
    );
    Ok(())
}

/// Boot the service and serve until signalled
pub fn start(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart);

    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    let store = open_store(&config)?;
    let notifier = Arc::new(MailNotifier::from_config(&config.mail)?);

    let services = AppServices {
        store: store.clone(),
        notifier,
        metrics: Arc::new(MetricsRegistry::new()),
        rate_limit: config.rate_limit.clone(),
    };

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    let served = rt.block_on(async {
        let server = HttpServer::new(config.http.clone(), services);
        server.serve(shutdown_signal()).await
    });

    // Release the database whether or not serving ended cleanly.
    store.close()?;
    served.map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))?;

    log_event(Event::ShutdownComplete);
    Ok(())
}

fn load_config(config_path: &Path) -> CliResult<AppConfig> {
    let config = AppConfig::load(Some(config_path))?;
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("config", config_path.display().to_string().as_str()),
            ("file_present", if config_path.exists() { "true" } else { "false" }),
        ],
    );
    Ok(config)
}

fn open_store(config: &AppConfig) -> CliResult<ContactStore> {
    let store = ContactStore::open(&config.database.path)?;
    log_event_with_fields(
        Event::StoreOpened,
        &[("path", config.database.path.display().to_string().as_str())],
    );
    Ok(store)
}

fn store_count(store: &ContactStore) -> CliResult<u64> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;
    Ok(rt.block_on(store.count())?)
}
