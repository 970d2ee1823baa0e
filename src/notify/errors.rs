//! Notification errors
//!
//! These never reach an HTTP response. The submission pipeline logs them
//! and moves on.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for notification delivery
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Admin notification failures
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A configured or submitted address is not a valid mailbox
    #[error("Invalid address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// The message could not be assembled
    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    /// SMTP relay setup, connection, auth or send failure
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Writing to the sandbox outbox failed
    #[error("Sandbox outbox error: {0}")]
    Outbox(#[from] lettre::transport::file::Error),

    /// The sandbox outbox directory could not be created
    #[error("Failed to create outbox {path}: {source}")]
    OutboxDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The notifier refused the message (test and disabled notifiers)
    #[error("Notification rejected: {0}")]
    Rejected(String),
}
