//! CLI-specific error types
//!
//! Every CLI error is fatal: main prints it and exits non-zero.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::notify::NotifyError;
use crate::storage::StorageError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or environment error
    ConfigError,
    /// Database could not be opened or closed
    StoreError,
    /// Mail transport could not be built
    MailError,
    /// Runtime or listener failure
    BootFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CONTACTD_CONFIG_ERROR",
            Self::StoreError => "CONTACTD_STORE_ERROR",
            Self::MailError => "CONTACTD_MAIL_ERROR",
            Self::BootFailed => "CONTACTD_BOOT_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug, Error)]
#[error("{}: {message}", code.code())]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(CliErrorCode::ConfigError, e.to_string())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        Self::new(CliErrorCode::StoreError, e.to_string())
    }
}

impl From<NotifyError> for CliError {
    fn from(e: NotifyError) -> Self {
        Self::new(CliErrorCode::MailError, e.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::boot_failed(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
