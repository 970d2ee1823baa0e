//! Service configuration
//!
//! Loaded once at startup: JSON file (optional) → environment overrides →
//! validation. Every field has a default so an empty `{}` file, or no file
//! at all, yields a runnable development setup.

use std::fs;
use std::path::{Path, PathBuf};

use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub mail: MailConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Contact store location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file (default: "./data/contacts.db")
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/contacts.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Admin notification settings
///
/// An empty `smtp_user` selects the sandbox outbox instead of SMTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Implicit TLS (usually port 465). STARTTLS otherwise.
    #[serde(default)]
    pub smtp_secure: bool,

    #[serde(default)]
    pub smtp_user: String,

    #[serde(default)]
    pub smtp_password: String,

    #[serde(default = "default_from")]
    pub from: String,

    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    /// Where sandbox messages are written (default: "./data/outbox")
    #[serde(default = "default_sandbox_dir")]
    pub sandbox_dir: PathBuf,
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from() -> String {
    "noreply@contactform.local".to_string()
}

fn default_admin_email() -> String {
    "admin@contactform.local".to_string()
}

fn default_sandbox_dir() -> PathBuf {
    PathBuf::from("./data/outbox")
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_secure: false,
            smtp_user: String::new(),
            smtp_password: String::new(),
            from: default_from(),
            admin_email: default_admin_email(),
            sandbox_dir: default_sandbox_dir(),
        }
    }
}

/// Admission gate for `POST /api/contacts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Window length in milliseconds (default: 15 minutes)
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Submissions allowed per client per window (default: 10)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
}

fn default_window_ms() -> u64 {
    15 * 60 * 1000
}

fn default_max_requests() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
        }
    }
}

impl AppConfig {
    /// Load from an optional file, apply process environment, validate.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Override fields from environment variables.
    ///
    /// `lookup` is injected so tests don't touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("HOST") {
            self.http.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.http.port = parse_env("PORT", v)?;
        }
        if let Some(v) = lookup("CORS_ORIGIN") {
            // "*" means any origin, which the server expresses as an empty list
            self.http.cors_origins = if v.trim() == "*" {
                Vec::new()
            } else {
                v.split(',').map(|s| s.trim().to_string()).collect()
            };
        }
        if let Some(v) = lookup("DB_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SMTP_HOST") {
            self.mail.smtp_host = v;
        }
        if let Some(v) = lookup("SMTP_PORT") {
            self.mail.smtp_port = parse_env("SMTP_PORT", v)?;
        }
        if let Some(v) = lookup("SMTP_SECURE") {
            self.mail.smtp_secure = v == "true";
        }
        if let Some(v) = lookup("SMTP_USER") {
            self.mail.smtp_user = v;
        }
        if let Some(v) = lookup("SMTP_PASS") {
            self.mail.smtp_password = v;
        }
        if let Some(v) = lookup("MAIL_FROM") {
            self.mail.from = v;
        }
        if let Some(v) = lookup("ADMIN_EMAIL") {
            self.mail.admin_email = v;
        }
        if let Some(v) = lookup("RATE_LIMIT_WINDOW_MS") {
            self.rate_limit.window_ms = parse_env("RATE_LIMIT_WINDOW_MS", v)?;
        }
        if let Some(v) = lookup("RATE_LIMIT_MAX") {
            self.rate_limit.max_requests = parse_env("RATE_LIMIT_MAX", v)?;
        }
        Ok(())
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.http.port == 0 {
            return Err(ConfigError::Invalid("http.port must be > 0".into()));
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }
        if self.rate_limit.window_ms == 0 {
            return Err(ConfigError::Invalid("rate_limit.window_ms must be > 0".into()));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Invalid("rate_limit.max_requests must be > 0".into()));
        }
        for (key, value) in [("mail.from", &self.mail.from), ("mail.admin_email", &self.mail.admin_email)] {
            value
                .parse::<Mailbox>()
                .map_err(|e| ConfigError::Invalid(format!("{} '{}': {}", key, value, e)))?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
