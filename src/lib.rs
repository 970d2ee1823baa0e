//! contactd - contact form submission service
//!
//! Accepts contact form submissions over HTTP, validates and stores them in
//! SQLite, and notifies an administrator by email without holding up the
//! response.

pub mod cli;
pub mod config;
pub mod http_server;
pub mod notify;
pub mod observability;
pub mod pipeline;
pub mod storage;
pub mod validation;
