//! # HTTP Server Module
//!
//! JSON API for the contact service, served by axum.
//!
//! # Endpoints
//!
//! - `POST   /api/contacts`     - Submit a contact message (rate limited)
//! - `GET    /api/contacts`     - Paginated listing
//! - `GET    /api/contacts/:id` - Single submission
//! - `DELETE /api/contacts/:id` - Remove a submission
//! - `GET    /api/health`       - Liveness
//! - `GET    /api/metrics`      - Counters

pub mod config;
pub mod contact_routes;
pub mod errors;
pub mod observability_routes;
pub mod rate_limit;
pub mod response;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult};
pub use rate_limit::{Admission, AdmissionGate};
pub use server::{shutdown_signal, AppServices, HttpServer};
