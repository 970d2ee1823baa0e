//! Submission pipeline and query service
//!
//! The two request-facing services. Both hold the same [`ContactStore`]
//! handle, created once at startup.
//!
//! [`ContactStore`]: crate::storage::ContactStore

mod errors;
mod query;
mod submission;

pub use errors::{PipelineError, PipelineResult};
pub use query::{ListQuery, QueryService};
pub use submission::SubmissionPipeline;
