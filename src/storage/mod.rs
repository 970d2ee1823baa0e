//! Contact storage
//!
//! One SQLite table, one connection, one writer at a time.
//!
//! # Invariants
//!
//! - `id` and `created_at` are assigned by the database, never by callers
//! - Submissions are immutable; the only mutation is delete by `id`
//! - Schema bootstrap is create-if-absent, never destructive
//! - Listings are newest first (`created_at DESC`, ties broken by `id DESC`)

mod errors;
mod record;
mod store;

pub use errors::{StorageError, StorageResult};
pub use record::{
    ContactSubmission, NewContact, Page, PageRequest, Pagination, DEFAULT_PAGE_LIMIT,
    MAX_PAGE_LIMIT,
};
pub use store::ContactStore;
