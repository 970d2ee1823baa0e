//! Contact records and pagination types
//!
//! `ContactSubmission` is the only persistent entity. Its `id` and
//! `created_at` are assigned by the store and never by callers, which is
//! why inserts take a separate `NewContact`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size for listings
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size a listing may request
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A persisted contact-form submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    /// Autoincrement key, never reused
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    /// Origin address of the submitter, informational only
    pub ip_address: Option<String>,
    /// Insert time as recorded by the database
    pub created_at: DateTime<Utc>,
}

/// Fields a caller supplies when inserting a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
    pub ip_address: Option<String>,
}

/// A page window over the listing.
///
/// Construction clamps `page >= 1` and `limit` into `[1, MAX_PAGE_LIMIT]`,
/// so the store never sees an out-of-range window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

/// Pagination metadata returned with every listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    /// Row count of the whole table, independent of the window
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let limit = u64::from(request.limit());
        Self {
            page: request.page(),
            limit: request.limit(),
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// One page of submissions, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<ContactSubmission>,
    pub pagination: Pagination,
}
