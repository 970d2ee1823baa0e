//! Counters for the submission pipeline
//!
//! - Counters only, monotonic, reset on process start
//! - Relaxed atomics, no locks

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters shared by the pipeline and the HTTP layer.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    contacts_created: AtomicU64,
    contacts_deleted: AtomicU64,
    validation_failures: AtomicU64,
    admission_rejections: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_failed: AtomicU64,
    internal_errors: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_contacts_created(&self) {
        self.contacts_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_contacts_deleted(&self) {
        self.contacts_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_validation_failures(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_admission_rejections(&self) {
        self.admission_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_notifications_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_notifications_failed(&self) {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_internal_errors(&self) {
        self.internal_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            contacts_created: self.contacts_created.load(Ordering::Relaxed),
            contacts_deleted: self.contacts_deleted.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            admission_rejections: self.admission_rejections.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notifications_failed: self.notifications_failed.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
        }
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub contacts_created: u64,
    pub contacts_deleted: u64,
    pub validation_failures: u64,
    pub admission_rejections: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
    pub internal_errors: u64,
}
