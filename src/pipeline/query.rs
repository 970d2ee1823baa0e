//! Listing, lookup and deletion of submissions
//!
//! Query parameters arrive as raw strings. Missing, unparsable or zero
//! values fall back to the defaults, then the window is clamped, so a
//! listing request never fails on its parameters.

use std::sync::Arc;

use serde::Deserialize;

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::storage::{ContactStore, ContactSubmission, Page, PageRequest, DEFAULT_PAGE_LIMIT};

use super::errors::{PipelineError, PipelineResult};

/// `?page=&limit=` as received
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    /// Resolve to a clamped page window
    pub fn page_request(&self) -> PageRequest {
        let page = parse_or_default(self.page.as_deref(), 1);
        let limit = parse_or_default(self.limit.as_deref(), i64::from(DEFAULT_PAGE_LIMIT));
        PageRequest::new(to_u32(page), to_u32(limit))
    }
}

/// Leading integer of `raw`, or `default` when absent, unparsable or zero
fn parse_or_default(raw: Option<&str>, default: i64) -> i64 {
    match raw.and_then(leading_int) {
        Some(0) | None => default,
        Some(n) => n,
    }
}

/// `"12abc"` → 12, `"-3"` → -3, `"abc"` → None. Digit runs too long
/// for an i64 saturate.
fn leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Only overflow can fail here: the run is non-empty ASCII digits.
    let n = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(n * sign)
}

fn to_u32(n: i64) -> u32 {
    u32::try_from(n.max(0)).unwrap_or(u32::MAX)
}

/// Parse a path id. Anything unparsable names no submission.
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Read/delete access to stored submissions
#[derive(Clone)]
pub struct QueryService {
    store: ContactStore,
    metrics: Arc<MetricsRegistry>,
}

impl QueryService {
    pub fn new(store: ContactStore, metrics: Arc<MetricsRegistry>) -> Self {
        Self { store, metrics }
    }

    /// One page of submissions, newest first
    pub async fn list(&self, query: &ListQuery) -> PipelineResult<Page> {
        Ok(self.store.find_all(query.page_request()).await?)
    }

    pub async fn get(&self, id: &str) -> PipelineResult<ContactSubmission> {
        let id = parse_id(id).ok_or(PipelineError::NotFound)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or(PipelineError::NotFound)
    }

    pub async fn delete(&self, id: &str) -> PipelineResult<()> {
        let id = parse_id(id).ok_or(PipelineError::NotFound)?;
        if !self.store.delete_by_id(id).await? {
            return Err(PipelineError::NotFound);
        }

        self.metrics.increment_contacts_deleted();
        log_event_with_fields(Event::ContactDeleted, &[("id", id.to_string().as_str())]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewContact;

    fn query(page: Option<&str>, limit: Option<&str>) -> ListQuery {
        ListQuery {
            page: page.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn test_defaults() {
        let req = ListQuery::default().page_request();
        assert_eq!((req.page(), req.limit()), (1, 20));
    }

    #[test]
    fn test_zero_and_garbage_fall_back_to_defaults() {
        let req = query(Some("0"), Some("0")).page_request();
        assert_eq!((req.page(), req.limit()), (1, 20));

        let req = query(Some("abc"), Some("")).page_request();
        assert_eq!((req.page(), req.limit()), (1, 20));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let req = query(Some("-4"), Some("-5")).page_request();
        assert_eq!((req.page(), req.limit()), (1, 1));

        let req = query(Some("7"), Some("1000")).page_request();
        assert_eq!((req.page(), req.limit()), (7, 100));
    }

    #[test]
    fn test_leading_integer_is_used() {
        assert_eq!(leading_int("12abc"), Some(12));
        assert_eq!(leading_int(" 3"), Some(3));
        assert_eq!(leading_int("2.5"), Some(2));
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int("x1"), None);
    }

    #[test]
    fn test_oversized_page_saturates() {
        let req = query(Some("99999999999999999999"), Some("10")).page_request();
        assert_eq!((req.page(), req.limit()), (u32::MAX, 10));
        assert_eq!(req.offset(), u64::from(u32::MAX - 1) * 10);

        let req = query(Some("-99999999999999999999"), None).page_request();
        assert_eq!(req.page(), 1);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let service = QueryService::new(
            ContactStore::open_in_memory().unwrap(),
            Arc::new(MetricsRegistry::new()),
        );

        assert!(matches!(service.get("abc").await, Err(PipelineError::NotFound)));
        assert!(matches!(service.delete("1; DROP TABLE").await, Err(PipelineError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let store = ContactStore::open_in_memory().unwrap();
        let metrics = Arc::new(MetricsRegistry::new());
        let service = QueryService::new(store.clone(), Arc::clone(&metrics));

        let record = store
            .create(NewContact {
                name: "Jo".into(),
                email: "jo@example.com".into(),
                message: "A message long enough".into(),
                ip_address: None,
            })
            .await
            .unwrap();
        let id = record.id.to_string();

        assert_eq!(service.get(&id).await.unwrap(), record);
        service.delete(&id).await.unwrap();
        assert!(matches!(service.get(&id).await, Err(PipelineError::NotFound)));
        assert!(matches!(service.delete(&id).await, Err(PipelineError::NotFound)));
        assert_eq!(metrics.snapshot().contacts_deleted, 1);
    }
}
