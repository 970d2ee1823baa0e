//! Admission gate for new submissions
//!
//! Fixed-window counter per client address. A client may create at most
//! `max_requests` submissions per window; the next one is answered 429
//! before the body is even parsed.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::RateLimitConfig;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

use super::errors::ApiError;

/// Body text of a 429 response
pub const TOO_MANY_SUBMISSIONS: &str = "Too many submissions. Please try again later.";

/// Tracked clients before expired windows are swept
const SWEEP_THRESHOLD: usize = 10_000;

/// Key used when the peer address is unknown
const UNKNOWN_CLIENT: &str = "unknown";

/// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { remaining: u32, reset_after: Duration },
    Rejected { retry_after: Duration },
}

/// Per-client fixed-window request counter
pub struct AdmissionGate {
    window: Duration,
    max_requests: u32,
    /// client -> (count, window start)
    clients: Mutex<HashMap<String, (u32, Instant)>>,
    metrics: Arc<MetricsRegistry>,
}

impl AdmissionGate {
    pub fn new(config: &RateLimitConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            window: Duration::from_millis(config.window_ms),
            max_requests: config.max_requests,
            clients: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count one request from `client` against its current window
    pub fn check(&self, client: &str) -> Admission {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Admission {
        // A poisoned map still holds valid counters.
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if clients.len() > SWEEP_THRESHOLD {
            let window = self.window;
            clients.retain(|_, (_, start)| now.saturating_duration_since(*start) < window);
        }

        let entry = clients.entry(client.to_string()).or_insert((0, now));

        // Reset if in new window
        if now.saturating_duration_since(entry.1) >= self.window {
            *entry = (0, now);
        }

        let reset_after = self
            .window
            .saturating_sub(now.saturating_duration_since(entry.1));

        if entry.0 >= self.max_requests {
            return Admission::Rejected {
                retry_after: reset_after,
            };
        }

        entry.0 += 1;
        Admission::Admitted {
            remaining: self.max_requests - entry.0,
            reset_after,
        }
    }
}

/// Middleware guarding submission creation
pub async fn admission_gate(
    State(gate): State<Arc<AdmissionGate>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client = connect
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    match gate.check(&client) {
        Admission::Admitted {
            remaining,
            reset_after,
        } => {
            let mut response = next.run(request).await;
            set_rate_headers(&mut response, gate.max_requests(), remaining, reset_after);
            response
        }
        Admission::Rejected { retry_after } => {
            gate.metrics.increment_admission_rejections();
            log_event_with_fields(Event::AdmissionRejected, &[("client", client.as_str())]);

            let mut response = ApiError::TooManyRequests(TOO_MANY_SUBMISSIONS.into()).into_response();
            set_rate_headers(&mut response, gate.max_requests(), 0, retry_after);
            response.headers_mut().insert(
                axum::http::header::RETRY_AFTER,
                HeaderValue::from(whole_seconds(retry_after)),
            );
            response
        }
    }
}

fn set_rate_headers(response: &mut Response, limit: u32, remaining: u32, reset_after: Duration) {
    let headers = response.headers_mut();
    headers.insert(HeaderName::from_static("ratelimit-limit"), HeaderValue::from(limit));
    headers.insert(HeaderName::from_static("ratelimit-remaining"), HeaderValue::from(remaining));
    headers.insert(
        HeaderName::from_static("ratelimit-reset"),
        HeaderValue::from(whole_seconds(reset_after)),
    );
}

/// Seconds, rounded up
fn whole_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
