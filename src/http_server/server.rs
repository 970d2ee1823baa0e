//! # HTTP Server
//!
//! Combines the contact and observability routers under `/api` and wraps
//! them in the shared middleware stack.

use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as CorsAny, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::RateLimitConfig;
use crate::notify::SharedNotifier;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::pipeline::{QueryService, SubmissionPipeline};
use crate::storage::ContactStore;

use super::config::HttpServerConfig;
use super::contact_routes::{contact_routes, ContactState};
use super::errors::ApiError;
use super::observability_routes::observability_routes;
use super::rate_limit::AdmissionGate;

pub const ROUTE_NOT_FOUND: &str = "Route not found.";

/// Long-lived resources the routes operate on
#[derive(Clone)]
pub struct AppServices {
    pub store: ContactStore,
    pub notifier: SharedNotifier,
    pub metrics: Arc<MetricsRegistry>,
    pub rate_limit: RateLimitConfig,
}

/// HTTP server for the contact service
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, services: AppServices) -> Self {
        let router = Self::build_router(&config, services);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, services: AppServices) -> Router {
        let AppServices {
            store,
            notifier,
            metrics,
            rate_limit,
        } = services;

        let contact_state = Arc::new(ContactState {
            submissions: SubmissionPipeline::new(store.clone(), notifier, Arc::clone(&metrics)),
            queries: QueryService::new(store, Arc::clone(&metrics)),
        });
        let gate = Arc::new(AdmissionGate::new(&rate_limit, Arc::clone(&metrics)));

        let api = Router::new()
            .merge(observability_routes(Arc::clone(&metrics)))
            .nest("/contacts", contact_routes(contact_state, gate));

        // Later layers wrap earlier ones: CORS sees every request first and
        // the panic catcher sits closest to the handlers.
        Router::new()
            .nest("/api", api)
            .fallback(route_not_found)
            .layer(middleware::from_fn(unsupported_method_as_not_found))
            .layer(DefaultBodyLimit::max(config.body_limit_bytes))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(metrics, count_server_errors))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_static("default-src 'self'"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("cross-origin-resource-policy"),
                HeaderValue::from_static("same-origin"),
            ))
            .layer(cors_layer(config))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn serve<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;
        let local = listener.local_addr()?;
        log_event_with_fields(Event::Serving, &[("addr", local.to_string().as_str())]);

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}

fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
    let origin = if config.cors_origins.is_empty() {
        AllowOrigin::from(CorsAny)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(CorsAny)
        .allow_headers(CorsAny)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound(ROUTE_NOT_FOUND.into())
}

/// A known path with an unrouted method is answered like an unknown route.
async fn unsupported_method_as_not_found(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return route_not_found().await.into_response();
    }
    response
}

async fn count_server_errors(
    State(metrics): State<Arc<MetricsRegistry>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if response.status().is_server_error() {
        metrics.increment_internal_errors();
    }
    response
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log_event_with_fields(Event::ShutdownStart, &[("reason", "signal")]);
}
