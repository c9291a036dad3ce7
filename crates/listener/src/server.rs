//! Router construction and serving.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response tracing
//! 3. Timeout enforcement (publish budget plus a fixed margin)
//! 4. Handler execution

use std::future::Future;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::{handlers, AppState};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builds the router for `state`.
///
/// A provider route exists only when that provider's credential is configured;
/// requests to an unconfigured provider get 404.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new().route("/health", get(handlers::health));

    if state.gitlab.is_some() {
        router = router.route("/webhooks/gitlab", post(handlers::gitlab_webhook));
    }
    if state.github.is_some() {
        router = router.route("/webhooks/github", post(handlers::github_webhook));
    }

    router
        .layer(TimeoutLayer::new(state.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Adds an `X-Request-Id` header to every response.
///
/// A caller-supplied id is echoed back; otherwise a UUID v4 is generated.
async fn inject_request_id(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Serves `router` on `listener` until `shutdown` resolves, then lets
/// in-flight requests finish.
///
/// # Errors
///
/// Returns `std::io::Error` if the listener fails.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = ?listener.local_addr().ok(), "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}
