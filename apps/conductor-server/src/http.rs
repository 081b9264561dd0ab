//! HTTP host: middleware stack around the module routers, and the server loop.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderName, StatusCode};
use axum::middleware::{Next, from_fn, from_fn_with_state};
use axum::response::Response;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

use crate::auth::{self, AuthState};
use crate::config::ServerConfig;

pub const HEALTH_PATH: &str = "/healthz";

fn request_id_header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

/// Wrap `api` with health check, authentication and the request pipeline.
///
/// Layers run outermost first: request id, trace, timeout, body limit, authn.
pub fn build_router(cfg: &ServerConfig, api: Router, auth_state: AuthState) -> Router {
    let mut router = api.route(HEALTH_PATH, get(|| async { "ok" }));

    // 5) Authentication
    router = router.layer(from_fn_with_state(auth_state, auth::authn_middleware));

    // 4) Body limit
    router = router.layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));
    router = router.layer(DefaultBodyLimit::max(cfg.body_limit_bytes));

    // 3) Timeout
    router = router.layer(TimeoutLayer::with_status_code(
        StatusCode::GATEWAY_TIMEOUT,
        Duration::from_secs(cfg.request_timeout_secs),
    ));

    // 2) Record request_id into the span (inner to Trace so the span exists)
    router = router.layer(from_fn(record_request_id));
    router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request| {
                let rid = req
                    .headers()
                    .get(request_id_header())
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("n/a");
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri().path(),
                    request_id = %rid,
                    status = Empty,
                    latency_ms = Empty,
                )
            })
            .on_response(|res: &Response, latency: Duration, span: &tracing::Span| {
                span.record("status", res.status().as_u16());
                span.record("latency_ms", latency.as_millis());
            }),
    );

    // 1) Request ID: generate when missing, echo on the response
    router = router.layer(PropagateRequestIdLayer::new(request_id_header()));
    router.layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid))
}

async fn record_request_id(req: Request, next: Next) -> Response {
    if let Some(rid) = req
        .headers()
        .get(request_id_header())
        .and_then(|v| v.to_str().ok())
    {
        tracing::Span::current().record("request_id", rid);
    }
    next.run(req).await
}

/// Parse bind address from configuration string.
///
/// # Errors
/// Returns an error when the address is not `host:port`.
pub fn parse_bind_address(bind_addr: &str) -> anyhow::Result<SocketAddr> {
    bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{bind_addr}': {e}"))
}

/// Serve until `cancel` fires, then drain in-flight requests.
///
/// # Errors
/// Returns the server's I/O error.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("HTTP server shutting down gracefully (cancellation)");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
