use std::collections::HashSet;
use std::sync::Arc;

use automation::api::rest::error::ApiError;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use conductor_security::SecurityContext;

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub authn: Arc<static_authn_plugin::Service>,
    /// Paths served without credentials.
    pub public_paths: Arc<HashSet<&'static str>>,
}

impl AuthState {
    #[must_use]
    pub fn new(authn: static_authn_plugin::Service, public_paths: &[&'static str]) -> Self {
        Self {
            authn: Arc::new(authn),
            public_paths: Arc::new(public_paths.iter().copied().collect()),
        }
    }
}

/// Resolve the bearer token to a `SecurityContext` and attach it to the
/// request.
///
/// Public paths and CORS preflights get an anonymous context. Anything else
/// without a recognized token is answered with 401.
pub async fn authn_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if is_preflight_request(req.method(), req.headers())
        || state.public_paths.contains(req.uri().path())
    {
        req.extensions_mut().insert(SecurityContext::anonymous());
        return next.run(req).await;
    }

    let Some(token) = extract_bearer_token(req.headers()) else {
        return unauthorized("Missing or invalid Authorization header");
    };

    match state.authn.authenticate(token) {
        Some(ctx) => {
            tracing::debug!(subject_id = %ctx.subject_id(), "request authenticated");
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        None => {
            tracing::debug!("AuthN rejected bearer token");
            unauthorized("Authentication failed")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    ApiError::new(StatusCode::UNAUTHORIZED, vec![message.to_owned()]).into_response()
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::trim))
}

/// OPTIONS with both `Origin` and `Access-Control-Request-Method`.
fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}
