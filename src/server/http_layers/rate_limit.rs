//! Per-client admission control in front of the API routes.
//!
//! Clients are keyed by peer IP. Denied requests get a 429 with a
//! `Retry-After` header; admitted ones carry the remaining allowance.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::warn;

use crate::server::metrics::{endpoint_label, record_rate_limit_hit};
use crate::server::state::ServerState;

pub const RATE_LIMIT_EXEMPT_PATHS: &[&str] = &["/", "/health", "/docs", "/openapi.json", "/metrics"];

const UNKNOWN_CLIENT: &str = "unknown";

const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

fn client_id(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn too_many_requests(retry_after: u64) -> Response {
    let body = json!({
        "error": "RATE_LIMIT_EXCEEDED",
        "message": format!("Too many requests. Retry after {} seconds.", retry_after),
        "retry_after": retry_after,
    });
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

pub async fn rate_limit(
    State(state): State<ServerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if RATE_LIMIT_EXEMPT_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let client = client_id(&request);
    let limiter = state.rate_limiter.clone();

    if let Err(retry_after) = limiter.is_allowed(&client) {
        warn!(
            "Rate limit exceeded: {} {} ip={}",
            request.method(),
            path,
            client
        );
        record_rate_limit_hit(endpoint_label(&path));
        return too_many_requests(retry_after);
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        X_RATELIMIT_LIMIT,
        HeaderValue::from(limiter.config().rate_per_minute),
    );
    headers.insert(
        X_RATELIMIT_REMAINING,
        HeaderValue::from(limiter.remaining(&client)),
    );
    response
}
