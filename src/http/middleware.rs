//! Admission middleware for axum routers.

use axum::extract::{Request, State};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::{debug, instrument};

use super::state::AppState;
use crate::ratelimit::{client_identifier, Decision, FORWARDED_FOR_HEADER, REAL_IP_HEADER};

pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Run one admission check per request before the inner handler.
///
/// Rejected requests get the policy status, a `Retry-After` header and a
/// JSON body; the inner handler does not run. Admitted responses get
/// `X-RateLimit-*` headers added.
#[instrument(skip_all, fields(method = %req.method(), path = %req.uri().path()))]
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_identifier(
        header_str(req.headers(), FORWARDED_FOR_HEADER),
        header_str(req.headers(), REAL_IP_HEADER),
    );

    let decision = state.limiter().admit(&client, state.now_ms());

    if !decision.is_admitted() {
        debug!(client = %client, "Rejecting request");
        return rejection_response(&decision);
    }

    let mut response = next.run(req).await;
    insert_limit_headers(response.headers_mut(), &decision);
    response
}

fn insert_limit_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_LIMIT),
        HeaderValue::from(decision.limit()),
    );
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_REMAINING),
        HeaderValue::from(decision.remaining()),
    );
    headers.insert(
        HeaderName::from_static(RATE_LIMIT_RESET),
        HeaderValue::from(decision.reset_time_ms()),
    );
}

fn rejection_response(decision: &Decision) -> Response {
    let Decision::Reject {
        retry_after_secs,
        status_code,
        message,
        ..
    } = decision
    else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let status = StatusCode::from_u16(*status_code).unwrap_or(StatusCode::TOO_MANY_REQUESTS);
    let body = Json(json!({
        "error": message,
        "retryAfter": retry_after_secs,
    }));

    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
    insert_limit_headers(headers, decision);
    response
}
