//! Routes and handlers.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::routing::{any, get};
use axum::{middleware, Router};
use chrono::{DateTime, SecondsFormat};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::error::ApiError;
use super::middleware::rate_limit_middleware;
use super::state::AppState;
use crate::ratelimit::LoadReport;

/// Header carrying the admin shared secret.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Build the service router.
///
/// Only `/api/check` is rate limited. Health and admin routes bypass the
/// limiter so operators can inspect a saturated service.
pub fn router(state: AppState) -> Router {
    let limited = Router::new()
        .route("/api/check", any(check))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/admin/rate-limit", get(rate_limit_stats))
        .merge(limited)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Forward-auth check. The middleware has already admitted the request.
async fn check() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub tracked_clients: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_secs(),
        tracked_clients: state.limiter().tracked_clients(),
    })
}

#[derive(Debug, Serialize)]
pub struct RateLimitStatsResponse {
    pub success: bool,
    pub data: LoadReport,
    pub timestamp: String,
}

/// Current limiter load, for operators holding the admin key.
async fn rate_limit_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RateLimitStatsResponse>, ApiError> {
    let provided = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match (state.admin_key(), provided) {
        (Some(expected), Some(provided)) if expected == provided => {}
        (None, _) => {
            warn!("Admin snapshot requested but no admin key is configured");
            return Err(ApiError::Unauthorized);
        }
        _ => {
            warn!("Admin snapshot requested with a missing or wrong key");
            return Err(ApiError::Unauthorized);
        }
    }

    let now_ms = state.now_ms();
    let timestamp = DateTime::from_timestamp_millis(now_ms as i64)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default();

    Ok(Json(RateLimitStatsResponse {
        success: true,
        data: state.limiter().snapshot(now_ms),
        timestamp,
    }))
}

async fn not_found() -> impl IntoResponse {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::{ManualClock, NoInlineSweep, RateLimitPolicy, RateLimiter};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    const KEY: &str = "s3cret";

    fn test_router(admin_key: Option<&str>, clock: Arc<ManualClock>) -> (Router, Arc<RateLimiter>) {
        let limiter = Arc::new(RateLimiter::with_eviction(
            RateLimitPolicy::new(60_000, 2),
            Box::new(NoInlineSweep),
        ));
        let state = AppState::new(limiter.clone(), clock, admin_key.map(str::to_string));
        (router(state), limiter)
    }

    fn get_request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_check_admits_then_rejects() {
        let (app, _) = test_router(None, Arc::new(ManualClock::new(1_000)));
        let from = [("x-forwarded-for", "1.2.3.4")];

        for _ in 0..2 {
            let response = app.clone().oneshot(get_request("/api/check", &from)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }

        let response = app.oneshot(get_request("/api/check", &from)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_check_accepts_any_method() {
        let (app, _) = test_router(None, Arc::new(ManualClock::new(0)));

        let request = Request::builder()
            .method("POST")
            .uri("/api/check")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_admin_requires_key() {
        let (app, _) = test_router(Some(KEY), Arc::new(ManualClock::new(0)));

        let response = app.clone().oneshot(get_request("/api/admin/rate-limit", &[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Unauthorized");

        let wrong = [(ADMIN_KEY_HEADER, "nope")];
        let response = app.oneshot(get_request("/api/admin/rate-limit", &wrong)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_disabled_without_configured_key() {
        let (app, _) = test_router(None, Arc::new(ManualClock::new(0)));

        let response = app.clone().oneshot(get_request("/api/admin/rate-limit", &[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let empty = [(ADMIN_KEY_HEADER, "")];
        let response = app.oneshot(get_request("/api/admin/rate-limit", &empty)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_snapshot() {
        let clock = Arc::new(ManualClock::new(1_000));
        let (app, limiter) = test_router(Some(KEY), clock.clone());

        limiter.admit("1.2.3.4", 1_000);
        limiter.admit("1.2.3.4", 1_000);
        limiter.admit("5.6.7.8", 1_000);
        limiter.admit("stale", 0);
        clock.set(60_500);

        let auth = [(ADMIN_KEY_HEADER, KEY)];
        let response = app.oneshot(get_request("/api/admin/rate-limit", &auth)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["timestamp"], "1970-01-01T00:01:00.500Z");
        assert_eq!(json["data"]["totalActiveIPs"], 2);
        assert_eq!(json["data"]["activeIPs"][0]["ip"], "1.2.3.4");
        assert_eq!(json["data"]["activeIPs"][0]["count"], 2);
        assert_eq!(json["data"]["activeIPs"][0]["remaining"], 0);
        assert_eq!(json["data"]["activeIPs"][1]["ip"], "5.6.7.8");
        assert_eq!(json["data"]["config"]["maxRequests"], 2);

        // The snapshot does not sweep.
        assert_eq!(limiter.tracked_clients(), 3);
    }

    #[tokio::test]
    async fn test_admin_and_health_are_not_limited() {
        let (app, limiter) = test_router(Some(KEY), Arc::new(ManualClock::new(0)));
        let auth = [(ADMIN_KEY_HEADER, KEY)];

        for _ in 0..5 {
            let response = app.clone().oneshot(get_request("/health", &[])).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let response = app.clone().oneshot(get_request("/api/admin/rate-limit", &auth)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, limiter) = test_router(None, Arc::new(ManualClock::new(0)));
        limiter.admit("a", 0);

        let response = app.oneshot(get_request("/health", &[])).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["trackedClients"], 1);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (app, _) = test_router(None, Arc::new(ManualClock::new(0)));

        let response = app.oneshot(get_request("/api/templates", &[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not found");
    }
}
