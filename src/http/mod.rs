//! HTTP surface: admission middleware, check and admin endpoints.

mod error;
mod middleware;
mod routes;
mod server;
mod state;

pub use error::ApiError;
pub use middleware::{
    rate_limit_middleware, RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING, RATE_LIMIT_RESET,
};
pub use routes::{router, HealthResponse, RateLimitStatsResponse, ADMIN_KEY_HEADER};
pub use server::HttpServer;
pub use state::AppState;
