//! Turnstile - per-client rate limiting for the proposal editor API
//!
//! This crate implements an in-memory, fixed-window rate limiter keyed by
//! client address, and an HTTP service that applies it: a forward-auth
//! check endpoint, a reusable axum middleware, and an admin load snapshot.
//! State is per process and is lost on restart.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
