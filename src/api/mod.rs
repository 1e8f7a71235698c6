//! HTTP JSON API.
//!
//! Thin axum layer over the lifecycle engine: handlers check credentials
//! through the [`Gatekeeper`](crate::auth::Gatekeeper), decode request bodies,
//! and map [`ApiError`](crate::error::ApiError) codes to HTTP statuses.

mod server;

pub use server::{ApiServer, build_router, start_server};
