//! MediBook Server - clinic appointment booking API
//!
//! This library provides the HTTP surface of MediBook: token authentication
//! for patients, doctors and administrators, appointment booking and status
//! endpoints, and the administration API. Persistence and the booking rules
//! live in `database-layer` and `workflow-engine`.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::*;
pub use server::MediBookServer;

use axum::{middleware::from_fn, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Answer unknown paths with the usual error body
async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Create the main application router with all routes and middleware
pub fn create_app(server: MediBookServer) -> Router {
    let http = &server.config.server;
    let timeout = Duration::from_secs(http.request_timeout_secs);
    let cors = middleware::create_cors_layer(&http.cors_origins);

    routes::create_routes()
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::new(timeout))
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(server)
}
