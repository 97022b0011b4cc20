use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::collections::HashMap;

use crate::server::MediBookServer;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime: u64,
    pub checks: HashMap<String, String>,
}

/// Health check handler; 503 when the store does not answer
pub async fn health_check(State(server): State<MediBookServer>) -> impl IntoResponse {
    let store_healthy = server.store.is_healthy().await;

    let mut checks = HashMap::new();
    checks.insert(
        server.store.backend_name().to_string(),
        if store_healthy { "healthy" } else { "unhealthy" }.to_string(),
    );

    let response = HealthResponse {
        success: store_healthy,
        status: if store_healthy { "OK" } else { "DEGRADED" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: server.uptime_secs(),
        checks,
    };

    let status = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
