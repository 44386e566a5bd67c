//! Static readiness endpoint.

use axum::{Json, Router, http::StatusCode, routing::any};
use serde::{Deserialize, Serialize};

pub const HEALTH_PATH: &str = "/health";

/// Body returned by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    #[must_use]
    pub fn ready() -> Self {
        Self {
            status: "ready".to_owned(),
        }
    }
}

/// Router answering every request to [`HEALTH_PATH`] with `200` and
/// `{"status":"ready"}`, regardless of method or process state.
pub fn health_router() -> Router {
    Router::new().route(HEALTH_PATH, any(health_check))
}

async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse::ready()))
}
