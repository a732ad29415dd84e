//! Readiness check, mounted at the root rather than under `/api/v1`.
//!
//! The service is only useful while its store answers, so a failed store
//! ping turns the check into a 503 that load balancers act on.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: &'static str,
    pub version: &'static str,
    pub store_healthy: bool,
    /// Import sessions currently held in memory.
    pub sessions: usize,
    /// Of those, how many are committing.
    pub running_commits: usize,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store_healthy = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check: store ping failed");
            false
        }
    };

    let (status, code) = if store_healthy {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        store_healthy,
        sessions: state.sessions.session_count().await,
        running_commits: state.sessions.running_count().await,
    };
    (code, Json(body))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
