//! Route definitions for bulk inventory imports.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::config::HttpConfig;
use crate::handlers::imports;
use crate::router::request_timeout;
use crate::state::AppState;

/// Routes mounted at `/imports`.
///
/// ```text
/// POST   /analyze              analyze
/// POST   /analyze/upload       analyze_upload      body limit: max_upload_bytes
/// GET    /{id}                 get_session
/// GET    /{id}/decisions       get_decisions
/// POST   /{id}/cancel          cancel
/// POST   /{id}/commit          commit              no request timeout
/// ```
pub fn router(http: &HttpConfig) -> Router<AppState> {
    let bounded = Router::new()
        .route("/analyze", post(imports::analyze))
        .route(
            "/analyze/upload",
            post(imports::analyze_upload).layer(DefaultBodyLimit::max(http.max_upload_bytes)),
        )
        .route("/{id}", get(imports::get_session))
        .route("/{id}/decisions", get(imports::get_decisions))
        .route("/{id}/cancel", post(imports::cancel))
        .layer(request_timeout(http));

    // A commit answers once its batch is done, however long that takes.
    let commit = Router::new().route("/{id}/commit", post(imports::commit));

    bounded.merge(commit)
}
