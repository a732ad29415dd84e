pub mod duplicates;
pub mod health;
pub mod imports;

use axum::Router;

use crate::config::HttpConfig;
use crate::router::request_timeout;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /imports/analyze                  analyze JSON rows (POST)
/// /imports/analyze/upload           analyze an uploaded CSV (POST, multipart)
/// /imports/{id}                     session status, counts, summary (GET)
/// /imports/{id}/decisions           per-row decisions of the analysis (GET)
/// /imports/{id}/commit              commit a previewed session (POST)
/// /imports/{id}/cancel              cancel a preview or running commit (POST)
///
/// /duplicates                       duplicate scan report (GET)
/// ```
pub fn api_routes(http: &HttpConfig) -> Router<AppState> {
    Router::new()
        .nest("/imports", imports::router(http))
        .nest("/duplicates", duplicates::router().layer(request_timeout(http)))
}
