use axum::routing::get;
use axum::Router;

use crate::handlers::duplicates;
use crate::state::AppState;

/// Routes mounted at `/duplicates`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(duplicates::get_duplicates))
}
