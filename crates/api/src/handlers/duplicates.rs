//! Handler for the inventory duplicate scan.

use std::sync::Arc;

use axum::extract::State;
use inventra_core::duplicate_scan::DuplicateReport;

use crate::error::AppResult;
use crate::response::{self, Envelope};
use crate::state::AppState;

/// GET /api/v1/duplicates
///
/// Serves the cached scan when there is one. Finished commits drop the
/// cache, so the next request rescans the store.
pub async fn get_duplicates(State(state): State<AppState>) -> AppResult<Envelope<DuplicateReport>> {
    let engine = Arc::clone(&state.engine);
    let report = state
        .duplicates
        .get_or_load(|| async move { engine.scan_duplicates().await })
        .await?;
    Ok(response::ok(report))
}
