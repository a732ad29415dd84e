//! Handlers for bulk inventory imports.
//!
//! An import runs in two steps. Analyze parses the rows, resolves their
//! references and plans every row without writing anything; the result is
//! kept as a session in `preview` status. Commit replays that plan against
//! the store. Sessions can be cancelled before or during commit.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use inventra_core::error::CoreError;
use inventra_core::planner::{PreviewCounts, RowDecision};
use inventra_core::row::ParsedRow;
use inventra_import::extract::{CsvExtractor, DocumentExtractor};
use inventra_import::{BatchSummary, ImportOptions};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::{self, Created, Envelope};
use crate::sessions::{SessionStatus, SessionView};
use crate::state::AppState;

/// Response for both analyze endpoints.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub counts: PreviewCounts,
    pub ignored_columns: Vec<String>,
    pub decisions: Vec<RowDecision>,
}

/// Response for the commit endpoint.
#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub summary: Option<BatchSummary>,
    pub error: Option<String>,
}

// ── Analyze ──────────────────────────────────────────────────────────

/// Request body for `POST /imports/analyze`.
#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeRequest {
    /// One JSON object per row, keyed by column header.
    #[validate(length(min = 1, message = "At least one row is required"))]
    pub rows: Vec<serde_json::Value>,
    #[serde(default)]
    pub auto_create_entities: bool,
}

/// POST /api/v1/imports/analyze
///
/// Analyze rows submitted as JSON and open a preview session.
pub async fn analyze(
    State(state): State<AppState>,
    Json(input): Json<AnalyzeRequest>,
) -> AppResult<Created<AnalyzeResponse>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let rows = state.engine.ingest_json(&input.rows)?;
    let options = ImportOptions {
        auto_create_entities: input.auto_create_entities,
    };
    open_session(&state, rows, options).await
}

/// Query parameters for the upload endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub auto_create_entities: bool,
}

/// POST /api/v1/imports/analyze/upload
///
/// Analyze the first file of a multipart upload. The file goes through
/// CSV extraction; an extraction error is returned as-is.
pub async fn analyze_upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> AppResult<Created<AnalyzeResponse>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .ok_or_else(|| AppError::BadRequest("No file received in multipart upload".to_string()))?;

    let content_type = field.content_type().map(str::to_string);
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let extraction = CsvExtractor.extract(&data, content_type.as_deref());
    let rows = state.engine.ingest(extraction)?;
    let options = ImportOptions {
        auto_create_entities: params.auto_create_entities,
    };
    open_session(&state, rows, options).await
}

async fn open_session(
    state: &AppState,
    rows: Vec<ParsedRow>,
    options: ImportOptions,
) -> AppResult<Created<AnalyzeResponse>> {
    let report = state.engine.analyze(rows, options).await?;
    let decisions = report.decisions().to_vec();
    let view = state.sessions.create(report).await?;

    tracing::info!(
        session_id = %view.id,
        rows = decisions.len(),
        "Import session opened",
    );

    Ok(response::created(AnalyzeResponse {
        session_id: view.id,
        status: view.status,
        counts: view.counts,
        ignored_columns: view.ignored_columns,
        decisions,
    }))
}

// ── Sessions ─────────────────────────────────────────────────────────

/// GET /api/v1/imports/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Envelope<SessionView>> {
    let view = state.sessions.get(id).await?;
    Ok(response::ok(view))
}

/// GET /api/v1/imports/{id}/decisions
pub async fn get_decisions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Envelope<Vec<RowDecision>>> {
    let report = state.sessions.report(id).await?;
    Ok(response::ok(report.decisions().to_vec()))
}

// ── Commit / Cancel ──────────────────────────────────────────────────

/// POST /api/v1/imports/{id}/commit
///
/// Commit a previewed session. The commit runs on its own task so the
/// session always reaches a final status, even if the request is dropped.
pub async fn commit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Envelope<CommitResponse>> {
    let ticket = state.sessions.begin_commit(id).await?;

    let engine = Arc::clone(&state.engine);
    let sessions = Arc::clone(&state.sessions);
    let duplicates = Arc::clone(&state.duplicates);
    let handle = tokio::spawn(async move {
        let outcome = engine
            .commit(&ticket.report, ticket.options, &ticket.cancel)
            .await;
        duplicates.invalidate().await;
        if let Err(e) = &outcome {
            tracing::error!(session_id = %id, error = %e, "Import commit failed");
        }
        sessions
            .finish_commit(id, outcome.map_err(|e| e.to_string()))
            .await
    });

    let view = match handle.await {
        Ok(finished) => finished?,
        // The task died before recording an outcome.
        Err(e) => {
            tracing::error!(session_id = %id, error = %e, "Import commit task aborted");
            state.duplicates.invalidate().await;
            state
                .sessions
                .finish_commit(id, Err(format!("Commit task failed: {e}")))
                .await?
        }
    };

    Ok(response::ok(CommitResponse {
        session_id: view.id,
        status: view.status,
        summary: view.summary,
        error: view.error,
    }))
}

/// POST /api/v1/imports/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Envelope<SessionView>> {
    let view = state.sessions.cancel(id).await?;
    Ok(response::ok(view))
}
