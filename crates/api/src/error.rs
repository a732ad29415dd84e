use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inventra_core::error::CoreError;
use inventra_import::{ImportError, StoreError};
use serde_json::json;
use uuid::Uuid;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain errors of the core and import crates and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `inventra_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A run-level import failure (unreadable document, batch limits, snapshot load).
    #[error(transparent)]
    Import(#[from] ImportError),

    /// A store failure outside the engine.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Import session {0} not found")]
    SessionNotFound(Uuid),

    /// Every session slot is held by a running commit.
    #[error("Too many import sessions in progress (limit {0}); retry later")]
    SessionLimit(usize),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => internal(msg),
            },

            // --- Import errors ---
            AppError::Import(import) => match import {
                ImportError::Ingestion(details) => {
                    (StatusCode::BAD_REQUEST, "INGESTION_ERROR", details.clone())
                }
                ImportError::EmptyBatch => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    import.to_string(),
                ),
                ImportError::TooManyRows { .. } => (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "TOO_MANY_ROWS",
                    import.to_string(),
                ),
                ImportError::Snapshot(err) => {
                    tracing::error!(error = %err, "Inventory snapshot failed");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORE_UNAVAILABLE",
                        "The inventory store is unavailable".to_string(),
                    )
                }
            },

            // --- Store errors ---
            AppError::Store(store) => match store {
                StoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                StoreError::Rejected(msg) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "REJECTED", msg.clone())
                }
                StoreError::Database(msg) => internal(msg),
            },

            // --- HTTP-specific errors ---
            AppError::SessionNotFound(_) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string())
            }
            AppError::SessionLimit(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "TOO_MANY_SESSIONS",
                self.to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
